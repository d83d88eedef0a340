use refunc_config::shared::RefuncConfig;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::executor::{
    ExecutorError, ExecutorRegistry, InvocationRequest, InvocationResult, LambdaFunction,
};
use crate::funcdef::FuncdefClient;
use crate::k8s::{FuncdefApi, K8sError, http::HttpFuncdefApi};
use crate::services::{AwsEnvironment, ServiceUrlResolver, build_service_url_resolver};

/// Account id the emulator reports in function ARNs.
pub const DEFAULT_ACCOUNT_ID: &str = "000000000000";

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error(transparent)]
    K8s(#[from] K8sError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

/// Options of [`Application::invoke`].
#[derive(Debug, Clone, Default)]
pub struct InvokeOptions {
    /// Environment variables handed to the function.
    pub envvars: HashMap<String, String>,
    pub asynchronous: bool,
    /// Executor name, the configured default when `None`.
    pub executor: Option<String>,
}

/// Everything the emulator needs at runtime, built once at startup.
pub struct Application {
    config: RefuncConfig,
    funcdefs: FuncdefClient,
    executors: ExecutorRegistry,
    resolver: Arc<dyn ServiceUrlResolver>,
    aws_environment: AwsEnvironment,
}

impl Application {
    /// Builds the application, connecting to the cluster with the ambient
    /// Kubernetes configuration.
    pub async fn build(config: RefuncConfig) -> Result<Self, K8sError> {
        let api = HttpFuncdefApi::try_default().await?;

        Ok(Self::build_with_api(config, Arc::new(api)))
    }

    /// Builds the application on top of an existing [`FuncdefApi`].
    pub fn build_with_api(config: RefuncConfig, api: Arc<dyn FuncdefApi>) -> Self {
        let executors = ExecutorRegistry::new(&config.lambda);
        let resolver = build_service_url_resolver(&config);
        let aws_environment = AwsEnvironment::from_config(&config);

        info!(
            executor = %config.lambda.executor,
            environment = %aws_environment.name,
            region = %aws_environment.region,
            s3_url = resolver.service_url("s3").as_deref(),
            "application built"
        );

        Self {
            config,
            funcdefs: FuncdefClient::new(api),
            executors,
            resolver,
            aws_environment,
        }
    }

    pub fn config(&self) -> &RefuncConfig {
        &self.config
    }

    pub fn funcdefs(&self) -> &FuncdefClient {
        &self.funcdefs
    }

    pub fn executors(&self) -> &ExecutorRegistry {
        &self.executors
    }

    pub fn aws_environment(&self) -> &AwsEnvironment {
        &self.aws_environment
    }

    pub fn service_url(&self, service_name: &str) -> Option<String> {
        self.resolver.service_url(service_name)
    }

    /// ARN under which the emulator exposes function `name`.
    pub fn function_arn(&self, name: &str) -> String {
        format!(
            "arn:aws:lambda:{}:{DEFAULT_ACCOUNT_ID}:function:{name}",
            self.aws_environment.region
        )
    }

    /// Resolves `namespace/name` in the cluster and runs it with `event`.
    pub async fn invoke(
        &self,
        namespace: &str,
        name: &str,
        event: &Value,
        options: InvokeOptions,
    ) -> Result<InvocationResult, InvokeError> {
        let funcdef = self.funcdefs.get(namespace, name).await?;

        let mut function = LambdaFunction::new(self.function_arn(name)).with_latest(funcdef);
        function.envvars = options.envvars;

        let executor = self.executors.select(options.executor.as_deref());
        let request = InvocationRequest::new(&function, event).asynchronous(options.asynchronous);

        Ok(executor.execute(request).await?)
    }
}
