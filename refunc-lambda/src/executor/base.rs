use async_trait::async_trait;
use refunc_config::shared::ExecutorKind;
use serde_json::Value;
use thiserror::Error;

use crate::executor::LambdaFunction;
use crate::k8s::K8sError;

/// Result body returned for asynchronous invocations.
pub const ASYNC_RESULT: &str = r#"{"asynchronous": true}"#;

/// Log output returned for asynchronous invocations.
pub const ASYNC_LOG_OUTPUT: &str = "Lambda executed asynchronously";

/// Errors raised while invoking a function.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The invoked process exited with a non-zero status.
    #[error(
        "Lambda process returned error status code: {}. Output:\n{stderr}",
        display_exit_code(.exit_code)
    )]
    Execution {
        /// `None` when the process was terminated by a signal.
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("an io error occurred while talking to the lambda process: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize the invocation event: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("function {arn} has no version {version}")]
    VersionNotFound { arn: String, version: String },

    #[error("invalid function definition: {0}")]
    InvalidDefinition(#[from] K8sError),
}

fn display_exit_code(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => code.to_string(),
        None => "terminated by signal".to_owned(),
    }
}

/// A single invocation of a function.
#[derive(Debug, Clone, Copy)]
pub struct InvocationRequest<'a> {
    pub func_arn: &'a str,
    pub function: &'a LambdaFunction,
    /// Event handed to the function.
    pub event: &'a Value,
    pub context: Option<&'a Value>,
    /// Version to run, the latest one when `None`.
    pub version: Option<&'a str>,
    /// Return right after spawning instead of waiting for the result.
    pub asynchronous: bool,
}

impl<'a> InvocationRequest<'a> {
    /// Synchronous invocation of the latest version without context.
    pub fn new(function: &'a LambdaFunction, event: &'a Value) -> Self {
        Self {
            func_arn: &function.arn,
            function,
            event,
            context: None,
            version: None,
            asynchronous: false,
        }
    }

    pub fn with_version(mut self, version: &'a str) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_context(mut self, context: &'a Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn asynchronous(mut self, asynchronous: bool) -> Self {
        self.asynchronous = asynchronous;
        self
    }
}

/// Outcome of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    /// Standard output of the function, or [`ASYNC_RESULT`].
    pub result: String,
    /// Standard error of the function, or [`ASYNC_LOG_OUTPUT`].
    pub log_output: String,
}

impl InvocationResult {
    /// Acknowledgement returned without waiting for the function.
    pub fn asynchronous() -> Self {
        Self {
            result: ASYNC_RESULT.to_owned(),
            log_output: ASYNC_LOG_OUTPUT.to_owned(),
        }
    }
}

/// Backend able to run lambda functions.
#[async_trait]
pub trait LambdaExecutor: Send + Sync {
    /// Kind under which the executor is registered.
    fn kind(&self) -> ExecutorKind;

    /// Runs a function.
    ///
    /// Synchronous requests resolve once the function exited and fail with
    /// [`ExecutorError::Execution`] on a non-zero status. Asynchronous ones
    /// resolve right after the function started, with
    /// [`InvocationResult::asynchronous`].
    async fn execute(
        &self,
        request: InvocationRequest<'_>,
    ) -> Result<InvocationResult, ExecutorError>;

    /// Called once before the first invocation.
    async fn startup(&self) -> Result<(), ExecutorError> {
        Ok(())
    }

    /// Releases resources held for `arn`, or for every function when `None`.
    async fn cleanup(&self, _arn: Option<&str>) -> Result<(), ExecutorError> {
        Ok(())
    }
}
