use refunc_config::shared::RefuncConfig;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Host the emulated services listen on.
pub const DEFAULT_SERVICE_HOST: &str = "localhost";

/// Per-service ports of the emulator.
const SERVICE_PORTS: &[(&str, u16)] = &[
    ("apigateway", 4567),
    ("kinesis", 4568),
    ("dynamodb", 4569),
    ("dynamodbstreams", 4570),
    ("elasticsearch", 4571),
    ("s3", 4572),
    ("firehose", 4573),
    ("lambda", 4574),
    ("sns", 4575),
    ("sqs", 4576),
    ("redshift", 4577),
    ("es", 4578),
    ("ses", 4579),
    ("route53", 4580),
    ("cloudformation", 4581),
    ("cloudwatch", 4582),
    ("ssm", 4583),
    ("secretsmanager", 4584),
    ("stepfunctions", 4585),
    ("logs", 4586),
    ("sts", 4592),
    ("iam", 4593),
];

/// Maps an AWS service name to the URL requests for it are sent to.
pub trait ServiceUrlResolver: Send + Sync {
    /// Returns `None` for services the emulator doesn't know about.
    fn service_url(&self, service_name: &str) -> Option<String>;
}

/// `s3api` is the name boto uses for the S3 control plane.
fn canonical_service_name(service_name: &str) -> &str {
    match service_name {
        "s3api" => "s3",
        other => other,
    }
}

/// Resolves every service to the emulator's own port on one host.
#[derive(Debug, Clone)]
pub struct LocalServiceUrlResolver {
    host: String,
    ports: BTreeMap<String, u16>,
}

impl LocalServiceUrlResolver {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ports: SERVICE_PORTS
                .iter()
                .map(|(service, port)| ((*service).to_owned(), *port))
                .collect(),
        }
    }

    /// Overrides the port of `service_name`.
    pub fn with_port(mut self, service_name: &str, port: u16) -> Self {
        self.ports.insert(service_name.to_owned(), port);
        self
    }
}

impl Default for LocalServiceUrlResolver {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_HOST)
    }
}

impl ServiceUrlResolver for LocalServiceUrlResolver {
    fn service_url(&self, service_name: &str) -> Option<String> {
        let port = self.ports.get(canonical_service_name(service_name))?;

        Some(format!("http://{}:{port}", self.host))
    }
}

/// Sends S3 to an external endpoint and every other service to `inner`.
#[derive(Debug, Clone)]
pub struct S3EndpointResolver<R> {
    endpoint: String,
    inner: R,
}

impl<R> S3EndpointResolver<R> {
    pub fn new(endpoint: impl Into<String>, inner: R) -> Self {
        Self {
            endpoint: endpoint.into(),
            inner,
        }
    }
}

impl<R> ServiceUrlResolver for S3EndpointResolver<R>
where
    R: ServiceUrlResolver,
{
    fn service_url(&self, service_name: &str) -> Option<String> {
        match canonical_service_name(service_name) {
            "s3" => Some(self.endpoint.clone()),
            other => self.inner.service_url(other),
        }
    }
}

/// Builds the resolver selected by `config`.
///
/// The local resolver uses the configured lambda port and is wrapped in an
/// [`S3EndpointResolver`] when an S3 override is configured.
pub fn build_service_url_resolver(config: &RefuncConfig) -> Arc<dyn ServiceUrlResolver> {
    let local = LocalServiceUrlResolver::default().with_port("lambda", config.lambda.port);

    match &config.s3 {
        Some(s3) => Arc::new(S3EndpointResolver::new(s3.endpoint.clone(), local)),
        None => Arc::new(local),
    }
}
