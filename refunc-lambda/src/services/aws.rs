use refunc_config::shared::{DEFAULT_REGION, RefuncConfig, S3Config};
use secrecy::SecretString;

/// Name of the environment requests are signed for when S3 is proxied.
pub const REFUNC_ENVIRONMENT_NAME: &str = "refunc";

/// Name of the emulator's own environment.
pub const LOCAL_ENVIRONMENT_NAME: &str = "local";

#[derive(Debug, Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
}

/// Region and credentials used to sign requests to AWS-style services.
#[derive(Debug, Clone)]
pub struct AwsEnvironment {
    pub name: String,
    pub region: String,
    /// `None` means the emulator's default credentials.
    pub credentials: Option<AwsCredentials>,
}

impl AwsEnvironment {
    /// The emulator's own environment.
    pub fn local() -> Self {
        Self {
            name: LOCAL_ENVIRONMENT_NAME.to_owned(),
            region: DEFAULT_REGION.to_owned(),
            credentials: None,
        }
    }

    /// The environment used to talk to an external S3 endpoint.
    pub fn from_s3_config(config: &S3Config) -> Self {
        Self {
            name: REFUNC_ENVIRONMENT_NAME.to_owned(),
            region: config.region().to_owned(),
            credentials: Some(AwsCredentials {
                access_key_id: config.access_key_id.clone(),
                secret_access_key: config.secret_access_key.clone().into(),
            }),
        }
    }

    pub fn from_config(config: &RefuncConfig) -> Self {
        config
            .s3
            .as_ref()
            .map(Self::from_s3_config)
            .unwrap_or_else(Self::local)
    }
}
