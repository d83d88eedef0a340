use serde::{Deserialize, Serialize};

use crate::Config;
use crate::shared::{LambdaConfig, S3Config, SentryConfig, ValidationError};

/// Plain environment variables understood by older deployments, mapped to
/// configuration keys.
const LEGACY_LAMBDA_VARS: &[(&str, &str)] = &[
    ("LAMBDA_EXECUTOR", "lambda.executor"),
    ("PORT_LAMBDA", "lambda.port"),
];

/// Only honoured when `S3_ENDPOINT` is set, as the S3 override is keyed on it.
const LEGACY_S3_VARS: &[(&str, &str)] = &[
    ("S3_ENDPOINT", "s3.endpoint"),
    ("S3_REGION", "s3.region"),
    ("AWS_ACCESS_KEY_ID", "s3.access_key_id"),
    ("AWS_SECRET_ACCESS_KEY", "s3.secret_access_key"),
];

/// Complete configuration of the refunc lambda emulator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefuncConfig {
    #[serde(default)]
    pub lambda: LambdaConfig,
    /// S3 endpoint override. `None` keeps the emulator's own S3 service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Config>,
    /// Optional Sentry configuration for error tracking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentry: Option<SentryConfig>,
}

impl RefuncConfig {
    /// Validates the complete emulator configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.lambda.validate()?;

        if let Some(s3) = &self.s3 {
            s3.validate()?;
        }

        Ok(())
    }
}

impl Config for RefuncConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];

    fn env_overrides() -> Vec<(&'static str, String)> {
        let mut overrides = collect_vars(LEGACY_LAMBDA_VARS);

        if std::env::var_os("S3_ENDPOINT").is_some() {
            overrides.extend(collect_vars(LEGACY_S3_VARS));
        }

        overrides
    }
}

fn collect_vars(vars: &[(&'static str, &'static str)]) -> Vec<(&'static str, String)> {
    vars.iter()
        .filter_map(|(var, key)| std::env::var(var).ok().map(|value| (*key, value)))
        .collect()
}
