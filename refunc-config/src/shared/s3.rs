use serde::{Deserialize, Serialize};

use crate::SerializableSecretString;
use crate::shared::ValidationError;

/// Region used when none, or an empty one, is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// External S3 endpoint that replaces the emulator's own S3 service.
///
/// When present, S3 requests are proxied to `endpoint` and signed with the
/// region and credentials below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// Base URL of the S3-compatible endpoint.
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: SerializableSecretString,
}

impl S3Config {
    /// Returns the configured region, falling back to [`DEFAULT_REGION`] when unset or empty.
    pub fn region(&self) -> &str {
        match self.region.as_deref().map(str::trim) {
            Some(region) if !region.is_empty() => region,
            _ => DEFAULT_REGION,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.endpoint.trim().is_empty() {
            return Err(ValidationError::EmptyS3Endpoint);
        }

        Ok(())
    }
}
