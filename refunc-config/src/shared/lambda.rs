use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::shared::ValidationError;

/// Port the emulated lambda API is served on.
pub const DEFAULT_LAMBDA_PORT: u16 = 4574;

/// Program used to dispatch an invocation to the cluster.
pub const DEFAULT_INVOKE_BINARY: &str = "invoke";

/// Invocation backends known to the emulator.
///
/// The set is closed: adding a backend means adding a variant here and
/// registering it in the executor registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    /// Runs the function on the cluster by shelling out to the `invoke` tool.
    #[default]
    Refunc,
}

impl ExecutorKind {
    /// Every executor kind, in registration order.
    pub const ALL: &'static [ExecutorKind] = &[ExecutorKind::Refunc];

    /// Name used in configuration and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutorKind::Refunc => "refunc",
        }
    }
}

impl fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExecutorKind::ALL
            .iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("unknown executor `{s}`"))
    }
}

fn default_port() -> u16 {
    DEFAULT_LAMBDA_PORT
}

fn default_invoke_binary() -> String {
    DEFAULT_INVOKE_BINARY.to_owned()
}

/// Settings of the lambda side of the emulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LambdaConfig {
    /// Port the lambda API listens on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Executor used when a caller doesn't ask for a specific one.
    #[serde(default)]
    pub executor: ExecutorKind,
    /// Program spawned for each invocation. Resolved through `PATH` when not absolute.
    #[serde(default = "default_invoke_binary")]
    pub invoke_binary: String,
}

impl LambdaConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::LambdaPortZero);
        }

        if self.invoke_binary.trim().is_empty() {
            return Err(ValidationError::EmptyInvokeBinary);
        }

        Ok(())
    }
}

impl Default for LambdaConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_LAMBDA_PORT,
            executor: ExecutorKind::default(),
            invoke_binary: default_invoke_binary(),
        }
    }
}
