use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Variable selecting which `configuration/{name}.yaml` overlay is loaded.
pub const ENVIRONMENT_VAR: &str = "APP_ENVIRONMENT";

#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("unsupported environment `{0}`, expected one of: prod, staging, dev")]
    Unsupported(String),

    #[error("{ENVIRONMENT_VAR} is not valid unicode")]
    NotUnicode,
}

/// Deployment stage of the emulator.
///
/// Picks the configuration overlay and decides whether logs go to rolling
/// JSON files or to a colored console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Prod,
    Staging,
    Dev,
}

impl Environment {
    pub const ALL: [Environment; 3] = [Environment::Prod, Environment::Staging, Environment::Dev];

    /// Reads [`ENVIRONMENT_VAR`], falling back to [`Environment::Prod`] when unset.
    pub fn load() -> Result<Environment, EnvironmentError> {
        match std::env::var(ENVIRONMENT_VAR) {
            Ok(value) => value.parse(),
            Err(std::env::VarError::NotPresent) => Ok(Environment::default()),
            Err(std::env::VarError::NotUnicode(_)) => Err(EnvironmentError::NotUnicode),
        }
    }

    /// Exports this environment through [`ENVIRONMENT_VAR`].
    ///
    /// Mutates the process environment, so it must run before other threads
    /// are started.
    pub fn set(&self) {
        unsafe { std::env::set_var(ENVIRONMENT_VAR, self.as_str()) }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Prod => "prod",
            Environment::Staging => "staging",
            Environment::Dev => "dev",
        }
    }

    /// Staging is deployed like production and logs the same way.
    pub fn is_prod(&self) -> bool {
        !matches!(self, Environment::Dev)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = EnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Environment::ALL
            .into_iter()
            .find(|environment| environment.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| EnvironmentError::Unsupported(s.to_owned()))
    }
}
