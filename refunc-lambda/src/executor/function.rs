use std::collections::{BTreeMap, HashMap};

use crate::funcdef::FunctionDefinition;

/// Version used when an invocation doesn't ask for a specific one.
pub const LATEST_VERSION: &str = "$LATEST";

/// What the lambda API knows about a deployed function.
#[derive(Debug, Clone, Default)]
pub struct LambdaFunction {
    pub arn: String,
    /// Environment variables configured on the function.
    pub envvars: HashMap<String, String>,
    versions: BTreeMap<String, FunctionDefinition>,
}

impl LambdaFunction {
    pub fn new(arn: impl Into<String>) -> Self {
        Self {
            arn: arn.into(),
            ..Self::default()
        }
    }

    /// Registers `funcdef` as the deployable unit of `version`.
    pub fn with_version(mut self, version: impl Into<String>, funcdef: FunctionDefinition) -> Self {
        self.versions.insert(version.into(), funcdef);
        self
    }

    /// Registers `funcdef` as [`LATEST_VERSION`].
    pub fn with_latest(self, funcdef: FunctionDefinition) -> Self {
        self.with_version(LATEST_VERSION, funcdef)
    }

    pub fn with_envvar(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envvars.insert(key.into(), value.into());
        self
    }

    /// Resolves the deployable unit of `version`, [`LATEST_VERSION`] when `None`.
    pub fn function(&self, version: Option<&str>) -> Option<&FunctionDefinition> {
        self.versions.get(version.unwrap_or(LATEST_VERSION))
    }

    /// Registered versions, in lexical order.
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.versions.keys().map(String::as_str)
    }
}
