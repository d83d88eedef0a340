use refunc_config::shared::{ExecutorKind, LambdaConfig};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::executor::{ExecutorError, LambdaExecutor, LocalExecutor};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown executor `{0}`")]
    UnknownExecutor(String),

    #[error("executor `{0}` is not registered")]
    NotRegistered(ExecutorKind),
}

/// Executors available to the emulator, keyed by [`ExecutorKind`].
///
/// Built once at startup and read-only afterwards.
#[derive(Clone)]
pub struct ExecutorRegistry {
    executors: BTreeMap<ExecutorKind, Arc<dyn LambdaExecutor>>,
    default_executor: Arc<dyn LambdaExecutor>,
}

impl ExecutorRegistry {
    /// Registers an executor for every [`ExecutorKind`], with
    /// `config.executor` as the default.
    pub fn new(config: &LambdaConfig) -> Self {
        let executors: BTreeMap<_, _> = ExecutorKind::ALL
            .iter()
            .map(|kind| (*kind, build_executor(*kind, config)))
            .collect();
        let default_executor = executors
            .get(&config.executor)
            .cloned()
            .unwrap_or_else(|| build_executor(config.executor, config));

        Self {
            executors,
            default_executor,
        }
    }

    /// Builds a registry from explicit executors.
    ///
    /// Fails when no executor of `default_kind` is among `executors`.
    pub fn with_executors(
        executors: impl IntoIterator<Item = Arc<dyn LambdaExecutor>>,
        default_kind: ExecutorKind,
    ) -> Result<Self, RegistryError> {
        let executors: BTreeMap<_, _> = executors
            .into_iter()
            .map(|executor| (executor.kind(), executor))
            .collect();
        let default_executor = executors
            .get(&default_kind)
            .cloned()
            .ok_or(RegistryError::NotRegistered(default_kind))?;

        Ok(Self {
            executors,
            default_executor,
        })
    }

    pub fn get(&self, kind: ExecutorKind) -> Option<Arc<dyn LambdaExecutor>> {
        self.executors.get(&kind).cloned()
    }

    pub fn default_executor(&self) -> Arc<dyn LambdaExecutor> {
        self.default_executor.clone()
    }

    /// Looks up an executor by name, failing on unknown or unregistered names.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn LambdaExecutor>, RegistryError> {
        let kind: ExecutorKind = name
            .parse()
            .map_err(|_| RegistryError::UnknownExecutor(name.to_owned()))?;

        self.get(kind).ok_or(RegistryError::NotRegistered(kind))
    }

    /// Looks up an executor by name, using the default one for absent or unknown names.
    pub fn select(&self, name: Option<&str>) -> Arc<dyn LambdaExecutor> {
        let Some(name) = name else {
            return self.default_executor();
        };

        match self.resolve(name) {
            Ok(executor) => executor,
            Err(err) => {
                warn!(
                    %err,
                    default = %self.default_executor.kind(),
                    "falling back to the default executor"
                );
                self.default_executor()
            }
        }
    }

    /// Runs [`LambdaExecutor::startup`] on every registered executor.
    pub async fn startup(&self) -> Result<(), ExecutorError> {
        for executor in self.executors.values() {
            executor.startup().await?;
        }

        Ok(())
    }
}

fn build_executor(kind: ExecutorKind, config: &LambdaConfig) -> Arc<dyn LambdaExecutor> {
    match kind {
        ExecutorKind::Refunc => Arc::new(LocalExecutor::new(config.invoke_binary.clone())),
    }
}
