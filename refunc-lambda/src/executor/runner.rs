use std::collections::HashMap;
use std::fmt;
use std::process::Stdio;
use tokio::process::{Child, Command};

use crate::executor::ExecutorError;

/// Command line dispatching an invocation to the cluster:
/// `invoke -n <namespace> -t <timeout>s <name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeCommand {
    program: String,
    namespace: String,
    timeout_secs: u64,
    function_name: String,
}

impl InvokeCommand {
    pub fn new(
        program: impl Into<String>,
        namespace: impl Into<String>,
        timeout_secs: u64,
        function_name: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            namespace: namespace.into(),
            timeout_secs,
            function_name: function_name.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn args(&self) -> Vec<String> {
        vec![
            "-n".to_owned(),
            self.namespace.clone(),
            "-t".to_owned(),
            format!("{}s", self.timeout_secs),
            self.function_name.clone(),
        ]
    }
}

impl fmt::Display for InvokeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in self.args() {
            write!(f, " {arg}")?;
        }

        Ok(())
    }
}

/// Spawns invocation processes.
///
/// Standard output and standard error are always piped so they can be read
/// once the process exits. Spawning never blocks, waiting is up to the owner
/// of the returned [`Child`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InvocationRunner;

impl InvocationRunner {
    /// Starts `command` with `env_vars` layered over the current environment.
    ///
    /// With `stream_input`, standard input is left open on the returned
    /// [`Child`] and the caller must close it once the payload is written.
    pub fn run(
        &self,
        command: &InvokeCommand,
        env_vars: &HashMap<String, String>,
        stream_input: bool,
    ) -> Result<Child, ExecutorError> {
        let stdin = if stream_input {
            Stdio::piped()
        } else {
            Stdio::null()
        };

        Command::new(command.program())
            .args(command.args())
            .envs(env_vars)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExecutorError::Spawn {
                command: command.to_string(),
                source,
            })
    }
}
