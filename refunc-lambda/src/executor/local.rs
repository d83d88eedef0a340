use async_trait::async_trait;
use refunc_config::shared::{DEFAULT_INVOKE_BINARY, ExecutorKind};
use std::io::ErrorKind;
use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdin;
use tracing::{debug, warn};

use crate::executor::{
    ExecutorError, InvocationRequest, InvocationResult, InvocationRunner, InvokeCommand,
    LATEST_VERSION, LambdaExecutor,
};
use crate::funcdef::FunctionDefinition;

/// Timeout, in seconds, used when a function definition doesn't set one.
///
/// Matches the longest a pre-allocated runtime may sit idle on the cluster.
pub const MAX_CONTAINER_IDLE_TIME_SECS: u64 = 540;

/// Executor running functions on the cluster through the `invoke` tool.
#[derive(Debug, Clone)]
pub struct LocalExecutor {
    invoke_binary: String,
    runner: InvocationRunner,
}

impl LocalExecutor {
    pub fn new(invoke_binary: impl Into<String>) -> Self {
        Self {
            invoke_binary: invoke_binary.into(),
            runner: InvocationRunner,
        }
    }

    /// Builds the command line invoking `funcdef`.
    pub fn command(&self, funcdef: &FunctionDefinition) -> Result<InvokeCommand, ExecutorError> {
        let timeout_secs = funcdef
            .timeout_secs()
            .unwrap_or(MAX_CONTAINER_IDLE_TIME_SECS);

        Ok(InvokeCommand::new(
            self.invoke_binary.clone(),
            funcdef.namespace()?,
            timeout_secs,
            funcdef.name()?,
        ))
    }
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_INVOKE_BINARY)
    }
}

#[async_trait]
impl LambdaExecutor for LocalExecutor {
    fn kind(&self) -> ExecutorKind {
        ExecutorKind::Refunc
    }

    async fn execute(
        &self,
        request: InvocationRequest<'_>,
    ) -> Result<InvocationResult, ExecutorError> {
        // The function's own map is never touched.
        let environment = request.function.envvars.clone();

        let funcdef = request.function.function(request.version).ok_or_else(|| {
            let available: Vec<_> = request.function.versions().collect();
            warn!(arn = request.func_arn, ?available, "requested version is not deployed");

            ExecutorError::VersionNotFound {
                arn: request.func_arn.to_owned(),
                version: request.version.unwrap_or(LATEST_VERSION).to_owned(),
            }
        })?;
        let command = self.command(funcdef)?;
        let payload = serde_json::to_vec(request.event)?;

        debug!(
            cmd = %command,
            arn = request.func_arn,
            asynchronous = request.asynchronous,
            "invoking lambda function"
        );

        let mut child = self.runner.run(&command, &environment, true)?;
        let stdin = child.stdin.take();

        if request.asynchronous {
            // The process outlives this call. Its output is drained so that it
            // never blocks on a full pipe, its exit status is ignored.
            tokio::spawn(async move {
                if let Err(err) = child.wait_with_output().await {
                    debug!(%err, "failed to reap asynchronous lambda process");
                }
            });

            // The event must be fully handed over before returning, a runtime
            // shutting down right after would cut it off otherwise.
            write_input(stdin, &payload).await?;

            return Ok(InvocationResult::asynchronous());
        }

        // Output is read while the event is written, a function printing
        // before it consumed its input would otherwise dead-lock.
        let (written, output) =
            tokio::join!(write_input(stdin, &payload), child.wait_with_output());
        let output = output?;

        let result = String::from_utf8_lossy(&output.stdout).into_owned();
        let log_output = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(ExecutorError::Execution {
                exit_code: output.status.code(),
                stderr: log_output,
            });
        }
        written?;

        Ok(InvocationResult { result, log_output })
    }
}

/// Writes `payload` to the process input and closes it.
///
/// A process that exits without reading its input is not an error.
async fn write_input(stdin: Option<ChildStdin>, payload: &[u8]) -> std::io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };

    let result = match stdin.write_all(payload).await {
        Ok(()) => stdin.flush().await,
        Err(err) => Err(err),
    };
    // Dropping the handle closes the stream, which is the end of the event.
    drop(stdin);

    match result {
        Err(err) if err.kind() == ErrorKind::BrokenPipe => Ok(()),
        result => result,
    }
}
