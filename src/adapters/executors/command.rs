//! Subprocess executor.
//!
//! Runs the configured program once per invocation. The program receives the
//! executor name as its last argument and the JSON-encoded [`Invocation`] on
//! stdin, and must print a JSON [`InvocationOutcome`] on stdout.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::CommandExecutorConfig;
use crate::domain::ports::{Executor, Invocation, InvocationOutcome};

/// Executor backed by one child process per call.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    program: String,
    args: Vec<String>,
}

impl CommandExecutor {
    pub fn new(config: &CommandExecutorConfig) -> DomainResult<Self> {
        if config.program.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "command executor requires a program".to_string(),
            ));
        }
        Ok(Self {
            program: config.program.clone(),
            args: config.args.clone(),
        })
    }

    fn failure(&self, invocation: &Invocation, reason: impl Into<String>) -> DomainError {
        DomainError::InvocationFailed {
            executor: invocation.executor.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Executor for CommandExecutor {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn invoke(&self, invocation: Invocation) -> DomainResult<InvocationOutcome> {
        let started = Instant::now();
        let request = serde_json::to_vec(&invocation)?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(&invocation.executor)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropped when the coordinator abandons the subtask.
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| self.failure(&invocation, format!("failed to spawn {}: {e}", self.program)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.failure(&invocation, "failed to capture stdin"))?;
        stdin.write_all(&request).await?;
        drop(stdin);

        let output = child.wait_with_output().await?;
        debug!(
            executor = %invocation.executor,
            status = ?output.status.code(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "command executor finished"
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failure(
                &invocation,
                format!("exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        let mut outcome: InvocationOutcome = serde_json::from_slice(&output.stdout)
            .map_err(|e| self.failure(&invocation, format!("invalid outcome on stdout: {e}")))?;
        if outcome.execution_time_ms == 0 {
            outcome.execution_time_ms = started.elapsed().as_millis() as u64;
        }
        Ok(outcome)
    }
}
