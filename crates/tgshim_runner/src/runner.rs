//! Process runner trait and types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CommandSpec;
use crate::error::{RunnerError, RunnerResult};

/// How the output of a child is relayed to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayMode {
    /// Echo stdout live; report stderr on failure.
    Streaming,
    /// Collect stdout for the caller; report the captured output on failure.
    Capturing,
}

/// Result of a finished child process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Program that was run
    pub program: String,
    /// Exit code (-1 when terminated by a signal)
    pub exit_code: i32,
    /// Captured stdout (empty for streamed runs, whose lines are relayed as they arrive)
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
    /// Execution start time
    pub started_at: DateTime<Utc>,
    /// Execution end time
    pub finished_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Check if execution was successful (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Turn a non-zero exit into [`RunnerError::NonZeroExit`].
    ///
    /// Streaming failures carry stderr. Capturing failures carry stdout,
    /// falling back to stderr when the child printed nothing on stdout.
    pub fn into_result(self, mode: RelayMode) -> RunnerResult<Self> {
        if self.success() {
            return Ok(self);
        }

        let message = match mode {
            RelayMode::Streaming => self.stderr,
            RelayMode::Capturing if self.stdout.trim().is_empty() => self.stderr,
            RelayMode::Capturing => self.stdout,
        };

        Err(RunnerError::NonZeroExit {
            program: self.program,
            exit_code: self.exit_code,
            message: message.trim_end().to_string(),
        })
    }
}

/// Process runner trait.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run a command, echoing its stdout line by line as it is produced.
    ///
    /// Fails with [`RunnerError::NonZeroExit`] carrying the child's stderr.
    async fn stream(&self, spec: &CommandSpec) -> RunnerResult<ExecutionResult>;

    /// Run a command to completion and return its stdout.
    ///
    /// Fails with [`RunnerError::NonZeroExit`] carrying the captured output.
    async fn capture(&self, spec: &CommandSpec) -> RunnerResult<String>;
}
