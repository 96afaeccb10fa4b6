//! Runner that launches real child processes.
//!
//! Stdout and stderr of a child are drained concurrently, so a chatty child
//! can never block on a full pipe while the other stream is being read.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::config::CommandSpec;
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ExecutionResult, ProcessRunner, RelayMode};

/// System runner options.
#[derive(Debug, Clone, Default)]
pub struct SystemRunnerOptions {
    /// Dry-run mode (print commands without executing)
    pub dry_run: bool,
}

impl SystemRunnerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

/// Callback invoked with every streamed stdout line.
pub type LineHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Runner backed by `tokio::process`.
pub struct SystemRunner {
    options: SystemRunnerOptions,
    line_handler: Option<LineHandler>,
}

impl SystemRunner {
    pub fn new(options: SystemRunnerOptions) -> Self {
        Self {
            options,
            line_handler: None,
        }
    }

    /// Set a handler that sees each streamed line after it is echoed.
    pub fn with_line_handler(mut self, handler: LineHandler) -> Self {
        self.line_handler = Some(handler);
        self
    }

    /// Check if dry-run mode is enabled.
    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    fn command(spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        cmd.envs(&spec.env);
        cmd.stdin(Stdio::inherit());
        cmd.kill_on_drop(true);
        cmd
    }

    /// Echo stdout line by line until EOF, replacing invalid UTF-8.
    async fn relay_stdout<R>(&self, reader: R) -> std::io::Result<()>
    where
        R: AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                return Ok(());
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end();
            println!("{}", line);
            if let Some(handler) = &self.line_handler {
                handler(line);
            }
        }
    }

    fn spawn_error(spec: &CommandSpec, source: std::io::Error) -> RunnerError {
        RunnerError::Spawn {
            program: spec.program.clone(),
            source,
        }
    }

    fn dry_run_result(spec: &CommandSpec) -> ExecutionResult {
        let now = Utc::now();
        ExecutionResult {
            program: spec.program.clone(),
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
            started_at: now,
            finished_at: now,
            duration_ms: 0,
        }
    }

    fn log_completion(result: &ExecutionResult) {
        if result.success() {
            debug!(
                "{} completed successfully in {}ms",
                result.program, result.duration_ms
            );
        } else {
            error!(
                "{} failed with exit code {} after {}ms",
                result.program, result.exit_code, result.duration_ms
            );
        }
    }
}

/// Read a whole stream, replacing invalid UTF-8.
async fn drain<R>(mut reader: R) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn stream(&self, spec: &CommandSpec) -> RunnerResult<ExecutionResult> {
        info!("Running: {}", spec);

        if self.options.dry_run {
            println!("[DRY-RUN] {}", spec);
            return Ok(Self::dry_run_result(spec));
        }

        let mut child = Self::command(spec)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Self::spawn_error(spec, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RunnerError::ExecutionFailed("stdout was not piped".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RunnerError::ExecutionFailed("stderr was not piped".to_string()))?;

        let started_at = Utc::now();
        let stderr_task = tokio::spawn(drain(stderr));

        if let Err(e) = self.relay_stdout(stdout).await {
            // Never leave the child running once its output can't be relayed.
            if let Err(kill_err) = child.kill().await {
                error!("Failed to kill {}: {}", spec.program, kill_err);
            }
            return Err(e.into());
        }

        let status = child.wait().await?;
        let stderr = stderr_task
            .await
            .map_err(|e| RunnerError::ExecutionFailed(format!("stderr reader failed: {}", e)))??;
        let finished_at = Utc::now();

        if !stderr.is_empty() {
            debug!("{} stderr:\n{}", spec.program, stderr.trim_end());
        }

        let result = ExecutionResult {
            program: spec.program.clone(),
            exit_code: status.code().unwrap_or(-1),
            stdout: String::new(),
            stderr,
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds().max(0) as u64,
        };
        Self::log_completion(&result);

        result.into_result(RelayMode::Streaming)
    }

    async fn capture(&self, spec: &CommandSpec) -> RunnerResult<String> {
        debug!("Capturing: {}", spec);

        if self.options.dry_run {
            info!("[DRY-RUN] Would capture: {}", spec);
            return Ok(String::new());
        }

        let started_at = Utc::now();
        let output = Self::command(spec)
            .output()
            .await
            .map_err(|e| Self::spawn_error(spec, e))?;
        let finished_at = Utc::now();

        let result = ExecutionResult {
            program: spec.program.clone(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds().max(0) as u64,
        };
        Self::log_completion(&result);

        Ok(result.into_result(RelayMode::Capturing)?.stdout)
    }
}
