//! Mock process runner for testing.
//!
//! Provides a configurable implementation of the ProcessRunner trait that
//! records every call and answers with queued responses, so dispatch logic
//! can be verified without terraform or terragrunt installed.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::config::CommandSpec;
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ExecutionResult, ProcessRunner, RelayMode};

/// Predefined mock response for a process execution.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl MockResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            duration_ms: 100,
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            duration_ms: 100,
        }
    }

    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub mode: RelayMode,
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl CapturedCall {
    /// Value of a child environment variable, if it was set.
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// Whether the call carried the given argument.
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

/// Mock process runner for testing.
///
/// Responses are queued per program name and consumed in order; a program
/// with no queued response succeeds with empty output.
#[derive(Clone, Default)]
pub struct MockRunner {
    /// Queued responses keyed by program.
    responses: Arc<RwLock<HashMap<String, VecDeque<MockResponse>>>>,
    /// Captured calls for verification.
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    /// Simulated failure to return (as a string message for ExecutionFailed).
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl MockRunner {
    /// Create a new mock runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next call to `program`.
    pub fn add_response(self, program: impl Into<String>, response: MockResponse) -> Self {
        self.responses
            .write()
            .entry(program.into())
            .or_default()
            .push_back(response);
        self
    }

    /// Set a failure to simulate for every call.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    /// Clear all captured calls.
    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Check if a specific program was run.
    pub fn was_called(&self, program: &str) -> bool {
        self.captured_calls
            .read()
            .iter()
            .any(|c| c.program == program)
    }

    /// Get calls to a specific program.
    pub fn get_program_calls(&self, program: &str) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.program == program)
            .cloned()
            .collect()
    }

    fn record_call(&self, mode: RelayMode, spec: &CommandSpec) {
        self.captured_calls.write().push(CapturedCall {
            mode,
            program: spec.program.clone(),
            args: spec.args.clone(),
            env: spec.env.clone(),
        });
    }

    fn next_response(&self, program: &str) -> MockResponse {
        self.responses
            .write()
            .get_mut(program)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| MockResponse::success(""))
    }

    fn check_failure(&self) -> RunnerResult<()> {
        if let Some(msg) = self.simulate_failure.read().clone() {
            return Err(RunnerError::ExecutionFailed(msg));
        }
        Ok(())
    }

    fn execute(&self, mode: RelayMode, spec: &CommandSpec) -> RunnerResult<ExecutionResult> {
        self.record_call(mode, spec);
        self.check_failure()?;

        let response = self.next_response(&spec.program);
        let started_at = Utc::now();
        let finished_at = started_at + chrono::Duration::milliseconds(response.duration_ms as i64);

        ExecutionResult {
            program: spec.program.clone(),
            exit_code: response.exit_code,
            stdout: response.stdout,
            stderr: response.stderr,
            started_at,
            finished_at,
            duration_ms: response.duration_ms,
        }
        .into_result(mode)
    }
}

#[async_trait]
impl ProcessRunner for MockRunner {
    async fn stream(&self, spec: &CommandSpec) -> RunnerResult<ExecutionResult> {
        self.execute(RelayMode::Streaming, spec)
    }

    async fn capture(&self, spec: &CommandSpec) -> RunnerResult<String> {
        Ok(self.execute(RelayMode::Capturing, spec)?.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_runner_basic() {
        let runner = MockRunner::new().add_response("terraform", MockResponse::success("v1.6.0"));

        let out = runner
            .capture(&CommandSpec::new("terraform").arg("-v"))
            .await
            .unwrap();

        assert_eq!(out, "v1.6.0");
    }

    #[tokio::test]
    async fn test_mock_runner_captures_calls() {
        let runner = MockRunner::new();

        let spec = CommandSpec::new("terragrunt")
            .args(["run-all", "apply"])
            .env("TG_ENVIRONMENT", "prod");
        let _ = runner.stream(&spec).await;

        let calls = runner.get_program_calls("terragrunt");
        assert_eq!(calls.len(), 1);

        let call = &calls[0];
        assert_eq!(call.mode, RelayMode::Streaming);
        assert!(call.has_arg("apply"));
        assert_eq!(call.env_var("TG_ENVIRONMENT"), Some("prod"));
        assert!(!runner.was_called("terraform"));
    }

    #[tokio::test]
    async fn test_mock_runner_failure_simulation() {
        let runner = MockRunner::new().simulate_failure("simulated error");

        let result = runner.stream(&CommandSpec::new("terraform")).await;
        assert!(result.is_err());
        assert_eq!(runner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_runner_queues_per_program() {
        let runner = MockRunner::new()
            .add_response("jq", MockResponse::success("first"))
            .add_response("jq", MockResponse::failure(5, "second failed"))
            .add_response("terraform", MockResponse::success("tf"));

        let jq = CommandSpec::new("jq");
        assert_eq!(runner.capture(&jq).await.unwrap(), "first");
        assert_eq!(
            runner
                .capture(&CommandSpec::new("terraform"))
                .await
                .unwrap(),
            "tf"
        );

        let err = runner.capture(&jq).await.unwrap_err();
        assert_eq!(err.exit_code(), Some(5));

        // Queue exhausted: default success.
        assert_eq!(runner.capture(&jq).await.unwrap(), "");

        runner.clear_calls();
        assert_eq!(runner.call_count(), 0);
    }
}
