//! Error types for the shim.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for shim operations.
pub type ShimResult<T> = Result<T, ShimError>;

/// Errors that can occur while translating a terraform invocation.
#[derive(Error, Debug)]
pub enum ShimError {
    #[error("No subcommand given")]
    MissingSubcommand,

    #[error("No env_name, aborting")]
    MissingEnvName,

    #[error("No env_name recorded in {0}, aborting")]
    EnvNotRecorded(PathBuf),

    #[error("Please set TK_HOME or run kitchen from a devcontainer: {0} does not exist")]
    WorkspaceRootMissing(PathBuf),

    #[error("No workspace found under {0}")]
    NoWorkspace(PathBuf),

    #[error("Too many workspaces found under {root} ({count})")]
    TooManyWorkspaces { root: PathBuf, count: usize },

    #[error(
        "Refusing to run inside another shim run; point TGSHIM_TERRAFORM_BIN at the real terraform"
    )]
    NestedRun,

    #[error("Invalid test config {path}: {message}")]
    InvalidTestConfig { path: PathBuf, message: String },

    #[error("Unexpected terragrunt output: {0}")]
    InvalidOutput(String),

    #[error("{0}")]
    Runner(#[from] tgshim_runner::RunnerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ShimError {
    /// Whether the error is a missing or ambiguous precondition.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingSubcommand
                | Self::MissingEnvName
                | Self::EnvNotRecorded(_)
                | Self::WorkspaceRootMissing(_)
                | Self::NoWorkspace(_)
                | Self::TooManyWorkspaces { .. }
                | Self::NestedRun
        )
    }
}
