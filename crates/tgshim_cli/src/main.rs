//! kitchen-terragrunt shim - `terraform` entry point.
//!
//! Exit codes:
//! - 0: Success (including no-op subcommands)
//! - 1: General error
//! - 2: Missing precondition (env_name, workspace, subcommand)
//! - 3: Child process failure
//! - 4: Invalid test config

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tgshim_core::{DispatchOutcome, Invocation, Settings, Shim, ShimError};
use tgshim_runner::{SystemRunner, SystemRunnerOptions};

mod cli;

use cli::Cli;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const PRECONDITION: u8 = 2;
    pub const CHILD_FAILURE: u8 = 3;
    pub const INVALID_CONFIG: u8 = 4;
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // stdout carries terraform's output to kitchen; logs go to stderr.
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(categorize_error(&e))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let invocation = Invocation::new(cli.argv)?;
    let settings = Settings::from_env()?;
    debug!("Handling {:?} with home {:?}", invocation, settings.home);

    let mut options = SystemRunnerOptions::new();
    if settings.dry_run {
        options = options.dry_run();
    }
    let shim = Shim::new(settings, Arc::new(SystemRunner::new(options)));

    if let DispatchOutcome::Print(text) = shim.run(invocation).await? {
        println!("{}", text);
    }
    Ok(())
}

/// Map an error onto its exit code.
fn categorize_error(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<ShimError>() {
        Some(err) if err.is_precondition() => ExitCodes::PRECONDITION,
        Some(ShimError::Runner(_)) => ExitCodes::CHILD_FAILURE,
        Some(ShimError::InvalidTestConfig { .. }) => ExitCodes::INVALID_CONFIG,
        _ => ExitCodes::GENERAL_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tgshim_runner::RunnerError;

    #[test]
    fn test_categorize_error() {
        assert_eq!(
            categorize_error(&ShimError::MissingEnvName.into()),
            ExitCodes::PRECONDITION
        );
        assert_eq!(
            categorize_error(&ShimError::NestedRun.into()),
            ExitCodes::PRECONDITION
        );
        assert_eq!(
            categorize_error(
                &ShimError::TooManyWorkspaces {
                    root: PathBuf::from("/workspaces"),
                    count: 3,
                }
                .into()
            ),
            ExitCodes::PRECONDITION
        );
        assert_eq!(
            categorize_error(
                &ShimError::Runner(RunnerError::NonZeroExit {
                    program: "terragrunt".to_string(),
                    exit_code: 1,
                    message: "boom".to_string(),
                })
                .into()
            ),
            ExitCodes::CHILD_FAILURE
        );
        assert_eq!(
            categorize_error(
                &ShimError::InvalidTestConfig {
                    path: PathBuf::from("root.yaml"),
                    message: "bad".to_string(),
                }
                .into()
            ),
            ExitCodes::INVALID_CONFIG
        );
        assert_eq!(
            categorize_error(&anyhow::anyhow!("something else")),
            ExitCodes::GENERAL_ERROR
        );
    }
}
