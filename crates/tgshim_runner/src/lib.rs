//! # tgshim_runner
//!
//! Child process execution layer for the kitchen-terragrunt shim.
//!
//! Every external tool the shim drives (terraform, terragrunt, jq and the
//! token issuer) is launched through the [`ProcessRunner`] trait, in one of
//! two relay modes:
//!
//! - **Streaming**: stdout is echoed line by line while the child runs, and
//!   a failing child is reported with its stderr.
//! - **Capturing**: the child runs to completion and its stdout is returned
//!   to the caller for parsing.
//!
//! The environment of a child is always passed explicitly on the
//! [`CommandSpec`]; runners never read or mutate the shim's own process
//! environment on the caller's behalf.
//!
//! # Example
//!
//! ```rust,no_run
//! use tgshim_runner::{CommandSpec, ProcessRunner, SystemRunner, SystemRunnerOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = SystemRunner::new(SystemRunnerOptions::default());
//!
//!     let spec = CommandSpec::new("terraform")
//!         .arg("validate")
//!         .env("TF_INPUT", "false");
//!
//!     let result = runner.stream(&spec).await?;
//!     println!("finished in {}ms", result.duration_ms);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod mock;
pub mod runner;
pub mod system;

pub use config::CommandSpec;
pub use error::{RunnerError, RunnerResult};
pub use mock::{CapturedCall, MockResponse, MockRunner};
pub use runner::{ExecutionResult, ProcessRunner, RelayMode};
pub use system::{LineHandler, SystemRunner, SystemRunnerOptions};
