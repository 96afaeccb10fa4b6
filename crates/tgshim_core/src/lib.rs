//! # tgshim_core
//!
//! Terraform-to-Terragrunt command translation for kitchen-terraform.
//!
//! kitchen-terraform only knows how to drive `terraform`. This crate turns
//! each of its calls into the matching `terragrunt run-all` (or plain
//! terraform) invocation, carrying the environment under test from one
//! process launch to the next.
//!
//! ## Lifecycle of one run
//!
//! 1. [`Settings`] resolves the repository root (`TK_HOME` or the single
//!    devcontainer workspace) and tool locations.
//! 2. [`ConfigSwap`] installs `test/integration/root.yaml` over
//!    `config/root.yaml` and restores the original when the run ends.
//! 3. An access token and the terraform version are fetched once.
//! 4. [`Dispatcher`] handles the subcommand.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use tgshim_core::{Invocation, Settings, Shim};
//! use tgshim_runner::{SystemRunner, SystemRunnerOptions};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::from_env()?;
//! let shim = Shim::new(settings, Arc::new(SystemRunner::new(SystemRunnerOptions::default())));
//!
//! shim.run(Invocation::from_argv(["terraform", "apply", "-var=env_name=staging"])?)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod env;
pub mod error;
pub mod merge;
pub mod settings;
pub mod shim;
pub mod store;
pub mod swap;
pub mod tools;

pub use dispatch::{DispatchOutcome, Dispatcher, Invocation, Subcommand, ENVIRONMENT_VAR};
pub use env::EnvName;
pub use error::{ShimError, ShimResult};
pub use merge::merge_outputs;
pub use settings::{Settings, ToolPaths};
pub use shim::{Shim, ACCESS_TOKEN_VAR, INPUT_VAR};
pub use store::EnvStore;
pub use swap::ConfigSwap;
pub use tools::{Terraform, Terragrunt};
