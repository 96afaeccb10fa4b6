//! Bootstrap around a single dispatch: config swap, credentials, version.

use std::collections::BTreeMap;
use std::sync::Arc;

use tgshim_runner::ProcessRunner;
use tracing::{debug, error};

use crate::dispatch::{DispatchOutcome, Dispatcher, Invocation};
use crate::error::{ShimError, ShimResult};
use crate::settings::Settings;
use crate::swap::ConfigSwap;
use crate::tools::{issue_token, Terraform};

/// Child variable that disables terraform's interactive prompts.
pub const INPUT_VAR: &str = "TF_INPUT";

/// Child variable carrying the cloud access token.
pub const ACCESS_TOKEN_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// One run of the shim.
pub struct Shim {
    settings: Settings,
    runner: Arc<dyn ProcessRunner>,
}

impl Shim {
    pub fn new(settings: Settings, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { settings, runner }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Environment every child starts from.
    pub fn base_env() -> BTreeMap<String, String> {
        BTreeMap::from([
            (INPUT_VAR.to_string(), "false".to_string()),
            (Settings::ACTIVE_VAR.to_string(), "1".to_string()),
        ])
    }

    /// Swap in the test config, handle `invocation`, and restore the live config.
    ///
    /// The live config is restored on every path out of this function,
    /// including errors from the handler and panics.
    pub async fn run(&self, invocation: Invocation) -> ShimResult<DispatchOutcome> {
        // terraform resolved back to this binary; a second swap would back up the test config.
        if self.settings.nested {
            return Err(ShimError::NestedRun);
        }

        let swap = ConfigSwap::acquire(
            self.settings.test_config(),
            self.settings.root_config(),
            self.settings.root_config_backup(),
        )?;

        let outcome = self.run_swapped(invocation).await;

        match (outcome, swap.restore()) {
            (Ok(outcome), Ok(())) => Ok(outcome),
            (Ok(_), Err(restore_err)) => Err(restore_err),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(restore_err)) => {
                error!("Failed to restore the live config: {}", restore_err);
                Err(e)
            }
        }
    }

    async fn run_swapped(&self, invocation: Invocation) -> ShimResult<DispatchOutcome> {
        let mut env = Self::base_env();

        let token = self
            .runner
            .capture(&issue_token(&self.settings, &self.settings.config_dir()).envs(&env))
            .await?;
        env.insert(ACCESS_TOKEN_VAR.to_string(), token.trim().to_string());

        let version = self
            .runner
            .capture(&Terraform::new(&self.settings).version().envs(&env))
            .await?;
        let version = version.lines().next().unwrap_or_default().to_string();
        debug!("Underlying terraform: {}", version);

        Dispatcher::new(self.runner.clone(), &self.settings, env, version)
            .dispatch(invocation)
            .await
    }
}
