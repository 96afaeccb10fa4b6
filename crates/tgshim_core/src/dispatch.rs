//! Translation of terraform subcommands into terragrunt runs.

use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use serde_json::Value;
use tgshim_runner::{CommandSpec, ProcessRunner};
use tracing::{debug, info};

use crate::env::EnvName;
use crate::error::{ShimError, ShimResult};
use crate::merge::merge_outputs;
use crate::settings::Settings;
use crate::store::EnvStore;
use crate::tools::{jq_slurp, Terraform, Terragrunt};

/// Child variable that selects the environment group in terragrunt configs.
pub const ENVIRONMENT_VAR: &str = "TG_ENVIRONMENT";

/// Terraform subcommands the shim knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subcommand {
    Version,
    Apply,
    Output,
    Destroy,
    Workspace,
    Init,
    Validate,
    /// Forwarded verbatim to the real terraform
    Other(String),
}

impl Subcommand {
    pub fn from_str(s: &str) -> Self {
        match s {
            "version" => Self::Version,
            "apply" => Self::Apply,
            "output" => Self::Output,
            "destroy" => Self::Destroy,
            "workspace" => Self::Workspace,
            "init" => Self::Init,
            "validate" => Self::Validate,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Version => "version",
            Self::Apply => "apply",
            Self::Output => "output",
            Self::Destroy => "destroy",
            Self::Workspace => "workspace",
            Self::Init => "init",
            Self::Validate => "validate",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl std::fmt::Display for Subcommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One terraform-shaped invocation: a subcommand and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub subcommand: Subcommand,
    pub args: Vec<String>,
}

impl Invocation {
    /// Build from the arguments after the program name.
    pub fn new(args: Vec<String>) -> ShimResult<Self> {
        let mut args = args.into_iter();
        let subcommand = args.next().ok_or(ShimError::MissingSubcommand)?;
        Ok(Self {
            subcommand: Subcommand::from_str(&subcommand),
            args: args.collect(),
        })
    }

    /// Build from a full argv, skipping the program name.
    pub fn from_argv<I, S>(argv: I) -> ShimResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(argv.into_iter().skip(1).map(Into::into).collect())
    }
}

/// What the caller has left to do once a subcommand was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A child ran and its output was already relayed.
    Ran,
    /// Text to print on stdout.
    Print(String),
    /// Nothing was run.
    NoOp,
}

/// Maps subcommands onto terraform or terragrunt runs.
pub struct Dispatcher<'a> {
    runner: Arc<dyn ProcessRunner>,
    settings: &'a Settings,
    store: EnvStore,
    base_env: BTreeMap<String, String>,
    version: String,
}

impl<'a> Dispatcher<'a> {
    /// `base_env` is added to every child; `version` is what `version` prints.
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        settings: &'a Settings,
        base_env: BTreeMap<String, String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            settings,
            store: EnvStore::new(&settings.state_dir),
            base_env,
            version: version.into(),
        }
    }

    pub async fn dispatch(&self, invocation: Invocation) -> ShimResult<DispatchOutcome> {
        info!("Dispatching terraform {}", invocation.subcommand);

        match invocation.subcommand {
            // Lets terragrunt validate the version without running terraform again.
            Subcommand::Version => Ok(DispatchOutcome::Print(self.version.clone())),
            Subcommand::Apply => self.apply(&invocation.args).await,
            Subcommand::Output => self.output().await,
            Subcommand::Destroy => self.destroy(&invocation.args).await,
            // kitchen's workspace tracking has no terragrunt counterpart.
            Subcommand::Workspace => Ok(DispatchOutcome::NoOp),
            Subcommand::Init => self.stream(Terraform::new(self.settings).init()).await,
            Subcommand::Validate => self.stream(Terraform::new(self.settings).validate()).await,
            Subcommand::Other(command) => {
                self.stream(Terraform::new(self.settings).passthrough(&command, &invocation.args))
                    .await
            }
        }
    }

    async fn apply(&self, args: &[String]) -> ShimResult<DispatchOutcome> {
        let env = EnvName::from_args(args)?;
        self.store.write(&env)?;

        let spec = Terragrunt::new(self.settings).apply(&env);
        self.stream(with_environment(spec, &env)).await
    }

    async fn destroy(&self, args: &[String]) -> ShimResult<DispatchOutcome> {
        let env = EnvName::from_args(args)?;

        let spec = Terragrunt::new(self.settings).destroy(&env);
        self.stream(with_environment(spec, &env)).await
    }

    async fn output(&self) -> ShimResult<DispatchOutcome> {
        let env = self
            .store
            .read()?
            .ok_or_else(|| ShimError::EnvNotRecorded(self.store.path().to_path_buf()))?;

        let spec = Terragrunt::new(self.settings).output();
        let raw = self.capture(with_environment(spec, &env)).await?;

        let raw_file = self.settings.raw_output_file();
        fs::write(&raw_file, &raw)?;
        debug!("Wrote {} bytes of raw output to {:?}", raw.len(), raw_file);

        let slurped = self.capture(jq_slurp(self.settings, &raw_file)).await?;
        let merged = merge_outputs(&slurped)?;

        Ok(DispatchOutcome::Print(serde_json::to_string(&Value::Object(
            merged,
        ))?))
    }

    async fn stream(&self, spec: CommandSpec) -> ShimResult<DispatchOutcome> {
        self.runner.stream(&spec.envs(&self.base_env)).await?;
        Ok(DispatchOutcome::Ran)
    }

    async fn capture(&self, spec: CommandSpec) -> ShimResult<String> {
        Ok(self.runner.capture(&spec.envs(&self.base_env)).await?)
    }
}

fn with_environment(spec: CommandSpec, env: &EnvName) -> CommandSpec {
    spec.env(ENVIRONMENT_VAR, env.group())
}
