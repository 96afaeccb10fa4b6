//! Command lines for the external tools the shim drives.

use std::path::Path;

use tgshim_runner::CommandSpec;

use crate::env::EnvName;
use crate::settings::Settings;

/// Flag that makes `run-all` follow dependencies outside the working dir.
pub const INCLUDE_EXTERNAL_DEPENDENCIES: &str = "--terragrunt-include-external-dependencies";

/// Flags `terraform init` is run with.
pub const INIT_FLAGS: [&str; 5] = [
    "-input=false",
    "-upgrade",
    "-force-copy",
    "-backend=true",
    "-get=true",
];

/// Terragrunt `run-all` commands.
pub struct Terragrunt<'a> {
    settings: &'a Settings,
}

impl<'a> Terragrunt<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    fn run_all(&self, action: &str) -> CommandSpec {
        CommandSpec::new(&self.settings.tools.terragrunt).args(["run-all", action])
    }

    fn in_env(&self, spec: CommandSpec, env: &EnvName) -> CommandSpec {
        spec.arg("--terragrunt-working-dir")
            .arg(self.settings.env_working_dir(env).to_string_lossy())
            .arg(INCLUDE_EXTERNAL_DEPENDENCIES)
    }

    pub fn apply(&self, env: &EnvName) -> CommandSpec {
        self.in_env(self.run_all("apply"), env)
    }

    pub fn destroy(&self, env: &EnvName) -> CommandSpec {
        self.in_env(self.run_all("destroy"), env)
    }

    /// JSON outputs of every module, one document per module.
    ///
    /// Parallelism is pinned to 1 so documents are never interleaved.
    pub fn output(&self) -> CommandSpec {
        self.run_all("output")
            .args(["-json", "--terragrunt-parallelism", "1"])
            .arg(INCLUDE_EXTERNAL_DEPENDENCIES)
    }
}

/// The real terraform binary.
pub struct Terraform<'a> {
    settings: &'a Settings,
}

impl<'a> Terraform<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    fn command(&self) -> CommandSpec {
        CommandSpec::new(&self.settings.tools.terraform)
    }

    pub fn version(&self) -> CommandSpec {
        self.command().arg("-v")
    }

    pub fn init(&self) -> CommandSpec {
        self.command().arg("init").args(INIT_FLAGS)
    }

    /// Terraform >= 0.15 rejects `-var` on validate, so no flags are forwarded.
    pub fn validate(&self) -> CommandSpec {
        self.command().arg("validate")
    }

    pub fn passthrough(&self, subcommand: &str, args: &[String]) -> CommandSpec {
        self.command().arg(subcommand).args(args.iter().cloned())
    }
}

/// `jq` invocation that slurps a stream of documents into one array.
pub fn jq_slurp(settings: &Settings, file: &Path) -> CommandSpec {
    CommandSpec::new(&settings.tools.jq)
        .args(["-rs", "."])
        .arg(file.to_string_lossy())
}

/// Token issuer invocation for the given config directory.
pub fn issue_token(settings: &Settings, config_dir: &Path) -> CommandSpec {
    CommandSpec::new(&settings.tools.token_issuer)
        .arg("-d")
        .arg(config_dir.to_string_lossy())
}
