//! Shim settings resolved from the environment.
//!
//! Settings are read through a lookup function rather than straight from
//! `std::env`, so tests can resolve them from a plain map.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::env::EnvName;
use crate::error::{ShimError, ShimResult};

/// Executables the shim drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub terraform: String,
    pub terragrunt: String,
    pub jq: String,
    pub token_issuer: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            terraform: "terraform".to_string(),
            terragrunt: "terragrunt".to_string(),
            jq: "jq".to_string(),
            token_issuer: "create-token".to_string(),
        }
    }
}

/// Resolved shim settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Repository root the kitchen run operates on
    pub home: PathBuf,
    /// Directory holding the env-name file and raw output
    pub state_dir: PathBuf,
    pub tools: ToolPaths,
    /// Print commands instead of running them
    pub dry_run: bool,
    /// Set when this process was started by another shim run
    pub nested: bool,
}

impl Settings {
    pub const HOME_VAR: &'static str = "TK_HOME";
    pub const WORKSPACES_ROOT_VAR: &'static str = "TGSHIM_WORKSPACES_ROOT";
    pub const STATE_DIR_VAR: &'static str = "TGSHIM_STATE_DIR";
    pub const TERRAFORM_BIN_VAR: &'static str = "TGSHIM_TERRAFORM_BIN";
    pub const TERRAGRUNT_BIN_VAR: &'static str = "TGSHIM_TERRAGRUNT_BIN";
    pub const JQ_BIN_VAR: &'static str = "TGSHIM_JQ_BIN";
    pub const TOKEN_BIN_VAR: &'static str = "TGSHIM_TOKEN_BIN";
    pub const DRY_RUN_VAR: &'static str = "TGSHIM_DRY_RUN";
    /// Exported to every child so a shim reached through `PATH` refuses to run.
    pub const ACTIVE_VAR: &'static str = "TGSHIM_ACTIVE";

    /// Devcontainer mount point searched when `TK_HOME` is unset.
    pub const DEFAULT_WORKSPACES_ROOT: &'static str = "/workspaces";

    /// Resolve settings from the process environment.
    pub fn from_env() -> ShimResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings from an arbitrary lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> ShimResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let home = match get(Self::HOME_VAR) {
            Some(home) => PathBuf::from(home),
            None => {
                let root = get(Self::WORKSPACES_ROOT_VAR)
                    .unwrap_or_else(|| Self::DEFAULT_WORKSPACES_ROOT.to_string());
                Self::detect_home(Path::new(&root))?
            }
        };

        let defaults = ToolPaths::default();
        let tools = ToolPaths {
            terraform: get(Self::TERRAFORM_BIN_VAR).unwrap_or(defaults.terraform),
            terragrunt: get(Self::TERRAGRUNT_BIN_VAR).unwrap_or(defaults.terragrunt),
            jq: get(Self::JQ_BIN_VAR).unwrap_or(defaults.jq),
            token_issuer: get(Self::TOKEN_BIN_VAR).unwrap_or(defaults.token_issuer),
        };

        let settings = Self {
            home,
            state_dir: get(Self::STATE_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            tools,
            dry_run: get(Self::DRY_RUN_VAR)
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            nested: get(Self::ACTIVE_VAR).is_some(),
        };
        debug!("Resolved settings: {:?}", settings);
        Ok(settings)
    }

    /// Pick the single workspace directory under `root`.
    pub fn detect_home(root: &Path) -> ShimResult<PathBuf> {
        if !root.is_dir() {
            return Err(ShimError::WorkspaceRootMissing(root.to_path_buf()));
        }

        let mut candidates: Vec<PathBuf> = WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .map(|e| e.into_path())
            .collect();

        match candidates.len() {
            0 => Err(ShimError::NoWorkspace(root.to_path_buf())),
            1 => Ok(candidates.remove(0)),
            count => Err(ShimError::TooManyWorkspaces {
                root: root.to_path_buf(),
                count,
            }),
        }
    }

    /// Directory holding the live config and the token issuer's inputs.
    pub fn config_dir(&self) -> PathBuf {
        self.home.join("config")
    }

    /// Live root config.
    pub fn root_config(&self) -> PathBuf {
        self.config_dir().join("root.yaml")
    }

    /// Backup of the live root config taken during a run.
    pub fn root_config_backup(&self) -> PathBuf {
        self.config_dir().join("root.yaml.bak")
    }

    /// Test variant swapped in for the duration of a run.
    pub fn test_config(&self) -> PathBuf {
        self.home.join("test").join("integration").join("root.yaml")
    }

    /// Terragrunt working directory for an environment.
    pub fn env_working_dir(&self, env: &EnvName) -> PathBuf {
        self.home.join("terraform").join(env.as_str())
    }

    /// Raw multi-document output of `run-all output`.
    pub fn raw_output_file(&self) -> PathBuf {
        self.state_dir.join("out.json")
    }
}
