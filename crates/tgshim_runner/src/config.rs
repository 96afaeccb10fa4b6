//! Command configuration types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A fully described child process invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program to execute (looked up on `PATH` when not absolute)
    pub program: String,
    /// Arguments, passed verbatim
    pub args: Vec<String>,
    /// Variables added on top of the inherited environment
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn envs(mut self, vars: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Shell-like rendering for logs and dry-run output.
    pub fn command_line(&self) -> String {
        let mut cmd = self.program.clone();
        for arg in &self.args {
            if arg.contains(' ') || arg.is_empty() {
                cmd.push_str(&format!(" '{}'", arg));
            } else {
                cmd.push(' ');
                cmd.push_str(arg);
            }
        }
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_args_and_env() {
        let spec = CommandSpec::new("terragrunt")
            .args(["run-all", "apply"])
            .arg("--terragrunt-include-external-dependencies")
            .env("TF_INPUT", "false");

        assert_eq!(spec.program, "terragrunt");
        assert_eq!(
            spec.args,
            vec![
                "run-all".to_string(),
                "apply".to_string(),
                "--terragrunt-include-external-dependencies".to_string(),
            ]
        );
        assert_eq!(spec.env.get("TF_INPUT"), Some(&"false".to_string()));
    }

    #[test]
    fn test_envs_overrides_existing_keys() {
        let mut base = BTreeMap::new();
        base.insert("TG_ENVIRONMENT".to_string(), "prod".to_string());

        let spec = CommandSpec::new("terragrunt")
            .env("TG_ENVIRONMENT", "dev")
            .envs(&base);

        assert_eq!(spec.env.get("TG_ENVIRONMENT"), Some(&"prod".to_string()));
    }

    #[test]
    fn test_command_line_quotes_spaces() {
        let spec = CommandSpec::new("terraform").args(["plan", "-var=name=a b", ""]);
        assert_eq!(spec.command_line(), "terraform plan '-var=name=a b' ''");
    }
}
