//! Environment names and their groups.

use std::fmt;

use crate::error::{ShimError, ShimResult};

/// Name of the environment under test, e.g. `prod/us-east`.
///
/// The part before the first `/` is the environment group that terragrunt
/// selects its settings with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvName(String);

impl EnvName {
    /// Argument prefix kitchen-terraform uses to pass the name.
    pub const ARG_PREFIX: &'static str = "-var=env_name=";

    /// Wrap a name; empty names are rejected.
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.is_empty() {
            None
        } else {
            Some(Self(name))
        }
    }

    /// Find the name among `-var=env_name=<value>` arguments.
    ///
    /// The last occurrence wins.
    pub fn from_args(args: &[String]) -> ShimResult<Self> {
        args.iter()
            .filter_map(|arg| arg.strip_prefix(Self::ARG_PREFIX))
            .last()
            .and_then(Self::new)
            .ok_or(ShimError::MissingEnvName)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Environment group: everything before the first `/`, or the whole name.
    pub fn group(&self) -> &str {
        match self.0.split_once('/') {
            Some((group, _)) => group,
            None => &self.0,
        }
    }
}

impl fmt::Display for EnvName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
