//! Environment name persistence between shim invocations.
//!
//! kitchen-terraform passes `-var=env_name=...` to `apply` and `destroy` but
//! not to `output`, so `apply` records the name in a single-entry file that
//! later invocations read back.
//!
//! - `write` replaces any previous entry.
//! - `read` yields `None` when the file is absent or holds only whitespace.
//! - Nothing deletes the entry; it lives as long as the state directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::env::EnvName;
use crate::error::ShimResult;

/// Single-entry store for the active environment name.
#[derive(Debug, Clone)]
pub struct EnvStore {
    path: PathBuf,
}

impl EnvStore {
    /// File name inside the state directory.
    pub const FILE_NAME: &'static str = "env";

    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir.as_ref().join(Self::FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record `env`, replacing whatever was stored before.
    pub fn write(&self, env: &EnvName) -> ShimResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!("Recording env_name {} in {:?}", env, self.path);
        fs::write(&self.path, env.as_str())?;
        Ok(())
    }

    /// Read the recorded name, if any.
    pub fn read(&self) -> ShimResult<Option<EnvName>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(EnvName::new(content.trim())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_absent_reads_none() {
        let dir = tempdir().unwrap();
        let store = EnvStore::new(dir.path());
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_empty_reads_none() {
        let dir = tempdir().unwrap();
        let store = EnvStore::new(dir.path());
        fs::write(store.path(), "\n").unwrap();
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let store = EnvStore::new(dir.path());

        store.write(&EnvName::new("prod/us-east").unwrap()).unwrap();
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "prod/us-east");
        assert_eq!(store.read().unwrap(), EnvName::new("prod/us-east"));
    }

    #[test]
    fn test_write_overwrites() {
        let dir = tempdir().unwrap();
        let store = EnvStore::new(dir.path().join("nested"));

        store.write(&EnvName::new("staging").unwrap()).unwrap();
        store.write(&EnvName::new("dev").unwrap()).unwrap();
        assert_eq!(store.read().unwrap(), EnvName::new("dev"));
    }
}
