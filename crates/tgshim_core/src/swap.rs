//! Scoped replacement of the live root config with the test variant.
//!
//! [`ConfigSwap::acquire`] backs up the live file and copies the test config
//! over it. The backup is copied back by [`ConfigSwap::restore`] or, if the
//! guard is dropped without it (early return, panic unwinding), by `Drop`.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::{debug, error, info};

use crate::error::{ShimError, ShimResult};

/// Guard that holds the test config in place of the live one.
#[derive(Debug)]
pub struct ConfigSwap {
    live: PathBuf,
    backup: PathBuf,
    restored: bool,
}

impl ConfigSwap {
    /// Validate `test_config`, back up `live` to `backup` and install the test config.
    ///
    /// Nothing is copied when the test config does not parse, and nothing is
    /// restored when the backup itself could not be taken.
    pub fn acquire(
        test_config: impl AsRef<Path>,
        live: impl AsRef<Path>,
        backup: impl AsRef<Path>,
    ) -> ShimResult<Self> {
        let test_config = test_config.as_ref();
        validate_config(test_config)?;

        let live = live.as_ref().to_path_buf();
        let backup = backup.as_ref().to_path_buf();

        fs::copy(&live, &backup)?;
        debug!("Backed up {:?} to {:?}", live, backup);

        // The backup is complete: from here on the guard restores it if anything fails.
        let guard = Self {
            live,
            backup,
            restored: false,
        };

        fs::copy(test_config, &guard.live)?;
        info!("Installed test config {:?} at {:?}", test_config, guard.live);

        Ok(guard)
    }

    /// Copy the backup back over the live config.
    pub fn restore(mut self) -> ShimResult<()> {
        self.restored = true;
        self.copy_back()
    }

    fn copy_back(&self) -> ShimResult<()> {
        fs::copy(&self.backup, &self.live)?;
        debug!("Restored {:?} from {:?}", self.live, self.backup);
        Ok(())
    }
}

impl Drop for ConfigSwap {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(e) = self.copy_back() {
            error!(
                "Failed to restore {:?} from {:?}: {}",
                self.live, self.backup, e
            );
        }
    }
}

/// Parse `path` as YAML and require a non-empty document.
pub fn validate_config(path: &Path) -> ShimResult<()> {
    let invalid = |message: String| ShimError::InvalidTestConfig {
        path: path.to_path_buf(),
        message,
    };

    let content = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let document: Value = serde_yaml::from_str(&content).map_err(|e| invalid(e.to_string()))?;

    if !is_truthy(&document) {
        return Err(invalid("document is empty".to_string()));
    }
    Ok(())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Sequence(seq) => !seq.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => is_truthy(&tagged.value),
    }
}
