//! Runtime configuration.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. built-in defaults,
//! 2. an optional JSON file (by convention `~/.apool/config.json`),
//! 3. `APOOL_*` environment variables.
//!
//! ```json
//! { "workers": 8, "poll_interval_ms": 5000, "state_file": "/path/pool.json", "identity": "alice" }
//! ```
//!
//! Every key is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::account::DEFAULT_WORKERS;
use crate::error::{PoolError, Result};
use crate::provision::DEFAULT_POLL_INTERVAL;

const ENV_WORKERS: &str = "APOOL_WORKERS";
const ENV_STATE_FILE: &str = "APOOL_STATE";
const ENV_IDENTITY: &str = "APOOL_IDENTITY";

/// Effective configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Concurrent workers for bulk account operations.
    pub workers: usize,
    /// Delay between provisioning status checks, in milliseconds.
    pub poll_interval_ms: u64,
    /// Local pool state file. `None` means `<home>/.apool/pool.json`.
    pub state_file: Option<PathBuf>,
    /// Identity substituted for `me` in account specs and used as owner.
    pub identity: Option<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            state_file: None,
            identity: None,
        }
    }
}

impl PoolConfig {
    /// Load `path` if it exists, falling back to defaults, then apply
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Config` if the file exists but cannot be read or
    /// parsed, or if an override is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?.unwrap_or_default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a config file. `Ok(None)` when the file does not exist.
    pub fn from_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PoolError::Config(format!("failed to read {}: {e}", path.display())))?;
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| PoolError::Config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// [`PoolConfig::load`]).
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = var(ENV_WORKERS) {
            self.workers = v
                .trim()
                .parse()
                .map_err(|_| PoolError::Config(format!("{ENV_WORKERS}={v:?} is not a number")))?;
        }
        if let Some(v) = var(ENV_STATE_FILE) {
            self.state_file = Some(PathBuf::from(v));
        }
        if let Some(v) = var(ENV_IDENTITY) {
            self.identity = Some(v);
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Configured identity, else `$USER`, else empty (matches no `me`).
    pub fn identity_or_user(&self) -> String {
        self.identity
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_default()
    }
}
