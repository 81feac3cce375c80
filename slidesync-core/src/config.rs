//! Sync tuning loaded from `~/.slidesync/config.yaml`.
//!
//! Every function has two forms, as with the deck helpers:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};

pub const DEFAULT_WORKERS: usize = 8;

/// Worker pool sizes and matcher limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Parallel fetches of images already on the remote deck.
    pub preload_workers: usize,
    /// Parallel uploads of new images.
    pub upload_workers: usize,
    /// Overrides the optimal matcher's iteration cap (default `n² + n`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matcher_iteration_cap: Option<usize>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            preload_workers: DEFAULT_WORKERS,
            upload_workers: DEFAULT_WORKERS,
            matcher_iteration_cap: None,
        }
    }
}

impl SyncConfig {
    /// Preload pool size, never below one.
    pub fn preload_workers(&self) -> usize {
        self.preload_workers.max(1)
    }

    /// Upload pool size, never below one.
    pub fn upload_workers(&self) -> usize {
        self.upload_workers.max(1)
    }
}

/// `<home>/.slidesync/config.yaml`, pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".slidesync").join("config.yaml")
}

/// Load the config under `home`. A missing file yields the defaults.
pub fn load_at(home: &Path) -> Result<SyncConfig, CoreError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(SyncConfig::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    if contents.trim().is_empty() {
        return Ok(SyncConfig::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| CoreError::Parse { path, source: e })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<SyncConfig, CoreError> {
    load_at(&home()?)
}

fn home() -> Result<PathBuf, CoreError> {
    dirs::home_dir().ok_or(CoreError::HomeNotFound)
}
