pub mod apply;
pub mod plan;

use std::path::Path;

use anyhow::{Context, Result};
use slidesync_core::{config, deck, Page, SyncConfig};

/// Sync tuning from `~/.slidesync/config.yaml`.
pub fn load_config() -> Result<SyncConfig> {
    config::load().context("failed to load ~/.slidesync/config.yaml")
}

/// Pages of the deck at `path`.
pub fn load_deck(path: &Path) -> Result<Vec<Page>> {
    deck::load_at(path).with_context(|| format!("failed to load deck {}", path.display()))
}
