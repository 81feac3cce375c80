//! `slidesync apply`: bring a deck file in line with a desired deck.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use slidesync_assets::DirStorage;
use slidesync_sync::{sync_deck, FileDeck, SyncReport};

use super::{load_config, load_deck, plan::print_table};

/// Arguments for `slidesync apply`.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Deck file to update; created if it does not exist.
    pub deck: PathBuf,

    /// Deck as it should be.
    pub desired: PathBuf,

    /// Directory new images are stored in [default: `assets/` next to <deck>].
    #[arg(long)]
    pub storage: Option<PathBuf>,

    /// Show the plan without changing anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl ApplyArgs {
    pub fn run(self) -> Result<()> {
        let config = load_config()?;
        let desired = load_deck(&self.desired)?;
        let storage_dir = self.storage.clone().unwrap_or_else(|| {
            self.deck
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join("assets")
        });

        let remote = Arc::new(FileDeck::new(&self.deck));
        let storage = Arc::new(DirStorage::new(storage_dir));
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;
        let report = runtime
            .block_on(sync_deck(remote, storage, &desired, &config, self.dry_run))
            .with_context(|| format!("apply failed for {}", self.deck.display()))?;

        print_report(&self.deck, &report);
        Ok(())
    }
}

fn print_report(deck: &Path, report: &SyncReport) {
    match &report.executed {
        None => {
            print!("[dry-run] ");
            print_table(&report.plan);
        }
        Some(executed) => {
            print_table(&report.plan);
            if executed.applied > 0 {
                println!(
                    "{} applied {} action(s) to {} ({} image(s) uploaded, {} reused)",
                    "✓".green().bold(),
                    executed.applied,
                    deck.display(),
                    executed.uploads_scheduled,
                    executed.uploads_reused,
                );
            }
        }
    }
}
