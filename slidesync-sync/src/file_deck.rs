//! Remote deck persisted as a YAML deck file.
//!
//! Each mutation reloads the file, applies the action in memory and saves the
//! result atomically, so an interrupted run leaves either the old or the new
//! deck on disk. A missing file is an empty deck.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use slidesync_assets::{AssetError, ImageFetcher};
use slidesync_core::{deck, Action, Image, Page, RemoteImageRef};
use slidesync_reconcile::apply_action;

use crate::error::RemoteError;
use crate::remote::{image_locations, RemoteDeck};

#[derive(Debug)]
pub struct FileDeck {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileDeck {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<Page>, RemoteError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        Ok(deck::load_at(&self.path)?)
    }

    fn mutate(&self, action: Action) -> Result<(), RemoteError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(page) = action.page() {
            image_locations(page)?;
        }
        let mut pages = self.load()?;
        let action = match action {
            Action::Append { page, .. } => Action::Append {
                index: pages.len(),
                page,
            },
            other => other,
        };
        apply_action(&mut pages, &action)?;
        deck::save_at(&self.path, &pages)?;
        tracing::debug!(deck = %self.path.display(), %action, "applied");
        Ok(())
    }
}

impl RemoteDeck for FileDeck {
    fn current_pages(&self) -> Result<Vec<Page>, RemoteError> {
        self.load()
    }

    fn image_refs(&self, index: usize) -> Result<Vec<RemoteImageRef>, RemoteError> {
        let pages = self.load()?;
        let page = pages.get(index).ok_or(RemoteError::NoSuchPage { index })?;
        image_locations(page)
    }

    fn apply_append(&self, page: &Page) -> Result<(), RemoteError> {
        // Landing index is filled in once the file is loaded.
        self.mutate(Action::Append {
            index: 0,
            page: page.clone(),
        })
    }

    fn apply_update(&self, index: usize, page: &Page) -> Result<(), RemoteError> {
        self.mutate(Action::Update {
            index,
            page: page.clone(),
        })
    }

    fn apply_move(&self, from: usize, to: usize) -> Result<(), RemoteError> {
        self.mutate(Action::Move { from, to })
    }

    fn apply_delete(&self, index: usize) -> Result<(), RemoteError> {
        self.mutate(Action::Delete { index })
    }
}

impl ImageFetcher for FileDeck {
    fn fetch_image(&self, image: &RemoteImageRef) -> Result<Image, AssetError> {
        let fetch_err = |reason: String| AssetError::Fetch {
            url: image.url.clone(),
            reason,
        };
        let pages = self.load().map_err(|e| fetch_err(e.to_string()))?;
        pages
            .into_iter()
            .flat_map(|page| page.images)
            .find(|candidate| candidate.location().as_ref() == Some(image))
            .ok_or_else(|| fetch_err(format!("not on deck {}", self.path.display())))
    }
}
