//! In-memory remote deck.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use slidesync_assets::{AssetError, ImageFetcher};
use slidesync_core::{Action, Image, Page, RemoteImageRef};
use slidesync_reconcile::apply_action;

use crate::error::RemoteError;
use crate::remote::{image_locations, RemoteDeck};

/// A remote deck held in memory, with a log of every applied action.
///
/// `failing_at(n)` makes the n-th mutation call (0-based) fail, which is how
/// tests exercise mid-plan failures.
#[derive(Debug, Default)]
pub struct MemoryDeck {
    pages: Mutex<Vec<Page>>,
    log: Mutex<Vec<Action>>,
    calls: AtomicUsize,
    fetches: AtomicUsize,
    fail_at: Option<usize>,
}

impl MemoryDeck {
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            pages: Mutex::new(pages),
            ..Self::default()
        }
    }

    pub fn failing_at(mut self, call: usize) -> Self {
        self.fail_at = Some(call);
        self
    }

    pub fn pages(&self) -> Vec<Page> {
        lock(&self.pages).clone()
    }

    /// Actions applied so far, in order.
    pub fn log(&self) -> Vec<Action> {
        lock(&self.log).clone()
    }

    /// Number of images instantiated through [`ImageFetcher`].
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn mutate(&self, action: Action) -> Result<(), RemoteError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == Some(call) {
            return Err(RemoteError::Rejected {
                operation: action.kind(),
                reason: format!("injected failure on call {call}"),
            });
        }
        if let Some(page) = action.page() {
            image_locations(page)?;
        }
        apply_action(&mut lock(&self.pages), &action)?;
        lock(&self.log).push(action);
        Ok(())
    }
}

impl RemoteDeck for MemoryDeck {
    fn current_pages(&self) -> Result<Vec<Page>, RemoteError> {
        Ok(self.pages())
    }

    fn image_refs(&self, index: usize) -> Result<Vec<RemoteImageRef>, RemoteError> {
        let pages = lock(&self.pages);
        let page = pages.get(index).ok_or(RemoteError::NoSuchPage { index })?;
        image_locations(page)
    }

    fn apply_append(&self, page: &Page) -> Result<(), RemoteError> {
        let index = lock(&self.pages).len();
        self.mutate(Action::Append {
            index,
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

impl ImageFetcher for MemoryDeck {
    fn fetch_image(&self, image: &RemoteImageRef) -> Result<Image, AssetError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        lock(&self.pages)
            .iter()
            .flat_map(|page| page.images.iter())
            .find(|candidate| candidate.location().as_ref() == Some(image))
            .map(Arc::clone)
            .ok_or_else(|| AssetError::Fetch {
                url: image.url.clone(),
                reason: "no such image on the deck".to_string(),
            })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
