//! The remote deck collaborator.

use slidesync_assets::ImageFetcher;
use slidesync_core::{Action, Page, RemoteImageRef};

use crate::error::RemoteError;

/// A live deck addressed by page index.
///
/// Every call is blocking and atomic from the caller's point of view; the
/// executor runs them on the blocking thread pool, one at a time. Pages passed
/// to `apply_append` and `apply_update` only carry uploaded images.
pub trait RemoteDeck: ImageFetcher {
    /// Snapshot of the pages currently on the deck, in order.
    fn current_pages(&self) -> Result<Vec<Page>, RemoteError>;

    /// Locations of the images currently on page `index`.
    fn image_refs(&self, index: usize) -> Result<Vec<RemoteImageRef>, RemoteError>;

    fn apply_append(&self, page: &Page) -> Result<(), RemoteError>;
    fn apply_update(&self, index: usize, page: &Page) -> Result<(), RemoteError>;
    fn apply_move(&self, from: usize, to: usize) -> Result<(), RemoteError>;
    fn apply_delete(&self, index: usize) -> Result<(), RemoteError>;
}

/// Dispatch one action to the matching remote call.
pub fn apply<R: RemoteDeck + ?Sized>(remote: &R, action: &Action) -> Result<(), RemoteError> {
    match action {
        Action::Append { page, .. } => remote.apply_append(page),
        Action::Update { index, page } => remote.apply_update(*index, page),
        Action::Delete { index } => remote.apply_delete(*index),
        Action::Move { from, to } => remote.apply_move(*from, *to),
    }
}

/// Locations of every image on `page`, failing on the first local one.
pub fn image_locations(page: &Page) -> Result<Vec<RemoteImageRef>, RemoteError> {
    page.images
        .iter()
        .map(|image| {
            image.location().ok_or_else(|| RemoteError::ImageNotUploaded {
                fingerprint: image.fingerprint().to_string(),
            })
        })
        .collect()
}
