//! Error types for slidesync-assets.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The storage backend rejected an operation.
    #[error("storage error: {0}")]
    Storage(String),

    /// An image already on the remote deck could not be instantiated.
    #[error("failed to fetch image {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// A worker task panicked or was aborted.
    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Two results arrived for the same (page, image) slot.
    #[error("preload slot ({page}, {image}) written twice")]
    DuplicateResult { page: usize, image: usize },

    /// A preload slot was never filled.
    #[error("preload slot ({page}, {image}) never filled")]
    MissingResult { page: usize, image: usize },
}

/// Convenience constructor for [`AssetError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> AssetError {
    AssetError::Io {
        path: path.into(),
        source,
    }
}
