//! Error types for slidesync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from deck file and configuration handling.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`; cannot locate `~/.slidesync/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// The deck file did not exist at the expected path.
    #[error("deck not found at {path}")]
    DeckNotFound { path: PathBuf },

    /// An image record names neither a local path nor a usable remote location.
    #[error("invalid image record in {path}: {reason}")]
    InvalidImage { path: PathBuf, reason: String },

    /// A page cannot be persisted because one of its images has no remote location yet.
    #[error("image {fingerprint} has not been uploaded")]
    ImageNotUploaded { fingerprint: String },
}

/// Terminal failure recorded on an [`crate::ImageResource`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("upload of image {fingerprint} failed: {reason}")]
pub struct UploadFailed {
    pub fingerprint: String,
    pub reason: String,
}

/// Convenience constructor for [`CoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
