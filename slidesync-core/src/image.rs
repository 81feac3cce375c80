//! Image resources and their upload lifecycle.
//!
//! ```text
//! Pending ──begin_upload──▶ Uploading ──finish──▶ Uploaded(url, id)
//!    │                                   └──────▶ Failed(reason)
//!    └──────adopt──────────▶ Uploaded(url, id)
//! ```
//!
//! State lives in a `tokio::sync::watch` channel. Every transition is a
//! compare-and-set, so only the caller that wins `begin_upload` (or `adopt`)
//! ever writes a terminal state. Readers call [`ImageResource::wait`] and are
//! woken once a terminal state is published.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::watch;

use crate::error::UploadFailed;

/// Shared handle to an image. Pages that show the same picture share one resource.
pub type Image = Arc<ImageResource>;

/// Where an uploaded image lives on the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteImageRef {
    pub url: String,
    pub id: String,
}

/// Upload lifecycle of an [`ImageResource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Pending,
    Uploading,
    Uploaded(RemoteImageRef),
    Failed(String),
}

impl UploadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Uploaded(_) | UploadState::Failed(_))
    }
}

/// Binary image content plus its fingerprint and upload state.
pub struct ImageResource {
    bytes: Vec<u8>,
    mime_type: String,
    fingerprint: String,
    state: watch::Sender<UploadState>,
}

impl ImageResource {
    /// A local image that still has to be uploaded.
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Image {
        let fingerprint = fingerprint(&bytes);
        Self::build(bytes, mime_type.into(), fingerprint, UploadState::Pending)
    }

    /// An image already present on the remote side.
    pub fn uploaded(bytes: Vec<u8>, mime_type: impl Into<String>, location: RemoteImageRef) -> Image {
        let fingerprint = fingerprint(&bytes);
        Self::build(
            bytes,
            mime_type.into(),
            fingerprint,
            UploadState::Uploaded(location),
        )
    }

    /// A remote image known only by a previously recorded fingerprint.
    ///
    /// Carries no bytes, so it can never be uploaded again.
    pub fn remote(
        fingerprint: impl Into<String>,
        mime_type: impl Into<String>,
        location: RemoteImageRef,
    ) -> Image {
        Self::build(
            Vec::new(),
            mime_type.into(),
            fingerprint.into(),
            UploadState::Uploaded(location),
        )
    }

    fn build(bytes: Vec<u8>, mime_type: String, fingerprint: String, state: UploadState) -> Image {
        let (state, _) = watch::channel(state);
        Arc::new(Self {
            bytes,
            mime_type,
            fingerprint,
            state,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> UploadState {
        self.state.borrow().clone()
    }

    /// Remote location, if the image has reached `Uploaded`.
    pub fn location(&self) -> Option<RemoteImageRef> {
        match &*self.state.borrow() {
            UploadState::Uploaded(location) => Some(location.clone()),
            _ => None,
        }
    }

    /// Whether this image still has to be sent to storage.
    pub fn needs_upload(&self) -> bool {
        matches!(*self.state.borrow(), UploadState::Pending)
    }

    /// `Pending → Uploading`. Returns `true` only for the caller that made the
    /// transition; that caller becomes the sole writer of the terminal state.
    pub fn begin_upload(&self) -> bool {
        self.state.send_if_modified(|state| {
            if matches!(state, UploadState::Pending) {
                *state = UploadState::Uploading;
                true
            } else {
                false
            }
        })
    }

    /// `Pending → Uploaded` without an upload, reusing an identical remote image.
    pub fn adopt(&self, location: RemoteImageRef) -> bool {
        self.state.send_if_modified(|state| {
            if matches!(state, UploadState::Pending) {
                *state = UploadState::Uploaded(location);
                true
            } else {
                false
            }
        })
    }

    /// `Uploading → Uploaded | Failed`. Ignored unless the image is uploading.
    pub fn finish(&self, outcome: Result<RemoteImageRef, String>) -> bool {
        self.state.send_if_modified(|state| {
            if !matches!(state, UploadState::Uploading) {
                return false;
            }
            *state = match outcome {
                Ok(location) => UploadState::Uploaded(location),
                Err(reason) => UploadState::Failed(reason),
            };
            true
        })
    }

    /// Block until the image reaches a terminal state.
    pub async fn wait(&self) -> Result<RemoteImageRef, UploadFailed> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(UploadState::is_terminal)
            .await
            .map(|state| state.clone())
            .map_err(|_| self.failure("image state channel closed"))?;
        match state {
            UploadState::Uploaded(location) => Ok(location),
            UploadState::Failed(reason) => Err(self.failure(reason)),
            other => Err(self.failure(format!("left in state {other:?}"))),
        }
    }

    fn failure(&self, reason: impl Into<String>) -> UploadFailed {
        UploadFailed {
            fingerprint: self.fingerprint.clone(),
            reason: reason.into(),
        }
    }
}

impl fmt::Debug for ImageResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageResource")
            .field("fingerprint", &self.fingerprint)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .field("state", &*self.state.borrow())
            .finish()
    }
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// MIME type guessed from a file extension.
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// `file://` URL for a local path.
pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Local path named by a `file://` URL.
pub fn file_url_path(url: &str) -> Option<PathBuf> {
    url.strip_prefix("file://").map(PathBuf::from)
}

/// File extension for a MIME type, used when naming stored objects.
pub fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
