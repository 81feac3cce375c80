//! Error types for slidesync-sync.

use thiserror::Error;

use slidesync_assets::AssetError;
use slidesync_core::{ActionKind, CoreError, UploadFailed};
use slidesync_reconcile::ReconcileError;

/// Failure of a single remote call.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The remote refused the mutation.
    #[error("remote rejected {operation}: {reason}")]
    Rejected { operation: ActionKind, reason: String },

    /// A page written to the remote still references a local image.
    #[error("page references image {fingerprint} that has not been uploaded")]
    ImageNotUploaded { fingerprint: String },

    /// An index did not address a page of the remote deck.
    #[error("remote deck has no page {index}")]
    NoSuchPage { index: usize },

    /// The deck model rejected the mutation.
    #[error(transparent)]
    Model(#[from] ReconcileError),

    /// Reading or writing persisted deck state failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Failure of a plan execution or sync run.
///
/// Action-level variants carry the action's position in the plan; actions
/// before that position were applied and are not rolled back.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The action list does not follow Append, Update, Delete, Move order.
    #[error("action {position} ({kind}) is out of phase order")]
    OutOfOrder { position: usize, kind: ActionKind },

    /// The remote deck could not be read.
    #[error("failed to read remote deck: {0}")]
    Snapshot(#[source] RemoteError),

    /// Images on updated pages could not be preloaded; nothing was applied.
    #[error("image preload failed: {0}")]
    Preload(#[source] AssetError),

    /// A remote mutation failed.
    #[error("action {position} ({kind} #{index}) failed: {source}")]
    Action {
        position: usize,
        kind: ActionKind,
        index: usize,
        #[source]
        source: RemoteError,
    },

    /// An image referenced by an Append or Update failed to upload.
    #[error("action {position} ({kind} #{index}) aborted: {source}")]
    Asset {
        position: usize,
        kind: ActionKind,
        index: usize,
        #[source]
        source: UploadFailed,
    },

    /// A blocking remote call panicked.
    #[error("remote call task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Planning failed.
    #[error("planning failed: {0}")]
    Reconcile(#[from] ReconcileError),
}

impl ExecuteError {
    /// Plan position of the failed action, for action-level failures.
    pub fn position(&self) -> Option<usize> {
        match self {
            ExecuteError::OutOfOrder { position, .. }
            | ExecuteError::Action { position, .. }
            | ExecuteError::Asset { position, .. } => Some(*position),
            _ => None,
        }
    }
}
