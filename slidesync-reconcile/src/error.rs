//! Error types for slidesync-reconcile.
//!
//! Every variant is a broken invariant: correct call sequencing never
//! produces one. They are returned rather than tolerated so a bad plan never
//! reaches a remote deck.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// The similarity matrix handed to the matcher is not n×n.
    #[error("similarity matrix is not square: {rows} rows but row {row} has {cols} columns")]
    NonSquareMatrix { rows: usize, row: usize, cols: usize },

    /// Adjusted before/after lists (or the assignment) disagree in length.
    #[error("adjusted lists differ in length: {before} before, {after} after")]
    LengthMismatch { before: usize, after: usize },

    /// An action addressed a page that does not exist.
    #[error("index {index} out of range for deck of {len} pages")]
    IndexOutOfRange { index: usize, len: usize },

    /// Any other broken bookkeeping invariant.
    #[error("invariant violated: {0}")]
    Invariant(String),
}
