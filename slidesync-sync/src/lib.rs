//! # slidesync-sync
//!
//! Applying reconciliation plans to a remote deck.
//!
//! A remote is anything implementing [`RemoteDeck`]: [`MemoryDeck`] keeps the
//! pages in memory, [`FileDeck`] persists them as a YAML deck file. Call
//! [`execute`] to apply a plan, or [`sync_deck`] to snapshot, plan and apply in
//! one step.

pub mod error;
pub mod executor;
pub mod file_deck;
pub mod memory;
pub mod pipeline;
pub mod remote;

pub use error::{ExecuteError, RemoteError};
pub use executor::{execute, ExecuteReport};
pub use file_deck::FileDeck;
pub use memory::MemoryDeck;
pub use pipeline::{sync_deck, SyncReport};
pub use remote::RemoteDeck;
