//! slidesync core library: page model, image lifecycle, actions, deck files.
//!
//! Public API surface:
//! - [`types`]: newtypes and the [`Page`] descriptor
//! - [`image`]: [`ImageResource`] and its upload state machine
//! - [`action`]: [`Action`], the unit of a reconciliation plan
//! - [`deck`]: load / save YAML deck files
//! - [`config`]: [`SyncConfig`] loading
//! - [`error`]: [`CoreError`]

pub mod action;
pub mod config;
pub mod deck;
pub mod error;
pub mod image;
pub mod types;

pub use action::{Action, ActionKind, ActionSummary};
pub use config::SyncConfig;
pub use error::{CoreError, UploadFailed};
pub use image::{Image, ImageResource, RemoteImageRef, UploadState};
pub use types::{BodyBlock, LayoutId, Page, TextRun};
