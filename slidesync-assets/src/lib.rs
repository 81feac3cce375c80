//! # slidesync-assets
//!
//! Image preload and upload for pages being written to a remote deck.
//!
//! - [`preload`] fetches the images already on the pages about to be updated,
//!   over a bounded worker pool, failing fast on the first error.
//! - [`schedule_uploads`] claims every image that still needs storage and
//!   uploads it in the background; readers wait on the image itself.

pub mod error;
pub mod preload;
pub mod storage;
pub mod upload;

pub use error::AssetError;
pub use preload::{preload, ImageFetcher, PreloadRequest, Preloaded};
pub use storage::{upload, DirStorage, Storage};
pub use upload::{schedule_uploads, UploadBatch, UploadRequest};
