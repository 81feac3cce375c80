//! Background uploads for images on pages about to be written.
//!
//! Scheduling is synchronous: every image that still needs storage is either
//! matched against a preloaded image with the same fingerprint (and adopts its
//! location without an upload) or claimed with `begin_upload`. The first
//! claimed image of each fingerprint is queued; later images with the same
//! content follow it and take its location, so a picture used on several
//! pages is uploaded once even when each page loaded its own copy.
//! The uploads themselves run on a detached worker pool; consumers wait on
//! each image's own state rather than on the pool.

use std::collections::HashMap;
use std::sync::Arc;

use slidesync_core::Image;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::error::AssetError;
use crate::preload::Preloaded;
use crate::storage::{upload, Storage};

/// Images of one page that is about to be appended or updated.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Remote page being replaced, for updates. Its preloaded images are
    /// checked for identical content before anything is uploaded.
    pub page_index: Option<usize>,
    pub images: Vec<Image>,
}

/// Handle to the uploads started by [`schedule_uploads`].
#[derive(Debug)]
pub struct UploadBatch {
    scheduled: usize,
    adopted: usize,
    handle: Option<JoinHandle<()>>,
}

impl UploadBatch {
    /// Number of images queued for upload.
    pub fn scheduled(&self) -> usize {
        self.scheduled
    }

    /// Number of images that reused an identical image instead of uploading:
    /// one already on the remote page, or one queued earlier in this batch.
    pub fn adopted(&self) -> usize {
        self.adopted
    }

    /// Wait for the whole pool to drain.
    ///
    /// Writers do not need this; they wait on each image they are about to send.
    pub async fn join(self) -> Result<(), AssetError> {
        if let Some(handle) = self.handle {
            handle.await?;
        }
        Ok(())
    }
}

/// Claim and start uploading every image in `requests` that needs storage.
///
/// Must be called from within a tokio runtime.
pub fn schedule_uploads<S>(
    storage: Arc<S>,
    requests: &[UploadRequest],
    preloaded: &Preloaded,
    workers: usize,
) -> UploadBatch
where
    S: Storage + ?Sized + 'static,
{
    let mut queue = Vec::new();
    let mut leaders: HashMap<&str, &Image> = HashMap::new();
    let mut followers = Vec::new();
    let mut adopted = 0;
    for request in requests {
        for image in &request.images {
            if !image.needs_upload() {
                continue;
            }
            let existing = request
                .page_index
                .and_then(|page| preloaded.find(page, image.fingerprint()))
                .and_then(|found| found.location());
            if let Some(location) = existing {
                if image.adopt(location) {
                    tracing::debug!(fingerprint = image.fingerprint(), "reusing remote image");
                    adopted += 1;
                }
                continue;
            }
            if !image.begin_upload() {
                continue;
            }
            match leaders.get(image.fingerprint()) {
                Some(&leader) => {
                    followers.push((Arc::clone(leader), Arc::clone(image)));
                    adopted += 1;
                }
                None => {
                    leaders.insert(image.fingerprint(), image);
                    queue.push(Arc::clone(image));
                }
            }
        }
    }

    let scheduled = queue.len();
    tracing::info!(scheduled, adopted, "scheduled image uploads");
    let handle = (scheduled > 0).then(|| {
        tokio::spawn(async move {
            let waiting: Vec<_> = followers
                .into_iter()
                .map(|(leader, follower)| tokio::spawn(follow(leader, follower)))
                .collect();
            run_uploads(storage, queue, workers.clamp(1, scheduled)).await;
            for handle in waiting {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "image follower failed");
                }
            }
        })
    });
    UploadBatch {
        scheduled,
        adopted,
        handle,
    }
}

/// Give `follower` the outcome of the upload of identical `leader`.
async fn follow(leader: Image, follower: Image) {
    let outcome = leader.wait().await.map_err(|failed| failed.reason);
    follower.finish(outcome);
}

async fn run_uploads<S>(storage: Arc<S>, queue: Vec<Image>, workers: usize)
where
    S: Storage + ?Sized + 'static,
{
    let (tx, rx) = mpsc::channel(queue.len());
    for image in queue {
        if tx.send(image).await.is_err() {
            break;
        }
    }
    drop(tx);
    let rx = Arc::new(Mutex::new(rx));

    let mut handles = Vec::with_capacity(workers);
    for worker in 0..workers {
        let rx = Arc::clone(&rx);
        let storage = Arc::clone(&storage);
        handles.push(tokio::spawn(async move {
            loop {
                let next = rx.lock().await.recv().await;
                let Some(image) = next else { break };
                upload_one(Arc::clone(&storage), image).await;
            }
            tracing::trace!(worker, "upload worker exiting");
        }));
    }
    for handle in handles {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "upload worker failed");
        }
    }
}

async fn upload_one<S>(storage: Arc<S>, image: Image)
where
    S: Storage + ?Sized + 'static,
{
    let task_image = Arc::clone(&image);
    let outcome = tokio::task::spawn_blocking(move || {
        upload(&*storage, task_image.bytes(), task_image.mime_type())
    })
    .await;
    let outcome = match outcome {
        Ok(Ok(location)) => {
            tracing::debug!(fingerprint = image.fingerprint(), id = %location.id, "uploaded image");
            Ok(location)
        }
        Ok(Err(e)) => Err(e.to_string()),
        Err(e) => Err(format!("upload task failed: {e}")),
    };
    if let Err(reason) = &outcome {
        tracing::warn!(fingerprint = image.fingerprint(), %reason, "image upload failed");
    }
    image.finish(outcome);
}
