//! Bounded-concurrency preload of images already on the remote deck.
//!
//! Every (page, image) pair becomes a job on a pre-filled queue. A fixed pool
//! of workers drains the queue, calling the blocking fetcher on the blocking
//! thread pool. Results flow back over a channel to the single owner of the
//! result slots, so each slot has exactly one writer. The first failure
//! cancels the remaining workers.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use slidesync_core::{Image, RemoteImageRef};
use tokio::sync::{broadcast, mpsc, Mutex};

use crate::error::AssetError;

/// Instantiates an image that already lives on the remote deck.
pub trait ImageFetcher: Send + Sync {
    fn fetch_image(&self, image: &RemoteImageRef) -> Result<Image, AssetError>;
}

/// Images currently on the remote page at `page_index`.
#[derive(Debug, Clone, PartialEq)]
pub struct PreloadRequest {
    pub page_index: usize,
    pub images: Vec<RemoteImageRef>,
}

/// Preloaded images keyed by remote page index, in on-page order.
#[derive(Debug, Clone, Default)]
pub struct Preloaded {
    pages: BTreeMap<usize, Vec<Image>>,
}

impl Preloaded {
    pub fn page(&self, page_index: usize) -> &[Image] {
        self.pages.get(&page_index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Image on `page_index` with the given content fingerprint.
    pub fn find(&self, page_index: usize, fingerprint: &str) -> Option<&Image> {
        self.page(page_index)
            .iter()
            .find(|image| image.fingerprint() == fingerprint)
    }

    /// Total number of images across all pages.
    pub fn len(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Job {
    page: usize,
    slot: usize,
    reference: RemoteImageRef,
}

struct Fetched {
    page: usize,
    slot: usize,
    image: Image,
}

/// Fetch every requested image using at most `workers` concurrent fetches.
///
/// Requests naming a page that was already requested are ignored. On error
/// the first failure is returned once every worker has stopped.
pub async fn preload<F>(
    fetcher: Arc<F>,
    requests: Vec<PreloadRequest>,
    workers: usize,
) -> Result<Preloaded, AssetError>
where
    F: ImageFetcher + ?Sized + 'static,
{
    let mut seen = HashSet::new();
    let mut slots: BTreeMap<usize, Vec<Option<Image>>> = BTreeMap::new();
    let mut jobs = Vec::new();
    for request in requests {
        if !seen.insert(request.page_index) {
            continue;
        }
        slots.insert(request.page_index, vec![None; request.images.len()]);
        jobs.extend(
            request
                .images
                .into_iter()
                .enumerate()
                .map(|(slot, reference)| Job {
                    page: request.page_index,
                    slot,
                    reference,
                }),
        );
    }

    let total = jobs.len();
    if total > 0 {
        run_pool(fetcher, jobs, workers.clamp(1, total), &mut slots).await?;
    }
    tracing::debug!(pages = slots.len(), images = total, "preload complete");

    let mut pages = BTreeMap::new();
    for (page, images) in slots {
        let images = images
            .into_iter()
            .enumerate()
            .map(|(image, slot)| slot.ok_or(AssetError::MissingResult { page, image }))
            .collect::<Result<Vec<_>, _>>()?;
        pages.insert(page, images);
    }
    Ok(Preloaded { pages })
}

async fn run_pool<F>(
    fetcher: Arc<F>,
    jobs: Vec<Job>,
    workers: usize,
    slots: &mut BTreeMap<usize, Vec<Option<Image>>>,
) -> Result<(), AssetError>
where
    F: ImageFetcher + ?Sized + 'static,
{
    let (job_tx, job_rx) = mpsc::channel(jobs.len());
    for job in jobs {
        // Capacity equals the job count, so this never waits.
        if job_tx.send(job).await.is_err() {
            break;
        }
    }
    drop(job_tx);
    let job_rx = Arc::new(Mutex::new(job_rx));

    let (result_tx, mut result_rx) = mpsc::channel::<Result<Fetched, AssetError>>(workers);
    let (cancel_tx, _) = broadcast::channel::<()>(1);

    let mut handles = Vec::with_capacity(workers);
    for worker in 0..workers {
        let jobs = Arc::clone(&job_rx);
        let results = result_tx.clone();
        let fetcher = Arc::clone(&fetcher);
        let mut cancel = cancel_tx.subscribe();
        handles.push(tokio::spawn(async move {
            loop {
                let job = tokio::select! {
                    biased;
                    _ = cancel.recv() => break,
                    job = next_job(&jobs) => job,
                };
                let Some(job) = job else { break };

                let fetcher = Arc::clone(&fetcher);
                let outcome = tokio::task::spawn_blocking(move || {
                    fetcher.fetch_image(&job.reference).map(|image| Fetched {
                        page: job.page,
                        slot: job.slot,
                        image,
                    })
                })
                .await
                .unwrap_or_else(|e| Err(AssetError::Join(e)));

                let failed = outcome.is_err();
                if results.send(outcome).await.is_err() || failed {
                    break;
                }
            }
            tracing::trace!(worker, "preload worker exiting");
        }));
    }
    drop(result_tx);

    let mut first_error = None;
    while let Some(outcome) = result_rx.recv().await {
        if first_error.is_some() {
            continue;
        }
        let placed = outcome.and_then(|fetched| place(slots, fetched));
        if let Err(err) = placed {
            tracing::warn!(error = %err, "preload failed; cancelling remaining fetches");
            let _ = cancel_tx.send(());
            first_error = Some(err);
        }
    }

    for handle in handles {
        handle.await?;
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

async fn next_job(jobs: &Mutex<mpsc::Receiver<Job>>) -> Option<Job> {
    jobs.lock().await.recv().await
}

fn place(
    slots: &mut BTreeMap<usize, Vec<Option<Image>>>,
    fetched: Fetched,
) -> Result<(), AssetError> {
    let slot = slots
        .get_mut(&fetched.page)
        .and_then(|images| images.get_mut(fetched.slot))
        .ok_or(AssetError::MissingResult {
            page: fetched.page,
            image: fetched.slot,
        })?;
    if slot.is_some() {
        return Err(AssetError::DuplicateResult {
            page: fetched.page,
            image: fetched.slot,
        });
    }
    *slot = Some(fetched.image);
    Ok(())
}
