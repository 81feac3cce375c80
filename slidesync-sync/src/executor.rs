//! Plan execution against a remote deck.
//!
//! ## `execute` protocol
//!
//! 1. Check the action list is in phase order (Append, Update, Delete from
//!    the highest index down, Move). Nothing is sent if it is not.
//! 2. Log the plan.
//! 3. Preload the images currently on every remote page an Update targets.
//!    Any failure aborts before the first remote mutation.
//! 4. Schedule uploads for images on Append and Update payloads. Images whose
//!    fingerprint matches a preloaded image on the same page reuse it.
//! 5. Apply actions one at a time, in order. Before an Append or Update is
//!    sent, every image on its page is awaited; a failed upload aborts that
//!    action. The first failure stops execution; applied actions stay applied.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use slidesync_assets::{
    preload, schedule_uploads, PreloadRequest, Preloaded, Storage, UploadRequest,
};
use slidesync_core::{Action, ActionKind, SyncConfig};

use crate::error::{ExecuteError, RemoteError};
use crate::remote::{apply, RemoteDeck};

/// Outcome of a completed execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecuteReport {
    pub applied: usize,
    pub images_preloaded: usize,
    pub uploads_scheduled: usize,
    pub uploads_reused: usize,
    pub finished_at: DateTime<Utc>,
}

/// Apply `actions` to `remote`, uploading new images to `storage`.
pub async fn execute<R, S>(
    remote: Arc<R>,
    storage: Arc<S>,
    actions: &[Action],
    config: &SyncConfig,
) -> Result<ExecuteReport, ExecuteError>
where
    R: RemoteDeck + 'static,
    S: Storage + ?Sized + 'static,
{
    check_phase_order(actions)?;
    log_plan(actions);

    let updated: Vec<usize> = actions
        .iter()
        .filter_map(|action| match action {
            Action::Update { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    let preloaded = if updated.is_empty() {
        Preloaded::default()
    } else {
        let source = Arc::clone(&remote);
        let requests = tokio::task::spawn_blocking(move || preload_requests(&*source, &updated))
            .await?
            .map_err(ExecuteError::Snapshot)?;
        preload(Arc::clone(&remote), requests, config.preload_workers())
            .await
            .map_err(ExecuteError::Preload)?
    };

    let uploads: Vec<UploadRequest> = actions
        .iter()
        .filter_map(|action| match action {
            Action::Append { page, .. } => Some(UploadRequest {
                page_index: None,
                images: page.images.clone(),
            }),
            Action::Update { index, page } => Some(UploadRequest {
                page_index: Some(*index),
                images: page.images.clone(),
            }),
            _ => None,
        })
        .collect();
    let batch = schedule_uploads(storage, &uploads, &preloaded, config.upload_workers());

    for (position, action) in actions.iter().enumerate() {
        let kind = action.kind();
        let index = action.index();
        if let Some(page) = action.page() {
            for image in &page.images {
                image.wait().await.map_err(|source| ExecuteError::Asset {
                    position,
                    kind,
                    index,
                    source,
                })?;
            }
        }

        let target = Arc::clone(&remote);
        let call = action.clone();
        let outcome = tokio::task::spawn_blocking(move || apply(&*target, &call)).await?;
        if let Err(source) = outcome {
            tracing::error!(position, %action, error = %source, "remote call failed; stopping");
            return Err(ExecuteError::Action {
                position,
                kind,
                index,
                source,
            });
        }
        tracing::debug!(position, %action, "applied");
    }

    let report = ExecuteReport {
        applied: actions.len(),
        images_preloaded: preloaded.len(),
        uploads_scheduled: batch.scheduled(),
        uploads_reused: batch.adopted(),
        finished_at: Utc::now(),
    };
    tracing::info!(
        applied = report.applied,
        uploads = report.uploads_scheduled,
        reused = report.uploads_reused,
        "plan executed"
    );
    Ok(report)
}

/// Image references for every updated page that already exists remotely.
///
/// Update indices past the current deck name pages appended by the same plan;
/// they have nothing to preload.
fn preload_requests<R: RemoteDeck + ?Sized>(
    remote: &R,
    updated: &[usize],
) -> Result<Vec<PreloadRequest>, RemoteError> {
    let existing = remote.current_pages()?.len();
    updated
        .iter()
        .filter(|&&index| index < existing)
        .map(|&index| {
            Ok(PreloadRequest {
                page_index: index,
                images: remote.image_refs(index)?,
            })
        })
        .collect()
}

fn check_phase_order(actions: &[Action]) -> Result<(), ExecuteError> {
    for (position, pair) in actions.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        let regressed = next.kind() < prev.kind();
        let deletes_ascend = next.kind() == ActionKind::Delete
            && prev.kind() == ActionKind::Delete
            && next.index() >= prev.index();
        if regressed || deletes_ascend {
            return Err(ExecuteError::OutOfOrder {
                position: position + 1,
                kind: next.kind(),
            });
        }
    }
    Ok(())
}

fn log_plan(actions: &[Action]) {
    if actions.is_empty() {
        tracing::info!("plan is empty; deck already matches");
        return;
    }
    tracing::info!("applying {} action(s)", actions.len());
    for (position, action) in actions.iter().enumerate() {
        tracing::info!("  {position:>3}. {action}");
    }
}
