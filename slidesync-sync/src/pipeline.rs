//! Snapshot, plan and apply in one call.

use std::sync::Arc;

use slidesync_assets::Storage;
use slidesync_core::{Page, SyncConfig};
use slidesync_reconcile::{reconcile_with, Plan, ReconcileOptions};

use crate::error::ExecuteError;
use crate::executor::{execute, ExecuteReport};
use crate::remote::RemoteDeck;

/// Result of a sync run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub plan: Plan,
    /// `None` for dry runs.
    pub executed: Option<ExecuteReport>,
}

/// Bring `remote` in line with `desired`.
///
/// With `dry_run` the plan is computed and returned without touching the
/// remote deck or storage.
pub async fn sync_deck<R, S>(
    remote: Arc<R>,
    storage: Arc<S>,
    desired: &[Page],
    config: &SyncConfig,
    dry_run: bool,
) -> Result<SyncReport, ExecuteError>
where
    R: RemoteDeck + 'static,
    S: Storage + ?Sized + 'static,
{
    let source = Arc::clone(&remote);
    let current = tokio::task::spawn_blocking(move || source.current_pages())
        .await?
        .map_err(ExecuteError::Snapshot)?;

    let options = ReconcileOptions {
        iteration_cap: config.matcher_iteration_cap,
    };
    let plan = reconcile_with(&current, desired, options)?;
    tracing::info!(
        current = current.len(),
        desired = desired.len(),
        actions = plan.len(),
        "planned sync"
    );

    if dry_run {
        for action in plan.iter() {
            tracing::info!("[dry-run] would {action}");
        }
        return Ok(SyncReport {
            plan,
            executed: None,
        });
    }

    let executed = execute(remote, storage, &plan.actions(), config).await?;
    Ok(SyncReport {
        plan,
        executed: Some(executed),
    })
}
