//! # slidesync-reconcile
//!
//! Pure computation of the actions that turn a live deck into a desired one.
//!
//! ```text
//! pages ─▶ adjust (pad shorter side) ─▶ similarity matrix ─▶ assignment
//!       ─▶ synthesize (append / update / delete) ─▶ sequence moves ─▶ Plan
//! ```
//!
//! Call [`reconcile`] for a [`Plan`]; [`simulate`] replays a plan in memory.

pub mod adjust;
pub mod entry;
pub mod error;
pub mod matcher;
pub mod moves;
pub mod plan;
pub mod score;
pub mod synth;

use slidesync_core::Page;

pub use entry::Entry;
pub use error::ReconcileError;
pub use plan::{apply_action, simulate, Plan};
pub use score::{score, Score, MAX_SCORE};

/// Knobs for a reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Overrides the matcher's iteration cap.
    pub iteration_cap: Option<usize>,
}

/// Plan the actions turning `before` into `after`.
pub fn reconcile(before: &[Page], after: &[Page]) -> Result<Plan, ReconcileError> {
    reconcile_with(before, after, ReconcileOptions::default())
}

pub fn reconcile_with(
    before: &[Page],
    after: &[Page],
    options: ReconcileOptions,
) -> Result<Plan, ReconcileError> {
    let after = resolve_frozen(before, after);
    if before.is_empty() && after.is_empty() {
        return Ok(Plan::default());
    }

    let adjusted = adjust::adjust(before, &after);
    let weights = matcher::similarity_matrix(&adjusted.before, &adjusted.after);
    let assignment = matcher::solve(&weights, options.iteration_cap)?;
    let synthesis = synth::synthesize(&adjusted, &assignment.pairs)?;
    let moves = moves::sequence(&synthesis.survivors)?;

    let plan = Plan {
        appends: synthesis.appends,
        updates: synthesis.updates,
        deletes: synthesis.deletes,
        moves,
        optimal: assignment.optimal,
    };
    tracing::debug!(
        before = before.len(),
        after = after.len(),
        appends = plan.appends.len(),
        updates = plan.updates.len(),
        deletes = plan.deletes.len(),
        moves = plan.moves.len(),
        optimal = plan.optimal,
        matcher_iterations = assignment.iterations,
        "reconciled deck"
    );
    Ok(plan)
}

/// Frozen desired pages take whatever the live deck shows at the same index.
fn resolve_frozen(before: &[Page], after: &[Page]) -> Vec<Page> {
    after
        .iter()
        .enumerate()
        .map(|(i, page)| match before.get(i) {
            Some(current) if page.freeze => current.clone(),
            _ => page.clone(),
        })
        .collect()
}
