//! Action synthesis from an assignment over adjusted lists.
//!
//! Indices are physical: original pages keep their position, appended pages
//! land after them in append order. Deletes run from the highest index down,
//! and every later index is shifted as each delete is recorded, so the
//! survivors handed to the move sequencer are numbered against the deck as it
//! looks after the delete phase.

use slidesync_core::Action;

use crate::adjust::Adjusted;
use crate::entry::Entry;
use crate::error::ReconcileError;

/// A surviving page after the delete phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Survivor {
    /// Position in the deck once deletes have run.
    pub position: usize,
    /// Position the page must end up at.
    pub target: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Synthesis {
    pub appends: Vec<Action>,
    pub updates: Vec<Action>,
    pub deletes: Vec<Action>,
    pub survivors: Vec<Survivor>,
}

struct Slot {
    physical: usize,
    target: Option<usize>,
    removed: bool,
}

pub fn synthesize(adjusted: &Adjusted, pairs: &[usize]) -> Result<Synthesis, ReconcileError> {
    let before = &adjusted.before;
    let after = &adjusted.after;
    if before.len() != after.len() || pairs.len() != before.len() {
        return Err(ReconcileError::LengthMismatch {
            before: before.len(),
            after: after.len().min(pairs.len()),
        });
    }

    // Position of each after entry once removal padding is stripped.
    let mut cleaned = vec![None; after.len()];
    let mut next = 0;
    for (j, entry) in after.iter().enumerate() {
        if !entry.is_removed() {
            cleaned[j] = Some(next);
            next += 1;
        }
    }

    let originals = before.iter().filter(|e| matches!(e, Entry::Kept(_))).count();
    let (mut kept_seen, mut new_seen) = (0, 0);
    let mut out = Synthesis::default();
    let mut slots = Vec::with_capacity(before.len());

    for (i, entry) in before.iter().enumerate() {
        let j = pairs[i];
        let target = after.get(j).ok_or(ReconcileError::IndexOutOfRange {
            index: j,
            len: after.len(),
        })?;
        let removed = target.is_removed();

        let physical = match entry {
            Entry::Kept(_) => {
                kept_seen += 1;
                kept_seen - 1
            }
            Entry::New(page) => {
                if removed {
                    return Err(ReconcileError::Invariant(format!(
                        "appended page {i} paired with a removal placeholder"
                    )));
                }
                let physical = originals + new_seen;
                new_seen += 1;
                out.appends.push(Action::Append {
                    index: physical,
                    page: page.clone(),
                });
                physical
            }
            Entry::Removed(_) => {
                return Err(ReconcileError::Invariant(format!(
                    "removal placeholder on the before side at {i}"
                )));
            }
        };

        if !removed && entry.page() != target.page() {
            out.updates.push(Action::Update {
                index: physical,
                page: target.page().clone(),
            });
        }
        slots.push(Slot {
            physical,
            target: cleaned[j],
            removed,
        });
    }
    out.updates.sort_by_key(Action::index);

    let mut doomed: Vec<usize> = (0..slots.len()).filter(|&k| slots[k].removed).collect();
    doomed.sort_by_key(|&k| std::cmp::Reverse(slots[k].physical));
    for k in doomed {
        let index = slots[k].physical;
        out.deletes.push(Action::Delete { index });
        for slot in slots.iter_mut().filter(|s| s.physical > index) {
            slot.physical -= 1;
        }
    }

    for slot in slots.iter().filter(|s| !s.removed) {
        let target = slot.target.ok_or_else(|| {
            ReconcileError::Invariant(format!("surviving page {} has no target", slot.physical))
        })?;
        out.survivors.push(Survivor {
            position: slot.physical,
            target,
        });
    }
    out.survivors.sort_by_key(|s| s.position);
    Ok(out)
}
