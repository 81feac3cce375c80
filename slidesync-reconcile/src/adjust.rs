//! Count adjustment: pad the shorter side so the matcher sees a square problem.
//!
//! Padding is always drawn from the *least* similar pages of the longer side:
//! removal placeholders are clones of before pages, new entries are spliced
//! into the before list at their after index.

use slidesync_core::Page;

use crate::entry::Entry;
use crate::score::{score, Score};

/// Before/after lists of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjusted {
    pub before: Vec<Entry>,
    pub after: Vec<Entry>,
}

pub fn adjust(before: &[Page], after: &[Page]) -> Adjusted {
    let mut adjusted = Adjusted {
        before: before.iter().cloned().map(Entry::Kept).collect(),
        after: after.iter().cloned().map(Entry::Kept).collect(),
    };

    if after.len() < before.len() {
        let totals: Vec<Score> = before
            .iter()
            .map(|b| after.iter().map(|a| score(b, a)).sum())
            .collect();
        for idx in least_similar(&totals, before.len() - after.len()) {
            adjusted.after.push(Entry::Removed(before[idx].clone()));
        }
    } else if before.len() < after.len() {
        let totals: Vec<Score> = after
            .iter()
            .map(|a| before.iter().map(|b| score(b, a)).sum())
            .collect();
        for idx in least_similar(&totals, after.len() - before.len()) {
            let at = idx.min(adjusted.before.len());
            adjusted.before.insert(at, Entry::New(after[idx].clone()));
        }
    }

    tracing::debug!(
        before = before.len(),
        after = after.len(),
        padded_to = adjusted.before.len(),
        "adjusted page counts"
    );
    adjusted
}

/// Indices of the `count` lowest totals, ties by index, returned ascending.
fn least_similar(totals: &[Score], count: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..totals.len()).collect();
    order.sort_by_key(|&i| totals[i]);
    let mut chosen: Vec<usize> = order.into_iter().take(count).collect();
    chosen.sort_unstable();
    chosen
}
