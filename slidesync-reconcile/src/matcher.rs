//! Maximum-weight bipartite assignment (Hungarian method) with a bounded
//! retry loop and a greedy fallback.
//!
//! Weights are turned into costs by subtracting them from the matrix maximum.
//! After row and column reduction the solver looks for a perfect matching on
//! zero cells; when none exists it takes a minimum line cover (König), shifts
//! the smallest uncovered cost and tries again. Each shift either grows the
//! matching or extends the cover, so `n² + n` rounds always suffice; the cap
//! exists so that a bad input can never spin forever.

use crate::entry::Entry;
use crate::error::ReconcileError;
use crate::score::{score_at, Score};

/// Row `i` of the before list is paired with column `pairs[i]` of the after list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub pairs: Vec<usize>,
    /// `false` when the iteration cap was hit and the greedy fallback was used.
    pub optimal: bool,
    pub iterations: usize,
}

/// n×n weights for adjusted lists, including the position tie-breaker.
pub fn similarity_matrix(before: &[Entry], after: &[Entry]) -> Vec<Vec<Score>> {
    before
        .iter()
        .enumerate()
        .map(|(i, b)| {
            after
                .iter()
                .enumerate()
                .map(|(j, a)| score_at(b.page(), i, a.page(), j))
                .collect()
        })
        .collect()
}

/// Assignment maximising total weight. `cap` overrides the default iteration bound.
pub fn solve(weights: &[Vec<Score>], cap: Option<usize>) -> Result<Assignment, ReconcileError> {
    let n = weights.len();
    if let Some((row, cols)) = weights
        .iter()
        .enumerate()
        .map(|(row, r)| (row, r.len()))
        .find(|&(_, cols)| cols != n)
    {
        return Err(ReconcileError::NonSquareMatrix { rows: n, row, cols });
    }
    if n == 0 {
        return Ok(Assignment {
            pairs: Vec::new(),
            optimal: true,
            iterations: 0,
        });
    }

    let original = to_costs(weights);
    let mut costs = original.clone();
    reduce(&mut costs);

    let cap = cap.unwrap_or(n * n + n);
    let mut iterations = 0;
    loop {
        let row_of_col = zero_matching(&costs);
        if row_of_col.iter().all(Option::is_some) {
            let mut pairs = vec![0; n];
            for (col, row) in row_of_col.iter().enumerate() {
                if let Some(row) = row {
                    pairs[*row] = col;
                }
            }
            return Ok(Assignment {
                pairs,
                optimal: true,
                iterations,
            });
        }

        if iterations >= cap || !shift_uncovered(&mut costs, &row_of_col) {
            tracing::warn!(
                size = n,
                iterations,
                cap,
                "assignment did not converge; falling back to greedy matching"
            );
            return Ok(Assignment {
                pairs: greedy(&original),
                optimal: false,
                iterations,
            });
        }
        iterations += 1;
    }
}

fn to_costs(weights: &[Vec<Score>]) -> Vec<Vec<Score>> {
    let max = weights.iter().flatten().copied().max().unwrap_or(0);
    weights
        .iter()
        .map(|row| row.iter().map(|w| max - w).collect())
        .collect()
}

fn reduce(costs: &mut [Vec<Score>]) {
    let n = costs.len();
    for row in costs.iter_mut() {
        let min = row.iter().copied().min().unwrap_or(0);
        row.iter_mut().for_each(|c| *c -= min);
    }
    for col in 0..n {
        let min = costs.iter().map(|row| row[col]).min().unwrap_or(0);
        costs.iter_mut().for_each(|row| row[col] -= min);
    }
}

/// Maximum matching on zero cells; returns the row matched to each column.
fn zero_matching(costs: &[Vec<Score>]) -> Vec<Option<usize>> {
    let n = costs.len();
    let mut row_of_col = vec![None; n];
    for row in 0..n {
        let mut seen = vec![false; n];
        augment(costs, row, &mut seen, &mut row_of_col);
    }
    row_of_col
}

fn augment(
    costs: &[Vec<Score>],
    row: usize,
    seen: &mut [bool],
    row_of_col: &mut [Option<usize>],
) -> bool {
    for col in 0..costs.len() {
        if costs[row][col] != 0 || seen[col] {
            continue;
        }
        seen[col] = true;
        let free = match row_of_col[col] {
            None => true,
            Some(other) => augment(costs, other, seen, row_of_col),
        };
        if free {
            row_of_col[col] = Some(row);
            return true;
        }
    }
    false
}

/// Cover all zeros with a minimum set of lines and move the smallest uncovered
/// cost into the covered region. Returns `false` if nothing was uncovered.
fn shift_uncovered(costs: &mut [Vec<Score>], row_of_col: &[Option<usize>]) -> bool {
    let n = costs.len();
    let mut matched_row = vec![false; n];
    for row in row_of_col.iter().flatten() {
        matched_row[*row] = true;
    }

    // Alternating reachability from unmatched rows.
    let mut row_reached: Vec<bool> = matched_row.iter().map(|m| !m).collect();
    let mut col_reached = vec![false; n];
    let mut stack: Vec<usize> = (0..n).filter(|&r| row_reached[r]).collect();
    while let Some(row) = stack.pop() {
        for col in 0..n {
            if costs[row][col] != 0 || col_reached[col] {
                continue;
            }
            col_reached[col] = true;
            if let Some(next) = row_of_col[col] {
                if !row_reached[next] {
                    row_reached[next] = true;
                    stack.push(next);
                }
            }
        }
    }

    // Cover = unreached rows + reached columns.
    let min = (0..n)
        .filter(|&r| row_reached[r])
        .flat_map(|r| (0..n).filter(|&c| !col_reached[c]).map(move |c| (r, c)))
        .map(|(r, c)| costs[r][c])
        .min();
    let Some(min) = min.filter(|&m| m > 0) else {
        return false;
    };

    for r in 0..n {
        for c in 0..n {
            match (row_reached[r], col_reached[c]) {
                (true, false) => costs[r][c] -= min,
                (false, true) => costs[r][c] += min,
                _ => {}
            }
        }
    }
    true
}

/// Each row, in order, takes its cheapest remaining column (ties by index).
fn greedy(costs: &[Vec<Score>]) -> Vec<usize> {
    let n = costs.len();
    let mut taken = vec![false; n];
    let mut pairs = Vec::with_capacity(n);
    for row in costs {
        let mut best: Option<usize> = None;
        for col in 0..n {
            if taken[col] {
                continue;
            }
            if best.map_or(true, |b| row[col] < row[b]) {
                best = Some(col);
            }
        }
        // n rows over n columns: a free column always remains.
        let col = best.unwrap_or(0);
        taken[col] = true;
        pairs.push(col);
    }
    pairs
}
