//! Move sequencing.
//!
//! Walks target positions in ascending order over a simulated deck. Whenever
//! the page at a position is not the one expected there, the expected page is
//! pulled out from wherever it currently sits and reinserted. Every emitted
//! move uses positions as they are at that point of the simulation, so the
//! list replays correctly when executed strictly in order.

use slidesync_core::Action;

use crate::error::ReconcileError;
use crate::synth::Survivor;

pub fn sequence(survivors: &[Survivor]) -> Result<Vec<Action>, ReconcileError> {
    let len = survivors.len();
    let mut ordered = survivors.to_vec();
    ordered.sort_by_key(|s| s.position);

    let mut seen = vec![false; len];
    for (at, s) in ordered.iter().enumerate() {
        if s.position != at || s.target >= len || std::mem::replace(&mut seen[s.target], true) {
            return Err(ReconcileError::Invariant(format!(
                "survivors do not form a permutation at position {at}"
            )));
        }
    }

    // working[p] = target of the page currently at position p
    let mut working: Vec<usize> = ordered.iter().map(|s| s.target).collect();
    let mut moves = Vec::new();
    for to in 0..len {
        if working[to] == to {
            continue;
        }
        let from = working
            .iter()
            .position(|&t| t == to)
            .ok_or_else(|| ReconcileError::Invariant(format!("no page targets {to}")))?;
        let target = working.remove(from);
        working.insert(to, target);
        moves.push(Action::Move { from, to });
    }
    Ok(moves)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survivors(targets: &[usize]) -> Vec<Survivor> {
        targets
            .iter()
            .enumerate()
            .map(|(position, &target)| Survivor { position, target })
            .collect()
    }

    #[test]
    fn ordered_survivors_need_no_moves() {
        assert!(sequence(&survivors(&[0, 1, 2])).unwrap().is_empty());
    }

    #[test]
    fn swap_is_a_single_move() {
        assert_eq!(
            sequence(&survivors(&[1, 0])).unwrap(),
            vec![Action::Move { from: 1, to: 0 }]
        );
    }

    #[test]
    fn rotation_moves_last_page_to_front() {
        // Deck shows [B, C, A]; target order is [A, B, C].
        assert_eq!(
            sequence(&survivors(&[1, 2, 0])).unwrap(),
            vec![Action::Move { from: 2, to: 0 }]
        );
    }

    #[test]
    fn moves_replay_to_target_order() {
        let targets = [3, 0, 4, 1, 2];
        let moves = sequence(&survivors(&targets)).unwrap();
        let mut deck: Vec<usize> = targets.to_vec();
        for action in &moves {
            let Action::Move { from, to } = *action else {
                panic!("unexpected {action:?}");
            };
            let page = deck.remove(from);
            deck.insert(to, page);
        }
        assert_eq!(deck, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn duplicate_targets_are_rejected() {
        assert!(sequence(&survivors(&[0, 0])).is_err());
    }
}
