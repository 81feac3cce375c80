//! Ordered plans and their in-memory replay.

use slidesync_core::{Action, ActionKind, Page};

use crate::error::ReconcileError;

/// Actions grouped by execution phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub appends: Vec<Action>,
    pub updates: Vec<Action>,
    /// Highest index first.
    pub deletes: Vec<Action>,
    /// Positions as of the deck after deletes, in replay order.
    pub moves: Vec<Action>,
    /// `false` if the matcher fell back to greedy pairing.
    pub optimal: bool,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            appends: Vec::new(),
            updates: Vec::new(),
            deletes: Vec::new(),
            moves: Vec::new(),
            optimal: true,
        }
    }
}

impl Plan {
    /// Every action in execution order: Append, Update, Delete, Move.
    pub fn actions(&self) -> Vec<Action> {
        self.iter().cloned().collect()
    }

    pub fn into_actions(self) -> Vec<Action> {
        let mut actions = self.appends;
        actions.extend(self.updates);
        actions.extend(self.deletes);
        actions.extend(self.moves);
        actions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.appends
            .iter()
            .chain(&self.updates)
            .chain(&self.deletes)
            .chain(&self.moves)
    }

    pub fn len(&self) -> usize {
        self.appends.len() + self.updates.len() + self.deletes.len() + self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count(&self, kind: ActionKind) -> usize {
        match kind {
            ActionKind::Append => self.appends.len(),
            ActionKind::Update => self.updates.len(),
            ActionKind::Delete => self.deletes.len(),
            ActionKind::Move => self.moves.len(),
        }
    }
}

/// Apply one action to an in-memory deck.
///
/// Appends always land at the end; their index is advisory.
pub fn apply_action(pages: &mut Vec<Page>, action: &Action) -> Result<(), ReconcileError> {
    let len = pages.len();
    let check = |index: usize| {
        if index < len {
            Ok(())
        } else {
            Err(ReconcileError::IndexOutOfRange { index, len })
        }
    };
    match action {
        Action::Append { page, .. } => pages.push(page.clone()),
        Action::Update { index, page } => {
            check(*index)?;
            pages[*index] = page.clone();
        }
        Action::Delete { index } => {
            check(*index)?;
            pages.remove(*index);
        }
        Action::Move { from, to } => {
            check(*from)?;
            check(*to)?;
            let page = pages.remove(*from);
            pages.insert(*to, page);
        }
    }
    Ok(())
}

/// Replay `actions` in order against a copy of `before`.
pub fn simulate(before: &[Page], actions: &[Action]) -> Result<Vec<Page>, ReconcileError> {
    let mut pages = before.to_vec();
    for action in actions {
        apply_action(&mut pages, action)?;
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(title: &str) -> Page {
        Page::new("body").with_title(title)
    }

    #[test]
    fn actions_follow_phase_order() {
        let plan = Plan {
            appends: vec![Action::Append { index: 2, page: page("C") }],
            updates: vec![Action::Update { index: 0, page: page("A2") }],
            deletes: vec![Action::Delete { index: 1 }],
            moves: vec![Action::Move { from: 1, to: 0 }],
            optimal: true,
        };
        let kinds: Vec<ActionKind> = plan.actions().iter().map(Action::kind).collect();
        assert_eq!(
            kinds,
            vec![ActionKind::Append, ActionKind::Update, ActionKind::Delete, ActionKind::Move]
        );
        assert_eq!(plan.len(), 4);
        assert_eq!(plan.count(ActionKind::Delete), 1);
        assert_eq!(plan.clone().into_actions(), plan.actions());
    }

    #[test]
    fn simulate_applies_each_kind() {
        let before = vec![page("A"), page("B")];
        let actions = vec![
            Action::Append { index: 2, page: page("C") },
            Action::Update { index: 0, page: page("A2") },
            Action::Delete { index: 1 },
            Action::Move { from: 1, to: 0 },
        ];
        let after = simulate(&before, &actions).expect("simulate");
        assert_eq!(after, vec![page("C"), page("A2")]);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let err = simulate(&[page("A")], &[Action::Delete { index: 3 }]).unwrap_err();
        assert_eq!(err, ReconcileError::IndexOutOfRange { index: 3, len: 1 });

        let err = simulate(&[page("A")], &[Action::Move { from: 0, to: 1 }]).unwrap_err();
        assert_eq!(err, ReconcileError::IndexOutOfRange { index: 1, len: 1 });
    }
}
