//! Plan actions.
//!
//! Indices are physical positions in the remote deck at the moment the action
//! runs. A plan always executes in phase order: every Append, then every
//! Update, then Deletes from the highest index down, then Moves.

use std::fmt;

use serde::Serialize;

use crate::types::Page;

/// One remote mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Add `page` at the end of the deck. `index` is where it lands.
    Append { index: usize, page: Page },
    /// Replace the content of the page at `index`.
    Update { index: usize, page: Page },
    /// Remove the page at `index`.
    Delete { index: usize },
    /// Remove the page at `from` and reinsert it at `to`.
    Move { from: usize, to: usize },
}

/// Action discriminant. Ordering follows the execution phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Append,
    Update,
    Delete,
    Move,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Append => write!(f, "append"),
            ActionKind::Update => write!(f, "update"),
            ActionKind::Delete => write!(f, "delete"),
            ActionKind::Move => write!(f, "move"),
        }
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Append { .. } => ActionKind::Append,
            Action::Update { .. } => ActionKind::Update,
            Action::Delete { .. } => ActionKind::Delete,
            Action::Move { .. } => ActionKind::Move,
        }
    }

    /// The index the action addresses (the source index for a move).
    pub fn index(&self) -> usize {
        match self {
            Action::Append { index, .. }
            | Action::Update { index, .. }
            | Action::Delete { index } => *index,
            Action::Move { from, .. } => *from,
        }
    }

    /// Page payload carried by Append and Update.
    pub fn page(&self) -> Option<&Page> {
        match self {
            Action::Append { page, .. } | Action::Update { page, .. } => Some(page),
            Action::Delete { .. } | Action::Move { .. } => None,
        }
    }

    pub fn summary(&self) -> ActionSummary {
        ActionSummary {
            kind: self.kind(),
            index: self.index(),
            to: match self {
                Action::Move { to, .. } => Some(*to),
                _ => None,
            },
            title: self.page().map(Page::label),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Append { index, page } => write!(f, "append #{index} \"{}\"", page.label()),
            Action::Update { index, page } => write!(f, "update #{index} \"{}\"", page.label()),
            Action::Delete { index } => write!(f, "delete #{index}"),
            Action::Move { from, to } => write!(f, "move #{from} -> #{to}"),
        }
    }
}

/// Serializable, payload-free view of an action for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionSummary {
    pub kind: ActionKind,
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}
