//! Reconciliation working entries.
//!
//! Each page in the adjusted before/after lists is wrapped once per pass.
//! `New` only appears on the before side (padding for pages to append),
//! `Removed` only on the after side (padding for pages to delete).

use slidesync_core::Page;

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// A page taken from the input list as-is.
    Kept(Page),
    /// Before-side padding: a page that will be appended.
    New(Page),
    /// After-side padding: its matched before page will be deleted.
    Removed(Page),
}

impl Entry {
    pub fn page(&self) -> &Page {
        match self {
            Entry::Kept(page) | Entry::New(page) | Entry::Removed(page) => page,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Entry::New(_))
    }

    pub fn is_removed(&self) -> bool {
        matches!(self, Entry::Removed(_))
    }
}
