//! Domain types for slide decks.
//!
//! A [`Page`] is a plain value: it carries no reconciliation markers and no
//! remote identity. Equality is an explicit field-by-field predicate in which
//! images compare by fingerprint, never by upload state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::image::Image;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of the slide layout a page is built on (e.g. `title-and-body`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LayoutId(pub String);

impl LayoutId {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for LayoutId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for LayoutId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Text content
// ---------------------------------------------------------------------------

/// A run of text sharing one style.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub code: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// A paragraph-level block: an ordered sequence of styled runs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BodyBlock {
    #[serde(default)]
    pub runs: Vec<TextRun>,
}

impl BodyBlock {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            runs: vec![TextRun::plain(text)],
        }
    }

    /// Concatenated text of every run, styles dropped.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// Full content of one slide, independent of its position in any deck.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub layout: LayoutId,
    pub titles: Vec<String>,
    pub subtitles: Vec<String>,
    pub bodies: Vec<BodyBlock>,
    pub block_quotes: Vec<BodyBlock>,
    pub images: Vec<Image>,
    pub speaker_note: String,
    /// A frozen page keeps whatever the remote deck already shows at its index.
    pub freeze: bool,
}

impl Page {
    pub fn new(layout: impl Into<LayoutId>) -> Self {
        Self {
            layout: layout.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.titles.push(title.into());
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitles.push(subtitle.into());
        self
    }

    pub fn with_body(mut self, text: impl Into<String>) -> Self {
        self.bodies.push(BodyBlock::plain(text));
        self
    }

    pub fn with_block_quote(mut self, text: impl Into<String>) -> Self {
        self.block_quotes.push(BodyBlock::plain(text));
        self
    }

    pub fn with_image(mut self, image: Image) -> Self {
        self.images.push(image);
        self
    }

    pub fn with_speaker_note(mut self, note: impl Into<String>) -> Self {
        self.speaker_note = note.into();
        self
    }

    pub fn frozen(mut self) -> Self {
        self.freeze = true;
        self
    }

    /// Fingerprints of the page's images, in order.
    pub fn image_fingerprints(&self) -> Vec<&str> {
        self.images.iter().map(|i| i.fingerprint()).collect()
    }

    /// Whether both pages show the same images in the same order.
    pub fn same_images(&self, other: &Page) -> bool {
        self.images.len() == other.images.len()
            && self
                .images
                .iter()
                .zip(&other.images)
                .all(|(a, b)| a.fingerprint() == b.fingerprint())
    }

    /// Short human label used in plan summaries.
    pub fn label(&self) -> String {
        match self.titles.first() {
            Some(title) if !title.is_empty() => title.clone(),
            _ if self.layout.is_empty() => "(untitled)".to_string(),
            _ => format!("(untitled {})", self.layout),
        }
    }
}

impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        self.layout == other.layout
            && self.titles == other.titles
            && self.subtitles == other.subtitles
            && self.bodies == other.bodies
            && self.block_quotes == other.block_quotes
            && self.same_images(other)
            && self.speaker_note == other.speaker_note
            && self.freeze == other.freeze
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
