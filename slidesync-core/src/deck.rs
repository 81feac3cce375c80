//! YAML deck files.
//!
//! # Format
//!
//! ```yaml
//! pages:
//!   - layout: title-and-body
//!     titles: [Roadmap]
//!     bodies:
//!       - runs: [{ text: "Ship it", bold: true }]
//!     images:
//!       - path: img/chart.png            # local, needs upload
//!       - url: file:///store/ab12.png    # already uploaded
//!         id: ab12.png
//!         fingerprint: ab12…
//!     speaker_note: "pause here"
//!     freeze: true
//! ```
//!
//! Image paths are relative to the deck file. Saving writes a `.yaml.tmp`
//! sibling and renames it over the target, like every other persisted file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};
use crate::image::{file_url_path, mime_type_for, Image, ImageResource, RemoteImageRef};
use crate::types::{BodyBlock, LayoutId, Page};

// ---------------------------------------------------------------------------
// On-disk records
// ---------------------------------------------------------------------------

/// Root of a deck file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckFile {
    #[serde(default)]
    pub pages: Vec<PageRecord>,
}

/// One page as written in a deck file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    #[serde(default)]
    pub layout: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub titles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtitles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bodies: Vec<BodyBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block_quotes: Vec<BodyBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageRecord>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub speaker_note: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub freeze: bool,
}

/// An image reference: either a local `path` or an uploaded `url` + `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl ImageRecord {
    /// Record for an uploaded image. Fails if the image has no remote location.
    pub fn from_image(image: &Image) -> Result<Self, CoreError> {
        let location = image.location().ok_or_else(|| CoreError::ImageNotUploaded {
            fingerprint: image.fingerprint().to_string(),
        })?;
        Ok(Self {
            path: None,
            url: Some(location.url),
            id: Some(location.id),
            fingerprint: Some(image.fingerprint().to_string()),
            mime_type: Some(image.mime_type().to_string()),
        })
    }

    /// Instantiate the image this record names. `deck_path` anchors relative paths.
    pub fn to_image(&self, deck_path: &Path) -> Result<Image, CoreError> {
        if let Some(rel) = &self.path {
            let full = deck_path.parent().unwrap_or(Path::new(".")).join(rel);
            let bytes = std::fs::read(&full).map_err(|e| io_err(&full, e))?;
            let mime = self
                .mime_type
                .clone()
                .unwrap_or_else(|| mime_type_for(&full).to_string());
            return Ok(ImageResource::new(bytes, mime));
        }

        let (Some(url), Some(id)) = (&self.url, &self.id) else {
            return Err(CoreError::InvalidImage {
                path: deck_path.to_path_buf(),
                reason: "image needs either `path` or both `url` and `id`".to_string(),
            });
        };
        let location = RemoteImageRef {
            url: url.clone(),
            id: id.clone(),
        };
        let mime = self
            .mime_type
            .clone()
            .unwrap_or_else(|| mime_type_for(Path::new(url)).to_string());

        if let Some(fingerprint) = &self.fingerprint {
            return Ok(ImageResource::remote(fingerprint.clone(), mime, location));
        }
        match file_url_path(url) {
            Some(stored) => {
                let bytes = std::fs::read(&stored).map_err(|e| io_err(&stored, e))?;
                Ok(ImageResource::uploaded(bytes, mime, location))
            }
            None => Err(CoreError::InvalidImage {
                path: deck_path.to_path_buf(),
                reason: format!("remote image {url} has no fingerprint"),
            }),
        }
    }
}

impl PageRecord {
    pub fn from_page(page: &Page) -> Result<Self, CoreError> {
        Ok(Self {
            layout: page.layout.0.clone(),
            titles: page.titles.clone(),
            subtitles: page.subtitles.clone(),
            bodies: page.bodies.clone(),
            block_quotes: page.block_quotes.clone(),
            images: page
                .images
                .iter()
                .map(ImageRecord::from_image)
                .collect::<Result<_, _>>()?,
            speaker_note: page.speaker_note.clone(),
            freeze: page.freeze,
        })
    }

    pub fn to_page(&self, deck_path: &Path) -> Result<Page, CoreError> {
        Ok(Page {
            layout: LayoutId::from(self.layout.clone()),
            titles: self.titles.clone(),
            subtitles: self.subtitles.clone(),
            bodies: self.bodies.clone(),
            block_quotes: self.block_quotes.clone(),
            images: self
                .images
                .iter()
                .map(|img| img.to_image(deck_path))
                .collect::<Result<_, _>>()?,
            speaker_note: self.speaker_note.clone(),
            freeze: self.freeze,
        })
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Read the raw records of a deck file.
pub fn read_at(path: &Path) -> Result<DeckFile, CoreError> {
    if !path.exists() {
        return Err(CoreError::DeckNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| CoreError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load every page of the deck at `path`, reading local images from disk.
pub fn load_at(path: &Path) -> Result<Vec<Page>, CoreError> {
    read_at(path)?
        .pages
        .iter()
        .map(|record| record.to_page(path))
        .collect()
}

/// Atomically save `pages` to `path`.
///
/// Every image must already be uploaded; local images have no stable location
/// to record.
pub fn save_at(path: &Path, pages: &[Page]) -> Result<(), CoreError> {
    let file = DeckFile {
        pages: pages
            .iter()
            .map(PageRecord::from_page)
            .collect::<Result<_, _>>()?,
    };
    write_at(path, &file)
}

/// Atomically write raw deck records to `path`.
pub fn write_at(path: &Path, file: &DeckFile) -> Result<(), CoreError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    let yaml = serde_yaml::to_string(file)?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
