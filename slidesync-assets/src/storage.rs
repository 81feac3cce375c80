//! Asset storage façade.
//!
//! [`upload`] is the only way images reach storage: store the bytes, make
//! them publicly readable, resolve the public URL. If either of the last two
//! steps fails the stored object is deleted again so nothing is orphaned.
//! Every `put` creates a new object, so that cleanup never touches an object
//! another upload published.

use std::path::{Path, PathBuf};

use slidesync_core::image::{extension_for, file_url, fingerprint};
use slidesync_core::RemoteImageRef;
use uuid::Uuid;

use crate::error::{io_err, AssetError};

/// Blocking storage backend. Calls run on the blocking thread pool.
pub trait Storage: Send + Sync {
    /// Store `bytes` privately and return the new object's id.
    fn put(&self, bytes: &[u8], mime_type: &str) -> Result<String, AssetError>;
    fn grant_public_read(&self, id: &str) -> Result<(), AssetError>;
    fn public_url(&self, id: &str) -> Result<String, AssetError>;
    fn delete(&self, id: &str) -> Result<(), AssetError>;
}

/// Store `bytes` and publish them.
pub fn upload<S: Storage + ?Sized>(
    storage: &S,
    bytes: &[u8],
    mime_type: &str,
) -> Result<RemoteImageRef, AssetError> {
    let id = storage.put(bytes, mime_type)?;
    let published = storage
        .grant_public_read(&id)
        .and_then(|()| storage.public_url(&id));
    match published {
        Ok(url) => Ok(RemoteImageRef { url, id }),
        Err(err) => {
            if let Err(cleanup) = storage.delete(&id) {
                tracing::warn!(id = %id, error = %cleanup, "failed to delete orphaned upload");
            }
            Err(err)
        }
    }
}

// ---------------------------------------------------------------------------
// DirStorage
// ---------------------------------------------------------------------------

/// Objects stored as files named `<fingerprint>-<uuid>.<ext>` under one directory.
///
/// Storing the same bytes twice yields two objects. New objects are written with mode `0600`; granting public read widens that
/// to `0644`. URLs are `file://` URLs of the stored file.
#[derive(Debug, Clone)]
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, id: &str) -> Result<PathBuf, AssetError> {
        if id.is_empty() || id.contains('/') || id.contains('\\') || id.starts_with('.') {
            return Err(AssetError::Storage(format!("invalid object id '{id}'")));
        }
        Ok(self.root.join(id))
    }
}

impl Storage for DirStorage {
    fn put(&self, bytes: &[u8], mime_type: &str) -> Result<String, AssetError> {
        std::fs::create_dir_all(&self.root).map_err(|e| io_err(&self.root, e))?;
        let id = format!(
            "{}-{}.{}",
            fingerprint(bytes),
            Uuid::new_v4().simple(),
            extension_for(mime_type)
        );
        let path = self.object_path(&id)?;
        let tmp = self.root.join(format!(".{id}.tmp"));

        let written = std::fs::write(&tmp, bytes)
            .map_err(|e| io_err(&tmp, e))
            .and_then(|()| set_mode(&tmp, 0o600))
            .and_then(|()| std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e)));
        if let Err(err) = written {
            let _ = std::fs::remove_file(&tmp);
            return Err(err);
        }
        tracing::debug!(id = %id, bytes = bytes.len(), "stored object");
        Ok(id)
    }

    fn grant_public_read(&self, id: &str) -> Result<(), AssetError> {
        let path = self.object_path(id)?;
        if !path.exists() {
            return Err(AssetError::Storage(format!("no object '{id}'")));
        }
        set_mode(&path, 0o644)
    }

    fn public_url(&self, id: &str) -> Result<String, AssetError> {
        let path = self.object_path(id)?;
        let absolute = std::fs::canonicalize(&path).map_err(|e| io_err(&path, e))?;
        Ok(file_url(&absolute))
    }

    fn delete(&self, id: &str) -> Result<(), AssetError> {
        let path = self.object_path(id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(&path, e)),
        }
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), AssetError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<(), AssetError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
