//! Content store abstraction.
//!
//! Both flows persist through a store addressed by repository-relative path.
//! Every stored file carries a [`Revision`] token; an overwrite must present
//! the token it read, so a writer holding a stale token is rejected instead
//! of silently clobbering a concurrent write. Nothing here retries or merges.
//!
//! ```text
//! get(path)                         -> Some({content, revision}) | None
//! put(path, content, msg, None)     -> create only; fails if path exists
//! put(path, content, msg, Some(r))  -> overwrite only if r is current
//! ```
//!
//! Content crosses this boundary base64-encoded ([`EncodedContent`]), which is
//! the form the hosted content API speaks.
//!
//! Two implementations exist: [`crate::github::GitHubStore`] for the hosted
//! repository API and [`DirStore`] for a local directory.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("write to {path} rejected: revision is stale or file already exists")]
    Conflict { path: String },
    #[error("credential rejected ({status})")]
    Unauthorized { status: u16 },
    #[error("content API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("invalid API response: {0}")]
    InvalidResponse(String),
}

/// Opaque token identifying the stored state of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision(String);

impl Revision {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// File content in transfer form (standard base64).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedContent(String);

impl EncodedContent {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(BASE64.encode(bytes))
    }

    /// Wrap an already-encoded string as received from the store.
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode to raw bytes. Whitespace is ignored since the hosted API wraps
    /// base64 at 60 columns.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        let compact: String = self.0.chars().filter(|c| !c.is_whitespace()).collect();
        BASE64.decode(compact)
    }
}

/// A file read from the store.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub content: EncodedContent,
    pub revision: Revision,
}

/// Path-addressed storage with optimistic-concurrency revisions.
pub trait ContentStore {
    /// Read a file. `Ok(None)` when it does not exist.
    fn get(&self, path: &str) -> Result<Option<StoredFile>, StoreError>;

    /// Write a file. Without `revision` the write only creates; with one it
    /// only succeeds if `revision` is the file's current revision.
    fn put(
        &self,
        path: &str,
        content: &EncodedContent,
        commit_message: &str,
        revision: Option<&Revision>,
    ) -> Result<(), StoreError>;
}

// ============================================================================
// Directory-backed store
// ============================================================================

/// Content store over a local directory.
///
/// Revisions are the SHA-256 of the file's current bytes, so any change to a
/// file, whether through this store or an editor, invalidates tokens handed
/// out earlier. Commit messages are logged, not recorded.
///
/// Content is staged in a temporary file next to the target and moved into
/// place, so readers never see a partial file. A create-only write fails if
/// anything already sits at the path, even a file another process created a
/// moment ago. Overwrites compare and replace under a lock shared by every
/// clone of the store, so two writers holding the same revision cannot both
/// succeed.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Arc::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a repository-relative path under the root, refusing anything
    /// that would escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if path.is_empty() || escapes {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

/// SHA-256 of `bytes` as lowercase hex, used as a revision token.
pub fn content_revision(bytes: &[u8]) -> Revision {
    Revision(format!("{:x}", Sha256::digest(bytes)))
}

impl ContentStore for DirStore {
    fn get(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        let full = self.resolve(path)?;
        let bytes = match fs::read(&full) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(StoredFile {
            revision: content_revision(&bytes),
            content: EncodedContent::from_bytes(&bytes),
        }))
    }

    fn put(
        &self,
        path: &str,
        content: &EncodedContent,
        commit_message: &str,
        revision: Option<&Revision>,
    ) -> Result<(), StoreError> {
        let full = self.resolve(path)?;
        let bytes = content
            .decode()
            .map_err(|e| StoreError::InvalidResponse(format!("content is not base64: {e}")))?;
        let parent = full.parent().unwrap_or(self.root.as_path());
        fs::create_dir_all(parent)?;

        let mut staged = NamedTempFile::new_in(parent)?;
        staged.write_all(&bytes)?;
        staged.as_file().sync_all()?;

        let conflict = || StoreError::Conflict {
            path: path.to_string(),
        };
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match revision {
            None => staged.persist_noclobber(&full).map_err(|e| {
                if e.error.kind() == io::ErrorKind::AlreadyExists {
                    conflict()
                } else {
                    StoreError::Io(e.error)
                }
            })?,
            Some(expected) => {
                let current = match fs::read(&full) {
                    Ok(b) => content_revision(&b),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(conflict()),
                    Err(e) => return Err(e.into()),
                };
                if &current != expected {
                    return Err(conflict());
                }
                staged.persist(&full).map_err(|e| StoreError::Io(e.error))?
            }
        };
        tracing::debug!(path, commit_message, "wrote file to directory store");
        Ok(())
    }
}
