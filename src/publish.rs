//! Publishing a new letter.
//!
//! One linear pass, no retries:
//!
//! ```text
//! 1. validate     title, message, image present        (no network on failure)
//! 2. name         uploads/<slug>-<millis>.<ext>
//! 3. encode       image bytes → base64
//! 4. put image    create-only
//! 5. get list     absent → [] with no revision
//! 6. put list     [new, ...old] guarded by the revision from step 5
//! ```
//!
//! The two writes are not atomic. If step 6 fails (most likely a concurrent
//! publisher moved the list's revision on), the image from step 4 stays in
//! the repository unreferenced. That is accepted; there is no rollback.
//!
//! Callers see one of two strings ([`PublishError::user_message`]); the
//! actual cause is logged.

use crate::config::PathsConfig;
use crate::naming;
use crate::store::{ContentStore, EncodedContent, Revision, StoreError};
use crate::types::{self, Message};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Shown when a required field is missing.
pub const MISSING_FIELDS_MESSAGE: &str = "Please fill all required fields.";

/// Shown for every failure after validation.
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed. Check token permissions and repo settings.";

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("cannot read image {}: {source}", path.display())]
    ImageRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("message list is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("message list is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("message list JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PublishError {
    /// The only text end users get to see.
    pub fn user_message(&self) -> &'static str {
        match self {
            PublishError::MissingField(_) | PublishError::ImageRead { .. } => {
                MISSING_FIELDS_MESSAGE
            }
            _ => UPLOAD_FAILED_MESSAGE,
        }
    }
}

/// An image file picked for upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Original file name; only its extension is used.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Read an image from disk. An unreadable file counts as no image.
    pub fn read(path: &Path) -> Result<Self, PublishError> {
        let bytes = std::fs::read(path).map_err(|source| PublishError::ImageRead {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }
}

/// Form input for a new letter.
#[derive(Debug, Clone, Default)]
pub struct PublishRequest {
    pub title: String,
    pub event_name: String,
    pub message: String,
    pub image: Option<ImageUpload>,
}

/// Result of a successful publish.
#[derive(Debug, Clone)]
pub struct Published {
    pub message: Message,
    pub image_path: String,
    /// Length of the list after the new record was prepended.
    pub total_messages: usize,
}

/// Check required fields, returning the trimmed request.
///
/// The credential is checked by whoever builds the store; this covers the
/// form fields.
pub fn validate(request: &PublishRequest) -> Result<PublishRequest, PublishError> {
    let title = request.title.trim();
    let message = request.message.trim();
    if title.is_empty() {
        return Err(PublishError::MissingField("title"));
    }
    if message.is_empty() {
        return Err(PublishError::MissingField("message"));
    }
    let image = match &request.image {
        Some(img) if !img.bytes.is_empty() => img.clone(),
        _ => return Err(PublishError::MissingField("image")),
    };
    Ok(PublishRequest {
        title: title.to_string(),
        event_name: request.event_name.trim().to_string(),
        message: message.to_string(),
        image: Some(image),
    })
}

/// Read the message list. A missing file is an empty list with no revision.
pub fn load_message_list<S: ContentStore + ?Sized>(
    store: &S,
    path: &str,
) -> Result<(Vec<Message>, Option<Revision>), PublishError> {
    let Some(file) = store.get(path)? else {
        return Ok((Vec::new(), None));
    };
    let text = String::from_utf8(file.content.decode()?)?;
    let messages = if text.trim().is_empty() {
        Vec::new()
    } else {
        types::parse_message_list(&text)?
    };
    Ok((messages, Some(file.revision)))
}

/// Upload the image and prepend a new record to the message list.
pub fn publish<S: ContentStore + ?Sized>(
    store: &S,
    paths: &PathsConfig,
    request: &PublishRequest,
    now: DateTime<Utc>,
) -> Result<Published, PublishError> {
    let request = validate(request)?;
    let result = publish_validated(store, paths, request, now);
    if let Err(e) = &result {
        tracing::error!(error = %e, "publish failed");
    }
    result
}

fn publish_validated<S: ContentStore + ?Sized>(
    store: &S,
    paths: &PathsConfig,
    request: PublishRequest,
    now: DateTime<Utc>,
) -> Result<Published, PublishError> {
    let PublishRequest {
        title,
        event_name,
        message,
        image,
    } = request;
    let image = image.ok_or(PublishError::MissingField("image"))?;
    let millis = now.timestamp_millis();

    let image_name = naming::image_file_name(&title, &image.file_name, millis);
    let image_path = naming::image_storage_path(&paths.uploads, &image_name);
    let encoded_image = EncodedContent::from_bytes(&image.bytes);

    tracing::info!(path = %image_path, bytes = image.bytes.len(), "uploading image");
    store.put(
        &image_path,
        &encoded_image,
        &format!("Add image {}", image_name),
        None,
    )?;

    let (existing, revision) = load_message_list(store, &paths.messages)?;
    tracing::debug!(
        count = existing.len(),
        revision = revision.as_ref().map(Revision::as_str),
        "loaded message list"
    );

    let record = Message {
        id: naming::message_id(millis),
        title,
        message,
        image_url: image_path.clone(),
        event_name,
        created_at: Some(types::format_timestamp(now)),
        extra: Default::default(),
    };

    let mut updated = Vec::with_capacity(existing.len() + 1);
    updated.push(record.clone());
    updated.extend(existing);
    let json = types::serialize_message_list(&updated)?;

    store.put(
        &paths.messages,
        &EncodedContent::from_bytes(json.as_bytes()),
        &format!("Add message {}", record.id),
        revision.as_ref(),
    )?;
    tracing::info!(id = %record.id, total = updated.len(), "message published");

    Ok(Published {
        message: record,
        image_path,
        total_messages: updated.len(),
    })
}
