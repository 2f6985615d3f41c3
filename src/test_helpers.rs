//! Shared test utilities.
//!
//! Fixture builders for message lists, a fixed clock, and two store wrappers:
//!
//! - [`RecordingStore`] logs every call (and optionally forwards to a
//!   [`DirStore`]) so tests can assert on the exact request sequence.
//! - [`RacingStore`] simulates a second publisher that rewrites the message
//!   list between our read and our write.

use chrono::{DateTime, TimeZone, Utc};
use std::cell::RefCell;
use std::fs;
use std::path::Path;

use crate::store::{ContentStore, DirStore, EncodedContent, Revision, StoreError, StoredFile};
use crate::types::{self, Message};

// =========================================================================
// Fixtures
// =========================================================================

/// 2024-02-14T09:30:00.000Z
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 14, 9, 30, 0).unwrap()
}

/// Build a message with the given id, title and `createdAt`.
pub fn message(id: &str, title: &str, created_at: Option<&str>) -> Message {
    Message {
        id: id.to_string(),
        title: title.to_string(),
        message: format!("Body of {title}"),
        image_url: format!("uploads/{id}.jpg"),
        event_name: String::new(),
        created_at: created_at.map(str::to_string),
        extra: Default::default(),
    }
}

/// Three messages, newest first.
pub fn sample_messages() -> Vec<Message> {
    vec![
        message("msg_3", "Third", Some("2024-02-10T12:00:00.000Z")),
        message("msg_2", "Second", Some("2024-01-20T12:00:00.000Z")),
        message("msg_1", "First", Some("2024-01-01T12:00:00.000Z")),
    ]
}

/// Write `messages` to `<root>/data/messages.json`.
pub fn write_list(root: &Path, messages: &[Message]) {
    let path = root.join("data/messages.json");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, types::serialize_message_list(messages).unwrap()).unwrap();
}

/// Read `<root>/data/messages.json`.
pub fn read_list(root: &Path) -> Vec<Message> {
    let text = fs::read_to_string(root.join("data/messages.json")).unwrap();
    types::parse_message_list(&text).unwrap()
}

// =========================================================================
// Store wrappers
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Get { path: String },
    Put { path: String, revision: Option<String> },
}

/// Records calls. Without an inner store every `get` is "not found" and
/// every `put` succeeds.
#[derive(Default)]
pub struct RecordingStore {
    inner: Option<DirStore>,
    calls: RefCell<Vec<StoreCall>>,
}

impl RecordingStore {
    pub fn over(inner: DirStore) -> Self {
        Self {
            inner: Some(inner),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.borrow().clone()
    }
}

impl ContentStore for RecordingStore {
    fn get(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        self.calls.borrow_mut().push(StoreCall::Get {
            path: path.to_string(),
        });
        match &self.inner {
            Some(store) => store.get(path),
            None => Ok(None),
        }
    }

    fn put(
        &self,
        path: &str,
        content: &EncodedContent,
        commit_message: &str,
        revision: Option<&Revision>,
    ) -> Result<(), StoreError> {
        self.calls.borrow_mut().push(StoreCall::Put {
            path: path.to_string(),
            revision: revision.map(|r| r.as_str().to_string()),
        });
        match &self.inner {
            Some(store) => store.put(path, content, commit_message, revision),
            None => Ok(()),
        }
    }
}

/// After the first read of `contested`, another writer replaces it with a
/// single `msg_racer` record, making the revision we handed out stale.
pub struct RacingStore {
    inner: DirStore,
    contested: String,
}

impl RacingStore {
    pub fn new(inner: DirStore, contested: &str) -> Self {
        Self {
            inner,
            contested: contested.to_string(),
        }
    }
}

impl ContentStore for RacingStore {
    fn get(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        let file = self.inner.get(path)?;
        if path == self.contested {
            let racer = vec![message("msg_racer", "Racer", Some("2024-02-14T09:29:59.000Z"))];
            let full = self.inner.root().join(path);
            fs::create_dir_all(full.parent().unwrap())?;
            fs::write(full, types::serialize_message_list(&racer).unwrap())?;
        }
        Ok(file)
    }

    fn put(
        &self,
        path: &str,
        content: &EncodedContent,
        commit_message: &str,
        revision: Option<&Revision>,
    ) -> Result<(), StoreError> {
        self.inner.put(path, content, commit_message, revision)
    }
}
