//! Shared types for the persisted message list.
//!
//! The message list is a single JSON array written by `publish` and read by
//! `gallery`. Keys are camelCase on disk. Every field tolerates absence so a
//! hand-edited file still loads, and unknown keys are carried through
//! untouched when the list is rewritten.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One gallery entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Body text of the letter.
    #[serde(default)]
    pub message: String,
    /// Repository-relative image path, e.g. `uploads/happy-anniversary-1712.jpg`.
    #[serde(default)]
    pub image_url: String,
    /// Empty when no event was given.
    #[serde(default)]
    pub event_name: String,
    /// ISO-8601 timestamp. `None` for records written without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Keys this tool does not know about, preserved on rewrite.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    /// Parsed `createdAt`, or `None` if absent or not a valid timestamp.
    pub fn created_at_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// `createdAt` as epoch milliseconds.
    pub fn created_at_millis(&self) -> Option<i64> {
        self.created_at_time().map(|t| t.timestamp_millis())
    }

    /// Title for display, `"Untitled"` when empty.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }
}

/// Format a timestamp the way `createdAt` is stored: UTC, millisecond
/// precision, `Z` suffix (`2024-02-14T09:30:00.000Z`).
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a persisted message list.
pub fn parse_message_list(json: &str) -> Result<Vec<Message>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Serialize a message list in the on-disk layout (pretty, two-space indent).
pub fn serialize_message_list(messages: &[Message]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(messages)
}
