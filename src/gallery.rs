//! Gallery loading.
//!
//! Fetches the message list, orders it newest first, and decides which cards
//! carry the `NEW` badge. Presentation is a [`GalleryView`]: either cards or
//! the empty state. A load failure and an empty list both produce the empty
//! state; the failure is only visible in the log.
//!
//! ## Sources
//!
//! A [`MessageSource`] is an HTTP(S) URL (the published `messages.json`) or a
//! local path (a working checkout). URL fetches ask every cache on the way to
//! revalidate, so a letter published a moment ago shows up.
//!
//! ## New Letters
//!
//! | `createdAt`            | marker   | new? |
//! |------------------------|----------|------|
//! | missing / unparsable   | any      | no   |
//! | present                | unset    | yes  |
//! | later than marker      | set      | yes  |
//! | equal or earlier       | set      | no   |

use crate::types::{self, Message};
use crate::visit::VisitStore;
use chrono::{DateTime, Utc};
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to load messages: HTTP {0}")]
    Status(u16),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where the message list is read from.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageSource {
    Url(String),
    Path(PathBuf),
}

impl MessageSource {
    /// `http://` and `https://` are URLs, anything else is a path.
    pub fn parse(raw: &str) -> Self {
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            MessageSource::Url(raw.to_string())
        } else {
            MessageSource::Path(PathBuf::from(raw))
        }
    }
}

impl std::fmt::Display for MessageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageSource::Url(url) => f.write_str(url),
            MessageSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetch and parse the message list. Order is as stored.
pub fn load_messages(source: &MessageSource) -> Result<Vec<Message>, GalleryError> {
    let text = match source {
        MessageSource::Path(path) => fs::read_to_string(path)?,
        MessageSource::Url(url) => fetch_uncached(url)?,
    };
    Ok(types::parse_message_list(&text)?)
}

fn fetch_uncached(url: &str) -> Result<String, GalleryError> {
    let response = reqwest::blocking::Client::new()
        .get(url)
        .header(CACHE_CONTROL, "no-cache, no-store")
        .header(PRAGMA, "no-cache")
        .send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(GalleryError::Status(status.as_u16()));
    }
    Ok(response.text()?)
}

/// Sort newest first by `createdAt`. Undated records go last, and ties keep
/// their stored order.
pub fn sort_newest_first(messages: &mut [Message]) {
    messages.sort_by_key(|m| std::cmp::Reverse(m.created_at_millis()));
}

/// Whether a message was created after the last visit.
pub fn is_new(message: &Message, last_visit: Option<i64>) -> bool {
    let Some(created) = message.created_at_millis() else {
        return false;
    };
    match last_visit {
        None => true,
        Some(marker) => created > marker,
    }
}

/// One rendered card.
#[derive(Debug, Clone)]
pub struct Card {
    pub message: Message,
    pub is_new: bool,
}

/// What the gallery shows.
#[derive(Debug, Clone)]
pub enum GalleryView {
    /// No letters, or they could not be loaded.
    Empty,
    Cards(Vec<Card>),
}

impl GalleryView {
    pub fn cards(&self) -> &[Card] {
        match self {
            GalleryView::Empty => &[],
            GalleryView::Cards(cards) => cards,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cards().is_empty()
    }

    pub fn new_count(&self) -> usize {
        self.cards().iter().filter(|c| c.is_new).count()
    }
}

/// Build the view from a load result, sorting and flagging new letters.
pub fn build_view(
    loaded: Result<Vec<Message>, GalleryError>,
    last_visit: Option<i64>,
) -> GalleryView {
    let mut messages = match loaded {
        Ok(messages) => messages,
        Err(e) => {
            tracing::error!(error = %e, "failed to load messages");
            return GalleryView::Empty;
        }
    };
    if messages.is_empty() {
        return GalleryView::Empty;
    }
    sort_newest_first(&mut messages);
    GalleryView::Cards(
        messages
            .into_iter()
            .map(|message| Card {
                is_new: is_new(&message, last_visit),
                message,
            })
            .collect(),
    )
}

/// Load the list and build the view against the stored last-visit marker.
///
/// The marker is left alone; call [`commit_visit`] once the view has actually
/// been shown.
pub fn present(source: &MessageSource, visits: &VisitStore) -> GalleryView {
    let last_visit = visits.last_visit();
    tracing::debug!(%source, ?last_visit, "loading gallery");
    build_view(load_messages(source), last_visit)
}

/// Move the last-visit marker to `now` after `view` was shown.
///
/// Only a view with cards counts as a visit. Failing to save is logged and
/// otherwise ignored.
pub fn commit_visit(view: &GalleryView, visits: &VisitStore, now: DateTime<Utc>) {
    if view.is_empty() {
        return;
    }
    if let Err(e) = visits.record_visit(now.timestamp_millis()) {
        tracing::warn!(error = %e, path = %visits.path().display(), "could not save last visit");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn millis(ts: &str) -> i64 {
        DateTime::parse_from_rfc3339(ts).unwrap().timestamp_millis()
    }

    #[test]
    fn source_parse() {
        assert_eq!(
            MessageSource::parse("https://example.com/data/messages.json"),
            MessageSource::Url("https://example.com/data/messages.json".into())
        );
        assert_eq!(
            MessageSource::parse("data/messages.json"),
            MessageSource::Path(PathBuf::from("data/messages.json"))
        );
    }

    #[test]
    fn sort_orders_newest_first() {
        let mut list = vec![
            message("a", "A", Some("2024-01-01T00:00:00.000Z")),
            message("c", "C", Some("2024-03-01T00:00:00.000Z")),
            message("b", "B", Some("2024-02-01T00:00:00.000Z")),
        ];
        sort_newest_first(&mut list);
        let ids: Vec<&str> = list.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn sort_puts_undated_last_and_is_stable() {
        let mut list = vec![
            message("x", "X", None),
            message("a", "A", Some("2024-01-01T00:00:00.000Z")),
            message("y", "Y", Some("garbage")),
            message("b", "B", Some("2024-02-01T00:00:00.000Z")),
        ];
        sort_newest_first(&mut list);
        let ids: Vec<&str> = list.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "x", "y"]);
    }

    #[test]
    fn sort_handles_offsets() {
        let mut list = vec![
            message("utc", "U", Some("2024-01-01T10:00:00Z")),
            message("plus2", "P", Some("2024-01-01T11:00:00+02:00")),
        ];
        sort_newest_first(&mut list);
        // 11:00+02:00 is 09:00Z, so the UTC record is newer.
        assert_eq!(list[0].id, "utc");
    }

    #[test]
    fn later_than_marker_is_new() {
        let m = message("a", "A", Some("2024-02-10T12:00:00.000Z"));
        assert!(is_new(&m, Some(millis("2024-02-10T11:59:59.999Z"))));
    }

    #[test]
    fn equal_or_earlier_than_marker_is_not_new() {
        let m = message("a", "A", Some("2024-02-10T12:00:00.000Z"));
        assert!(!is_new(&m, Some(millis("2024-02-10T12:00:00.000Z"))));
        assert!(!is_new(&m, Some(millis("2024-02-11T00:00:00.000Z"))));
    }

    #[test]
    fn undated_is_never_new() {
        let m = message("a", "A", None);
        assert!(!is_new(&m, None));
        assert!(!is_new(&m, Some(1)));
    }

    #[test]
    fn no_marker_makes_dated_messages_new() {
        let m = message("a", "A", Some("2024-02-10T12:00:00.000Z"));
        assert!(is_new(&m, None));
    }

    #[test]
    fn empty_list_is_empty_view() {
        let view = build_view(Ok(vec![]), None);
        assert!(matches!(view, GalleryView::Empty));
        assert!(view.cards().is_empty());
    }

    #[test]
    fn load_failure_is_empty_view() {
        let err = serde_json::from_str::<Vec<Message>>("{").unwrap_err();
        let view = build_view(Err(GalleryError::Json(err)), None);
        assert!(matches!(view, GalleryView::Empty));
    }

    #[test]
    fn view_flags_new_cards() {
        let marker = millis("2024-01-15T00:00:00.000Z");
        let view = build_view(Ok(sample_messages()), Some(marker));
        let flags: Vec<(&str, bool)> = view
            .cards()
            .iter()
            .map(|c| (c.message.id.as_str(), c.is_new))
            .collect();
        assert_eq!(
            flags,
            vec![("msg_3", true), ("msg_2", true), ("msg_1", false)]
        );
        assert_eq!(view.new_count(), 2);
    }

    #[test]
    fn present_reads_local_file_without_moving_marker() {
        let tmp = TempDir::new().unwrap();
        write_list(tmp.path(), &sample_messages());
        let visits = VisitStore::new(tmp.path().join("state.json"));
        let source = MessageSource::Path(tmp.path().join("data/messages.json"));

        let view = present(&source, &visits);
        assert_eq!(view.cards().len(), 3);
        assert_eq!(view.new_count(), 3);
        assert_eq!(visits.last_visit(), None);
    }

    #[test]
    fn committed_visit_clears_new_flags() {
        let tmp = TempDir::new().unwrap();
        write_list(tmp.path(), &sample_messages());
        let visits = VisitStore::new(tmp.path().join("state.json"));
        let source = MessageSource::Path(tmp.path().join("data/messages.json"));

        let view = present(&source, &visits);
        commit_visit(&view, &visits, fixed_now());
        assert_eq!(visits.last_visit(), Some(fixed_now().timestamp_millis()));

        // Second look: nothing is newer than the marker.
        assert_eq!(present(&source, &visits).new_count(), 0);
    }

    #[test]
    fn empty_view_does_not_count_as_visit() {
        let tmp = TempDir::new().unwrap();
        let visits = VisitStore::new(tmp.path().join("state.json"));
        commit_visit(&GalleryView::Empty, &visits, fixed_now());
        assert_eq!(visits.last_visit(), None);
    }

    #[test]
    fn present_malformed_file_matches_empty_list() {
        let tmp = TempDir::new().unwrap();
        let bad = tmp.path().join("bad.json");
        let empty = tmp.path().join("empty.json");
        fs::write(&bad, "[{\"id\": ").unwrap();
        fs::write(&empty, "[]").unwrap();
        let visits = VisitStore::new(tmp.path().join("state.json"));

        let from_bad = present(&MessageSource::Path(bad), &visits);
        let from_empty = present(&MessageSource::Path(empty), &visits);
        assert!(matches!(from_bad, GalleryView::Empty));
        assert!(matches!(from_empty, GalleryView::Empty));
    }

    #[test]
    fn present_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let visits = VisitStore::new(tmp.path().join("state.json"));
        let source = MessageSource::Path(tmp.path().join("nope.json"));
        assert!(present(&source, &visits).is_empty());
    }
}
