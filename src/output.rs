//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Publish
//!
//! ```text
//! Published Happy Anniversary!!
//!     Id: msg_1707903000000
//!     Image: uploads/happy-anniversary-1707903000000.jpg
//!     Event: Anniversary
//!     Letters: 4
//! ```
//!
//! ## List
//!
//! ```text
//! Letters (3, 1 new)
//! 001 Third  NEW
//!     February 10, 2024 · Event: Birthday
//!     Image: uploads/msg_3.jpg
//! 002 Second
//!     January 20, 2024
//!     Image: uploads/msg_2.jpg
//! ```
//!
//! An empty or unreadable list prints `No letters yet.`
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O.

use crate::gallery::GalleryView;
use crate::publish::Published;
use crate::render;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

pub fn format_publish_output(published: &Published) -> Vec<String> {
    let msg = &published.message;
    let mut lines = vec![
        format!("Published {}", msg.display_title()),
        format!("{}Id: {}", indent(1), msg.id),
        format!("{}Image: {}", indent(1), published.image_path),
    ];
    if !msg.event_name.is_empty() {
        lines.push(format!("{}Event: {}", indent(1), msg.event_name));
    }
    lines.push(format!("{}Letters: {}", indent(1), published.total_messages));
    lines
}

pub fn print_publish_output(published: &Published) {
    for line in format_publish_output(published) {
        println!("{}", line);
    }
}

pub fn format_gallery_output(view: &GalleryView) -> Vec<String> {
    if view.is_empty() {
        return vec!["No letters yet.".to_string()];
    }

    let cards = view.cards();
    let mut lines = vec![format!("Letters ({}, {} new)", cards.len(), view.new_count())];
    for (i, card) in cards.iter().enumerate() {
        let msg = &card.message;
        let badge = if card.is_new { "  NEW" } else { "" };
        lines.push(format!(
            "{} {}{}",
            format_index(i + 1),
            msg.display_title(),
            badge
        ));

        let mut details = Vec::new();
        if let Some(date) = render::long_date(msg) {
            details.push(date);
        }
        if !msg.event_name.is_empty() {
            details.push(format!("Event: {}", msg.event_name));
        }
        if !details.is_empty() {
            lines.push(format!("{}{}", indent(1), details.join(" · ")));
        }
        if !msg.image_url.is_empty() {
            lines.push(format!("{}Image: {}", indent(1), msg.image_url));
        }
    }
    lines
}

pub fn print_gallery_output(view: &GalleryView) {
    for line in format_gallery_output(view) {
        println!("{}", line);
    }
}
