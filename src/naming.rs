//! Naming rules for uploaded images and new message records.
//!
//! ## Image Names
//!
//! An uploaded image is stored as `<uploads>/<slug>-<millis>.<ext>`:
//! - `slug` is the message title reduced to lowercase ASCII letters, digits and
//!   single hyphens (`"Happy Anniversary!!"` → `happy-anniversary`). A title
//!   with nothing usable in it becomes `message`.
//! - `millis` is the submission time in epoch milliseconds, which is what keeps
//!   two uploads with the same title apart.
//! - `ext` is the original file's extension, `jpg` if it has none.
//!
//! ## Message Ids
//!
//! `msg_<millis>`, taken from the same clock reading. Two submissions in the
//! same millisecond collide; nothing guards against that.

use std::path::Path;

/// Slug used when the title has no letters or digits at all.
const FALLBACK_SLUG: &str = "message";

/// Extension used when the uploaded file has none.
const FALLBACK_EXTENSION: &str = "jpg";

/// Reduce a title to a storage-safe slug.
///
/// - `"Happy Anniversary!!"` → `"happy-anniversary"`
/// - `"  Our  First   Trip "` → `"our-first-trip"`
/// - `"2024 -- Paris"` → `"2024-paris"`
/// - `"!!!"` → `""`
pub fn sanitize_title(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Extension of an uploaded file name, or `jpg` when there is none.
pub fn image_extension(file_name: &str) -> &str {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .unwrap_or(FALLBACK_EXTENSION)
}

/// File name for an uploaded image: `<slug>-<millis>.<ext>`.
pub fn image_file_name(title: &str, original_file_name: &str, millis: i64) -> String {
    let slug = sanitize_title(title);
    let slug = if slug.is_empty() {
        FALLBACK_SLUG
    } else {
        slug.as_str()
    };
    format!(
        "{}-{}.{}",
        slug,
        millis,
        image_extension(original_file_name)
    )
}

/// Repository path of an uploaded image inside the uploads directory.
pub fn image_storage_path(uploads_dir: &str, file_name: &str) -> String {
    let dir = uploads_dir.trim_matches('/');
    if dir.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", dir, file_name)
    }
}

/// Id for a new message record.
pub fn message_id(millis: i64) -> String {
    format!("msg_{}", millis)
}
