//! Last-visit marker.
//!
//! The gallery flags letters created since the viewer last looked. The marker
//! is one key, [`LAST_VISIT_KEY`], holding epoch milliseconds in a small JSON
//! state file. It is read before a render and overwritten after it. There is
//! no expiry.
//!
//! A missing, unreadable, or garbled state file reads as "no marker", which
//! makes every dated letter new.

use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Key under which the marker is stored.
pub const LAST_VISIT_KEY: &str = "letters_last_visit";

/// File-backed key/value state holding the last-visit marker.
#[derive(Debug, Clone)]
pub struct VisitStore {
    path: PathBuf,
}

impl VisitStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_state(&self) -> Map<String, Value> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| serde_json::from_str::<Map<String, Value>>(&s).ok())
            .unwrap_or_default()
    }

    /// Last-visit time in epoch milliseconds, if recorded.
    ///
    /// Zero and negative values count as unset.
    pub fn last_visit(&self) -> Option<i64> {
        self.read_state()
            .get(LAST_VISIT_KEY)
            .and_then(|v| match v {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .filter(|ms| *ms > 0)
    }

    /// Overwrite the marker, keeping any other keys in the state file.
    pub fn record_visit(&self, millis: i64) -> io::Result<()> {
        let mut state = self.read_state();
        state.insert(LAST_VISIT_KEY.to_string(), Value::from(millis));
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&state)?;
        fs::write(&self.path, json)
    }
}
