//! # Letters
//!
//! A small gallery of letters kept in a hosted repository. Each letter is a
//! title, a message, an image, an optional event name, and a creation
//! timestamp. The whole collection lives in one JSON file next to the
//! uploaded images; there is no server and no database.
//!
//! # Two Flows, One File
//!
//! ```text
//! publish   form input ─┬─ put  uploads/<slug>-<millis>.<ext>      (create only)
//!                       ├─ get  data/messages.json → list, revision
//!                       └─ put  data/messages.json ← [new, ...list] (if revision current)
//!
//! render    data/messages.json → sort newest first → flag new → index.html
//! list      data/messages.json → sort newest first → flag new → stdout
//! ```
//!
//! The revision token is the only concurrency control. Two publishers racing
//! on the list: the second write carries a stale revision and is rejected.
//! There is no retry and no merge; the loser resubmits. The two writes of a
//! publish are not a transaction either, so a rejected list write leaves its
//! image behind, unreferenced.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`publish`] | Validate, upload the image, read-modify-write the message list |
//! | [`gallery`] | Load the list (uncached), sort, flag new letters, build the view |
//! | [`render`] | Static HTML page: landing, cards, detail modals (Maud) |
//! | [`store`] | `ContentStore` trait, revisions, base64 content, directory store |
//! | [`github`] | `ContentStore` over the hosted repository content API |
//! | [`visit`] | Last-visit marker persisted between runs |
//! | [`config`] | `config.toml` loading, validation, merging, and CSS generation |
//! | [`types`] | The persisted `Message` record |
//! | [`naming`] | Title slugs, image names, message ids |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Optimistic Writes, No Retries
//!
//! Rewriting the list re-reads nothing and merges nothing. A retry loop would
//! hide a lost race from the person publishing; a rejected write is reported
//! as a failed upload instead.
//!
//! ## One Generic Failure Message
//!
//! Whether the token was wrong, the network was down, or someone else
//! published first, the person at the form sees the same sentence. The cause
//! goes to the log (`RUST_LOG=letters=debug` for the full picture).
//!
//! ## Token Stays in Memory
//!
//! The access token comes from `--token` or `LETTERS_TOKEN`, is sent per
//! request, and is never written anywhere by this tool.

pub mod config;
pub mod gallery;
pub mod github;
pub mod naming;
pub mod output;
pub mod publish;
pub mod render;
pub mod store;
pub mod types;
pub mod visit;

#[cfg(test)]
pub(crate) mod test_helpers;
