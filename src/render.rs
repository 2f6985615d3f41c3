//! HTML rendering of the gallery page.
//!
//! Produces a single `index.html`:
//!
//! - **Landing** (`#top`): cover image, title, tagline, and an "Open" link that
//!   jumps to the letters.
//! - **Letters** (`#letters`): one envelope card per message, newest first,
//!   with a `NEW` badge where applicable, or the empty state.
//! - **Detail modals** (`#letter-N`): one per card, shown via `:target`.
//!   Closed by clicking the backdrop, the close button, or pressing Escape.
//!
//! ## CSS and JavaScript
//!
//! Static assets are embedded at compile time:
//! - `static/style.css`: base styles (colors injected from config)
//! - `static/modal.js`: Escape closes the open modal
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating,
//! so every title and message body is escaped.

use crate::config::{self, SiteConfig};
use crate::gallery::{Card, GalleryView};
use crate::types::Message;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const CSS_STATIC: &str = include_str!("../static/style.css");
const JS: &str = include_str!("../static/modal.js");

/// Render the gallery page and write it to `<output_dir>/index.html`.
pub fn write_site(
    view: &GalleryView,
    config: &SiteConfig,
    output_dir: &Path,
) -> Result<PathBuf, RenderError> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join("index.html");
    fs::write(&path, render_page(view, config).into_string())?;
    tracing::info!(path = %path.display(), cards = view.cards().len(), "wrote gallery page");
    Ok(path)
}

/// Render the full gallery page.
pub fn render_page(view: &GalleryView, config: &SiteConfig) -> Markup {
    let css = format!(
        "{}\n\n{}",
        config::generate_color_css(&config.colors),
        CSS_STATIC
    );
    let site = &config.site;
    let asset_base = site.asset_base.as_str();
    let cover_src = asset_url(asset_base, &site.cover_image);

    let content = html! {
        (landing(&site.title, &site.tagline, &cover_src))
        main.letters id="letters" {
            header.letters-header {
                h2 { "Letters" }
            }
            div.grid {
                @for (idx, card) in view.cards().iter().enumerate() {
                    (envelope_card(idx, card))
                }
            }
            p.empty-state.hidden[!view.is_empty()] {
                "No letters yet. Check back soon."
            }
        }
        @for (idx, card) in view.cards().iter().enumerate() {
            (detail_modal(idx, &card.message, asset_base))
        }
        script { (PreEscaped(JS)) }
    };

    base_document(&site.title, &css, content)
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, css: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(css)) }
            }
            body {
                (content)
            }
        }
    }
}

fn landing(title: &str, tagline: &str, cover_image: &str) -> Markup {
    html! {
        section.landing id="top" {
            @if !cover_image.is_empty() {
                img.landing-cover src=(cover_image) alt=(title);
            }
            h1.landing-title { (title) }
            @if !tagline.is_empty() {
                p.landing-tagline { (tagline) }
            }
            a.enter-button href="#letters" { "Open" }
        }
    }
}

fn modal_id(idx: usize) -> String {
    format!("letter-{}", idx + 1)
}

fn envelope_card(idx: usize, card: &Card) -> Markup {
    html! {
        a.envelope-card href={ "#" (modal_id(idx)) } {
            @if card.is_new {
                span.new-badge { "NEW" }
            }
            div.envelope-illustration {}
            h3.envelope-title { (card.message.display_title()) }
        }
    }
}

/// Prefix a repository-relative path with `asset_base`. Empty stays empty.
fn asset_url(asset_base: &str, path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!("{}{}", asset_base, path)
    }
}

fn detail_modal(idx: usize, message: &Message, asset_base: &str) -> Markup {
    let image_src = asset_url(asset_base, &message.image_url);
    html! {
        div.modal id=(modal_id(idx)) role="dialog" aria-modal="true" {
            a.modal-backdrop href="#letters" aria-label="Close" {}
            article.modal-content {
                a.modal-close href="#letters" aria-label="Close" { "×" }
                @if !message.image_url.is_empty() {
                    img.modal-image src=(image_src) alt=(message.display_title()) loading="lazy";
                }
                h2.modal-title { (message.display_title()) }
                @if !message.event_name.is_empty() {
                    p.modal-event { "Event: " (message.event_name) }
                }
                @if let Some(date) = long_date(message) {
                    p.modal-date { (date) }
                }
                p.modal-message { (message.message) }
            }
        }
    }
}

/// `createdAt` as a long-form date, e.g. `February 14, 2024`.
pub fn long_date(message: &Message) -> Option<String> {
    message
        .created_at_time()
        .map(|t| t.format("%B %-d, %Y").to_string())
}

// ============================================================================
// Tests
// ============================================================================
