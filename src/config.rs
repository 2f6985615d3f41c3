//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user `config.toml` in the config directory overrides
//! any subset of keys.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [repository]
//! owner = ""                         # Repository owner (required to publish via GitHub)
//! name = ""                          # Repository name (required to publish via GitHub)
//! branch = "main"                    # Branch that receives commits
//! api_url = "https://api.github.com"
//!
//! [store]
//! backend = "github"                 # "github" or "directory"
//! root = "."                         # Root for the directory backend
//!
//! [paths]
//! messages = "data/messages.json"    # Message list file
//! uploads = "uploads"                # Directory for uploaded images
//!
//! [site]
//! title = "Letters for Us"
//! tagline = "Little notes, kept in one place."
//! cover_image = "assets/couple.jpg"
//! asset_base = ""                    # Prefix for image URLs in rendered pages
//!
//! [colors.light]
//! background = "#fbf6f1"
//! text = "#3a2b2f"
//! text_muted = "#8a7479"
//! border = "#e8d9d0"
//! accent = "#b04646"
//! badge = "#d9534f"
//!
//! [colors.dark]
//! background = "#1c1517"
//! text = "#f2e8e4"
//! text_muted = "#a8959a"
//! border = "#3b2f32"
//! accent = "#e08a8a"
//! badge = "#e06b67"
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! The access token is deliberately absent: it is passed per invocation and
//! only ever held in memory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Where the content API lives and which branch to commit to.
    pub repository: RepositoryConfig,
    /// Which content store backend `publish` writes to.
    pub store: StoreConfig,
    /// Repository-relative locations of the message list and uploads.
    pub paths: PathsConfig,
    /// Text and images on the rendered gallery page.
    pub site: PageConfig,
    /// Color schemes for light and dark modes.
    pub colors: ColorConfig,
}

impl SiteConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repository.branch.trim().is_empty() {
            return Err(ConfigError::Validation(
                "repository.branch must not be empty".into(),
            ));
        }
        if self.paths.messages.trim().is_empty() {
            return Err(ConfigError::Validation(
                "paths.messages must not be empty".into(),
            ));
        }
        if self.paths.uploads.trim().is_empty() {
            return Err(ConfigError::Validation(
                "paths.uploads must not be empty".into(),
            ));
        }
        if self.paths.messages.starts_with('/') || self.paths.uploads.starts_with('/') {
            return Err(ConfigError::Validation(
                "paths.messages and paths.uploads must be repository-relative".into(),
            ));
        }
        Ok(())
    }

    /// Checks that only matter when publishing through the hosted content API.
    pub fn validate_for_publish(&self) -> Result<(), ConfigError> {
        if self.store.backend == StoreBackend::GitHub {
            if self.repository.owner.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "repository.owner must be set to publish".into(),
                ));
            }
            if self.repository.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "repository.name must be set to publish".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Hosted repository settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryConfig {
    pub owner: String,
    pub name: String,
    pub branch: String,
    /// Base URL of the content API, without a trailing slash.
    pub api_url: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            name: String::new(),
            branch: "main".to_string(),
            api_url: "https://api.github.com".to_string(),
        }
    }
}

/// Content store backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Hosted repository content API.
    #[default]
    #[serde(rename = "github")]
    GitHub,
    /// A local directory, e.g. a working checkout of the site.
    Directory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Root directory for the `directory` backend.
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::GitHub,
            root: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Message list file.
    pub messages: String,
    /// Directory for uploaded images.
    pub uploads: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            messages: "data/messages.json".to_string(),
            uploads: "uploads".to_string(),
        }
    }
}

/// Rendered page settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    pub title: String,
    pub tagline: String,
    /// Image shown on the landing screen. Empty to omit.
    pub cover_image: String,
    /// Prefix for message image URLs, e.g. a raw-content URL of the branch.
    pub asset_base: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: "Letters for Us".to_string(),
            tagline: "Little notes, kept in one place.".to_string(),
            cover_image: "assets/couple.jpg".to_string(),
            asset_base: String::new(),
        }
    }
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    pub light: ColorScheme,
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

/// Individual color scheme (light or dark).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    pub background: String,
    pub text: String,
    /// Dates, event names, empty-state text.
    pub text_muted: String,
    pub border: String,
    /// Buttons and links.
    pub accent: String,
    /// The `NEW` badge.
    pub badge: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#fbf6f1".to_string(),
            text: "#3a2b2f".to_string(),
            text_muted: "#8a7479".to_string(),
            border: "#e8d9d0".to_string(),
            accent: "#b04646".to_string(),
            badge: "#d9534f".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#1c1517".to_string(),
            text: "#f2e8e4".to_string(),
            text_muted: "#a8959a".to_string(),
            border: "#3b2f32".to_string(),
            accent: "#e08a8a".to_string(),
            badge: "#e06b67".to_string(),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
pub fn load_config(dir: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Letters Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.
#
# The access token never goes in this file. Pass it with --token or the
# LETTERS_TOKEN environment variable.

# ---------------------------------------------------------------------------
# Hosted repository
# ---------------------------------------------------------------------------
[repository]
# Owner and name are required to publish through the content API.
owner = ""
name = ""
# Branch that receives the image and message-list commits.
branch = "main"
api_url = "https://api.github.com"

# ---------------------------------------------------------------------------
# Content store
# ---------------------------------------------------------------------------
[store]
# "github" writes through the content API.
# "directory" writes into a local checkout rooted at `root`.
backend = "github"
root = "."

# ---------------------------------------------------------------------------
# Repository-relative paths
# ---------------------------------------------------------------------------
[paths]
messages = "data/messages.json"
uploads = "uploads"

# ---------------------------------------------------------------------------
# Rendered page
# ---------------------------------------------------------------------------
[site]
title = "Letters for Us"
tagline = "Little notes, kept in one place."
# Landing-screen image. Leave empty to omit.
cover_image = "assets/couple.jpg"
# Prefix for message image URLs when the page is not served from the
# repository root (e.g. a raw-content URL).
asset_base = ""

# ---------------------------------------------------------------------------
# Colors - Light mode (prefers-color-scheme: light)
# ---------------------------------------------------------------------------
[colors.light]
background = "#fbf6f1"
text = "#3a2b2f"
text_muted = "#8a7479"    # Dates, event names, empty state
border = "#e8d9d0"
accent = "#b04646"        # Buttons and links
badge = "#d9534f"         # NEW badge

# ---------------------------------------------------------------------------
# Colors - Dark mode (prefers-color-scheme: dark)
# ---------------------------------------------------------------------------
[colors.dark]
background = "#1c1517"
text = "#f2e8e4"
text_muted = "#a8959a"
border = "#3b2f32"
accent = "#e08a8a"
badge = "#e06b67"
"##
}

/// Generate CSS custom properties from color config.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        r#":root {{
    --color-bg: {light_bg};
    --color-text: {light_text};
    --color-text-muted: {light_text_muted};
    --color-border: {light_border};
    --color-accent: {light_accent};
    --color-badge: {light_badge};
}}

@media (prefers-color-scheme: dark) {{
    :root {{
        --color-bg: {dark_bg};
        --color-text: {dark_text};
        --color-text-muted: {dark_text_muted};
        --color-border: {dark_border};
        --color-accent: {dark_accent};
        --color-badge: {dark_badge};
    }}
}}"#,
        light_bg = colors.light.background,
        light_text = colors.light.text,
        light_text_muted = colors.light.text_muted,
        light_border = colors.light.border,
        light_accent = colors.light.accent,
        light_badge = colors.light.badge,
        dark_bg = colors.dark.background,
        dark_text = colors.dark.text,
        dark_text_muted = colors.dark.text_muted,
        dark_border = colors.dark.border,
        dark_accent = colors.dark.accent,
        dark_badge = colors.dark.badge,
    )
}
