//! # page-assets
//!
//! The packaged page template, stylesheets and scripts used by `md2page` to
//! assemble a self-contained HTML document.
//!
//! ## How it works
//!
//! Every file under this crate's `assets/` directory is embedded into the
//! library at compile time by `build.rs`. Files are addressed by their path
//! relative to `assets/`, always with forward slashes:
//!
//! | Name                   | Purpose                                   |
//! |------------------------|-------------------------------------------|
//! | `templates/page.html`  | Page template with `{{ … }}` placeholders |
//! | `css/markdown.css`     | Primary document stylesheet               |
//! | `css/outline.css`      | Collapsible outline tree stylesheet       |
//! | `js/outline.js`        | Collapsible outline tree script           |
//! | `css/highlight.css`    | Syntax-highlighting stylesheet            |
//! | `js/highlight.js`      | Syntax-highlighting script                |
//! | `js/line-numbers.js`   | Line numbers for highlighted code blocks  |
//!
//! ## Usage
//!
//! ```rust
//! let css = page_assets::load("css/markdown.css").expect("packaged stylesheet");
//! assert!(!css.is_empty());
//! ```
//!
//! ## Environment variable overrides
//!
//! - `MD2PAGE_ASSETS_DIR` — a directory whose files take precedence over the
//!   embedded copies (same relative names). Files missing from the directory
//!   fall back to the embedded copy.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

include!(concat!(env!("OUT_DIR"), "/bundled_assets.rs"));

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable naming a directory of override files.
pub const ASSETS_DIR_ENV: &str = "MD2PAGE_ASSETS_DIR";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by page-assets operations.
#[derive(Error, Debug)]
pub enum AssetError {
    /// No packaged or override file exists under this name.
    #[error("Asset '{name}' is not packaged")]
    NotFound { name: String },

    /// The name is empty, absolute, or climbs out of the asset root.
    #[error("Invalid asset name '{name}'")]
    InvalidName { name: String },

    /// An override file exists but could not be read.
    #[error("Failed to read asset '{name}' from '{path}': {source}")]
    Read {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ── Process-wide override directory ──────────────────────────────────────────

static OVERRIDE_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Returns the override directory from `MD2PAGE_ASSETS_DIR`, if set.
///
/// The variable is read once per process.
pub fn override_dir() -> Option<&'static Path> {
    OVERRIDE_DIR
        .get_or_init(|| match std::env::var(ASSETS_DIR_ENV) {
            Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
            _ => None,
        })
        .as_deref()
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Names of every embedded asset, sorted.
pub fn names() -> impl Iterator<Item = &'static str> {
    BUNDLED.iter().map(|(name, _)| *name)
}

/// Returns the embedded bytes for `name`, ignoring any override directory.
pub fn bundled(name: &str) -> Option<&'static [u8]> {
    BUNDLED
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, bytes)| *bytes)
}

/// Loads an asset by name.
///
/// Checks the `MD2PAGE_ASSETS_DIR` override directory first, then the
/// embedded copy. Embedded bytes are returned borrowed (`'static`), so
/// repeated loads never copy.
pub fn load(name: &str) -> Result<Cow<'static, [u8]>, AssetError> {
    validate_name(name)?;

    if let Some(dir) = override_dir() {
        if let Some(bytes) = read_override(dir, name)? {
            return Ok(Cow::Owned(bytes));
        }
    }

    bundled(name)
        .map(Cow::Borrowed)
        .ok_or_else(|| AssetError::NotFound {
            name: name.to_string(),
        })
}

/// Loads an asset from `dir`, falling back to the embedded copy.
///
/// Does not consult `MD2PAGE_ASSETS_DIR`.
pub fn load_from(dir: &Path, name: &str) -> Result<Cow<'static, [u8]>, AssetError> {
    validate_name(name)?;

    if let Some(bytes) = read_override(dir, name)? {
        return Ok(Cow::Owned(bytes));
    }

    bundled(name)
        .map(Cow::Borrowed)
        .ok_or_else(|| AssetError::NotFound {
            name: name.to_string(),
        })
}

// ── Internal helpers ─────────────────────────────────────────────────────────

/// Rejects names that would escape the asset root of an override directory.
fn validate_name(name: &str) -> Result<(), AssetError> {
    let path = Path::new(name);
    let escapes = name.is_empty()
        || path.is_absolute()
        || path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
    if escapes {
        return Err(AssetError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn read_override(dir: &Path, name: &str) -> Result<Option<Vec<u8>>, AssetError> {
    let path = dir.join(name);
    match std::fs::read(&path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(AssetError::Read {
            name: name.to_string(),
            path,
            source,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
