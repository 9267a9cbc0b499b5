//! Asset sources for the document assembler.
//!
//! The assembler never touches the filesystem or the embedded bundle
//! directly; it asks an [`AssetBundle`] for named payloads. Three sources
//! are provided:
//!
//! * [`BundledAssets`] — the files packaged in the `page-assets` crate,
//!   honouring the `MD2PAGE_ASSETS_DIR` override directory
//! * [`DirectoryAssets`] — files under an explicit directory, falling back
//!   to the packaged copy
//! * [`MemoryAssets`] — an in-memory map, for embedding callers and tests

use crate::error::Md2PageError;
use page_assets::AssetError;
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Supplies template, stylesheet and script bytes by logical name.
///
/// Shared read-only across batch workers, hence `Send + Sync`.
pub trait AssetBundle: Send + Sync {
    /// Load the payload registered under `name`.
    ///
    /// A name with no payload is [`Md2PageError::AssetMissing`].
    fn load(&self, name: &str) -> Result<Cow<'_, [u8]>, Md2PageError>;
}

/// A stylesheet or script slot in the page template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetSlot {
    MarkdownCss,
    OutlineCss,
    OutlineJs,
    HighlightCss,
    HighlightJs,
    LineNumbersJs,
}

impl AssetSlot {
    pub const ALL: [AssetSlot; 6] = [
        AssetSlot::MarkdownCss,
        AssetSlot::OutlineCss,
        AssetSlot::OutlineJs,
        AssetSlot::HighlightCss,
        AssetSlot::HighlightJs,
        AssetSlot::LineNumbersJs,
    ];

    /// Placeholder name as written in the template (`{{ markdown_css }}`).
    pub fn placeholder(self) -> &'static str {
        match self {
            AssetSlot::MarkdownCss => "markdown_css",
            AssetSlot::OutlineCss => "outline_css",
            AssetSlot::OutlineJs => "outline_js",
            AssetSlot::HighlightCss => "highlight_css",
            AssetSlot::HighlightJs => "highlight_js",
            AssetSlot::LineNumbersJs => "line_numbers_js",
        }
    }

    /// Asset name the slot is filled from.
    pub fn asset_name(self) -> &'static str {
        match self {
            AssetSlot::MarkdownCss => "css/markdown.css",
            AssetSlot::OutlineCss => "css/outline.css",
            AssetSlot::OutlineJs => "js/outline.js",
            AssetSlot::HighlightCss => "css/highlight.css",
            AssetSlot::HighlightJs => "js/highlight.js",
            AssetSlot::LineNumbersJs => "js/line-numbers.js",
        }
    }

    /// Slots belonging to the collapsible outline widget.
    pub fn is_outline(self) -> bool {
        matches!(self, AssetSlot::OutlineCss | AssetSlot::OutlineJs)
    }

    pub fn from_placeholder(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.placeholder() == name)
    }
}

fn map_asset_error(err: AssetError) -> Md2PageError {
    match err {
        AssetError::NotFound { name } => Md2PageError::AssetMissing { name },
        AssetError::InvalidName { name } => Md2PageError::AssetLoadFailed {
            name,
            detail: "name must be a relative path inside the asset root".into(),
        },
        AssetError::Read { name, path, source } => Md2PageError::AssetLoadFailed {
            name,
            detail: format!("{}: {source}", path.display()),
        },
    }
}

// ── Packaged assets ──────────────────────────────────────────────────────

/// The assets embedded in the `page-assets` crate.
///
/// Embedded bytes are `'static` and borrowed on every load. If
/// `MD2PAGE_ASSETS_DIR` is set, files in that directory win.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledAssets;

impl AssetBundle for BundledAssets {
    fn load(&self, name: &str) -> Result<Cow<'_, [u8]>, Md2PageError> {
        page_assets::load(name).map_err(map_asset_error)
    }
}

// ── Directory override ───────────────────────────────────────────────────

/// Assets read from a directory, falling back to the packaged copy for
/// names the directory does not contain.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    dir: PathBuf,
}

impl DirectoryAssets {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl AssetBundle for DirectoryAssets {
    fn load(&self, name: &str) -> Result<Cow<'_, [u8]>, Md2PageError> {
        page_assets::load_from(&self.dir, name).map_err(map_asset_error)
    }
}

// ── In-memory ────────────────────────────────────────────────────────────

/// Assets held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    items: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every packaged asset, ignoring `MD2PAGE_ASSETS_DIR`.
    pub fn from_bundled() -> Self {
        let items = page_assets::names()
            .filter_map(|name| {
                page_assets::bundled(name).map(|bytes| (name.to_string(), bytes.to_vec()))
            })
            .collect();
        Self { items }
    }

    pub fn with(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.items.insert(name.into(), bytes.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        self.items.remove(name)
    }
}

impl AssetBundle for MemoryAssets {
    fn load(&self, name: &str) -> Result<Cow<'_, [u8]>, Md2PageError> {
        self.items
            .get(name)
            .map(|bytes| Cow::Borrowed(bytes.as_slice()))
            .ok_or_else(|| Md2PageError::AssetMissing {
                name: name.to_string(),
            })
    }
}
