//! Error types for the md2page library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Md2PageError`] — **Fatal**: the document cannot be produced at all
//!   (unreadable input, missing template or stylesheet, failed write).
//!   Returned as `Err(Md2PageError)` from the `convert*` functions.
//!
//! * [`ImageWarning`] — **Non-fatal**: a single image reference could not be
//!   inlined (missing file, unreadable, oversize). The original `src` is kept
//!   and the warning is stored in [`crate::output::InlineReport`] so callers
//!   can report it without losing the whole document to one bad image.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the md2page library.
///
/// Per-image failures use [`ImageWarning`] and are collected in
/// [`crate::output::InlineReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Md2PageError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Markdown file not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input exists but reading it failed part-way.
    #[error("Failed to read input '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Asset errors ──────────────────────────────────────────────────────
    /// A template, stylesheet or script required by the page is not packaged.
    #[error("Required asset '{name}' is missing from the asset bundle")]
    AssetMissing { name: String },

    /// The asset exists but could not be loaded.
    #[error("Failed to load asset '{name}': {detail}")]
    AssetLoadFailed { name: String, detail: String },

    /// The page template references a placeholder nothing can fill.
    #[error("Template '{template}' is invalid: {detail}")]
    TemplateInvalid { template: String, detail: String },

    // ── Rewrite errors ────────────────────────────────────────────────────
    /// The HTML rewriter rejected the fragment.
    #[error("HTML rewrite failed during {stage}: {detail}")]
    HtmlRewriteFailed { stage: &'static str, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output HTML file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal problem with a single image reference.
///
/// The element keeps its original `src`; conversion continues.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ImageWarning {
    /// The `src` could not be turned into a local path (bad `file:` URI etc.).
    #[error("Image '{src}': cannot resolve to a local path: {detail}")]
    Unresolvable { src: String, detail: String },

    /// The resolved file does not exist.
    #[error("Image '{src}': file not found at '{path}'")]
    NotFound { src: String, path: PathBuf },

    /// The file exists but reading it failed.
    #[error("Image '{src}': failed to read '{path}': {detail}")]
    ReadFailed {
        src: String,
        path: PathBuf,
        detail: String,
    },

    /// The file exceeds the configured inlining limit.
    #[error("Image '{src}': {size} bytes exceeds the {limit}-byte inlining limit")]
    TooLarge { src: String, size: u64, limit: u64 },
}

impl ImageWarning {
    /// The original `src` attribute value this warning refers to.
    pub fn src(&self) -> &str {
        match self {
            ImageWarning::Unresolvable { src, .. }
            | ImageWarning::NotFound { src, .. }
            | ImageWarning::ReadFailed { src, .. }
            | ImageWarning::TooLarge { src, .. } => src,
        }
    }
}
