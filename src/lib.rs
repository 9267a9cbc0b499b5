//! # md2page
//!
//! Convert Markdown documents into single, self-contained HTML pages.
//!
//! The output has no external file dependencies: local images are embedded
//! as `data:` URIs and the stylesheets and scripts (syntax highlighting, a
//! collapsible outline tree) are packaged into the page itself, so the single
//! file renders the same wherever it is copied.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Input     read bytes, strip BOM, decode UTF-8
//!  ├─ 2. Parse     pulldown-cmark or comrak → HTML fragment,
//!  │               then heading anchors and [TOC] expansion
//!  ├─ 3. Inline    local <img src> → data:<media-type>;base64,…
//!  ├─ 4. Assemble  page template + title + body + CSS/JS assets
//!  └─ 5. Output    atomic write (temp file + rename)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use md2page::{convert_to_file, ConversionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     // Writes notes.html next to notes.md.
//!     let output = convert_to_file("notes.md", None, None, &config)?;
//!     eprintln!(
//!         "{} bytes, {} image(s) inlined, {} warning(s)",
//!         output.stats.output_bytes,
//!         output.stats.images_inlined,
//!         output.images.warnings.len()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature    | Default | Description |
//! |------------|---------|-------------|
//! | `cli`      | on      | Enables the `md2page` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `pulldown` | on      | The pulldown-cmark parser backend |
//! | `comrak`   | on      | The comrak parser backend |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! md2page = { version = "0.1", default-features = false, features = ["pulldown"] }
//! ```
//!
//! ## Choosing a Backend
//!
//! | Backend    | Strengths | Missing |
//! |------------|-----------|---------|
//! | `pulldown` | Fast, strict CommonMark | bare autolinks, wiki-links |
//! | `comrak`   | Full GFM plus wiki-links and front matter | — |
//!
//! Heading anchors and the `[TOC]` marker work identically on both.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod assets;
pub mod batch;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod profile;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use assets::{AssetBundle, AssetSlot, BundledAssets, DirectoryAssets, MemoryAssets};
pub use batch::{batch_output_path, convert_batch};
pub use config::{ConversionConfig, ConversionConfigBuilder, MediaTypePolicy, ParserBackend};
pub use convert::{
    convert, convert_str, convert_to_file, default_output_path, derive_title, Converter,
};
pub use error::{ImageWarning, Md2PageError};
pub use output::{BatchItem, ConversionOutput, ConversionStats, InlineReport};
pub use pipeline::inline::ImageInliner;
pub use pipeline::parse::{MarkdownParser, ParserAdapter};
pub use profile::{Extension, ExtensionProfile, ExtensionProfileBuilder, TocLevels};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
