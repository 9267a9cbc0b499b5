//! Conversion entry points.
//!
//! Every entry point runs the same sequence: read → parse → inline →
//! assemble → write. The document is fully built in memory before anything
//! is written, and file output goes through a temp file in the destination
//! directory that is renamed into place, so a failure at any stage leaves
//! no partial output behind.
//!
//! [`Converter`] holds the parser and asset bundle and can be shared by
//! reference across threads; the free functions build one per call.

use crate::assets::{AssetBundle, BundledAssets};
use crate::config::ConversionConfig;
use crate::error::Md2PageError;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::assemble::{self, AssembleOptions};
use crate::pipeline::inline::ImageInliner;
use crate::pipeline::input::{self, SourceDocument};
use crate::pipeline::parse::{MarkdownParser, ParserAdapter};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Title used when neither a hint nor an output file name is available.
pub const FALLBACK_TITLE: &str = "untitled";

/// A configured conversion pipeline.
///
/// # Example
/// ```rust
/// use md2page::{ConversionConfig, Converter};
///
/// let converter = Converter::new(ConversionConfig::default()).unwrap();
/// let out = converter
///     .convert_str("# Hello", "Greeting", std::path::Path::new("."))
///     .unwrap();
/// assert!(out.html.contains("<title>Greeting</title>"));
/// ```
pub struct Converter {
    config: ConversionConfig,
    parser: ParserAdapter,
    assets: Arc<dyn AssetBundle>,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("config", &self.config)
            .field("parser", &self.parser.backend_name())
            .finish_non_exhaustive()
    }
}

impl Converter {
    /// Build the configured parser over the packaged assets.
    pub fn new(config: ConversionConfig) -> Result<Self, Md2PageError> {
        Self::with_assets(config, Arc::new(BundledAssets))
    }

    /// Build the configured parser over a caller-supplied asset bundle.
    pub fn with_assets(
        config: ConversionConfig,
        assets: Arc<dyn AssetBundle>,
    ) -> Result<Self, Md2PageError> {
        let parser = ParserAdapter::new(config.backend, &config.profile)?;
        Ok(Self::from_parts(config, parser, assets))
    }

    /// Use an already-built parser and asset bundle.
    pub fn from_parts(
        config: ConversionConfig,
        parser: ParserAdapter,
        assets: Arc<dyn AssetBundle>,
    ) -> Self {
        Self {
            config,
            parser,
            assets,
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert an in-memory document.
    pub fn convert_document(&self, doc: &SourceDocument) -> Result<ConversionOutput, Md2PageError> {
        let total_start = Instant::now();
        info!(
            "Converting '{}' ({} bytes) with {}",
            doc.title,
            doc.markdown.len(),
            self.parser.backend_name()
        );

        // ── Step 1: Parse ────────────────────────────────────────────────
        let parse_start = Instant::now();
        let fragment = self.parser.parse(&doc.markdown);
        let parse_duration_ms = parse_start.elapsed().as_millis() as u64;
        debug!("Parsed to {} bytes of HTML in {}ms", fragment.len(), parse_duration_ms);

        // ── Step 2: Inline images ────────────────────────────────────────
        let inline_start = Instant::now();
        let (body, images) = if self.config.inline_images {
            let inlined = ImageInliner::new(&doc.base_dir)
                .media_type(self.config.media_type.clone())
                .max_bytes(self.config.max_image_bytes)
                .inline(&fragment)?;
            (inlined.html, inlined.report)
        } else {
            (fragment, Default::default())
        };
        let inline_duration_ms = inline_start.elapsed().as_millis() as u64;
        debug!(
            "Inlined {} image(s), {} remote, {} failed in {}ms",
            images.inlined,
            images.skipped_remote,
            images.failed(),
            inline_duration_ms
        );

        // ── Step 3: Assemble ─────────────────────────────────────────────
        let assemble_start = Instant::now();
        let opts = AssembleOptions {
            template: self.config.template.clone(),
            include_outline: self.config.include_outline,
            compact_assets: self.config.compact_assets,
        };
        let html = assemble::assemble(&doc.title, &body, self.assets.as_ref(), &opts)?;
        let assemble_duration_ms = assemble_start.elapsed().as_millis() as u64;
        debug!("Assembled page in {}ms", assemble_duration_ms);

        let stats = ConversionStats {
            input_bytes: doc.markdown.len(),
            output_bytes: html.len(),
            images_inlined: images.inlined,
            images_skipped_remote: images.skipped_remote,
            images_failed: images.failed(),
            parse_duration_ms,
            inline_duration_ms,
            assemble_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };
        info!(
            "Conversion complete: {} bytes, {} image(s) inlined, {}ms total",
            stats.output_bytes, stats.images_inlined, stats.total_duration_ms
        );

        Ok(ConversionOutput {
            html,
            title: doc.title.clone(),
            images,
            stats,
        })
    }

    /// Convert Markdown text; relative images resolve against `base_dir`
    /// unless the config names an override.
    pub fn convert_str(
        &self,
        markdown: &str,
        title: &str,
        base_dir: &Path,
    ) -> Result<ConversionOutput, Md2PageError> {
        let base_dir = self.config.image_base_dir.as_deref().unwrap_or(base_dir);
        let doc = SourceDocument::new(markdown.to_string(), title, base_dir);
        self.convert_document(&doc)
    }

    /// Convert a Markdown file and write the page next to it (or to `output`).
    ///
    /// Returns the path written and the conversion output.
    pub fn convert_file(
        &self,
        input_path: &Path,
        output_path: Option<&Path>,
        title_hint: Option<&str>,
    ) -> Result<(PathBuf, ConversionOutput), Md2PageError> {
        let output_path = output_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_output_path(input_path));

        let markdown = input::read_markdown(input_path)?;
        let title = derive_title(title_hint, &output_path);
        let base_dir = self
            .config
            .image_base_dir
            .clone()
            .unwrap_or_else(|| input::parent_dir(input_path));
        let doc = SourceDocument::new(markdown, title, base_dir);

        let output = self.convert_document(&doc)?;
        write_atomic(&output_path, output.html.as_bytes())?;
        info!("Wrote {}", output_path.display());
        Ok((output_path, output))
    }
}

// ── Free functions ───────────────────────────────────────────────────────

/// Convert Markdown text to a complete HTML page.
///
/// Relative image paths resolve against `base_dir`, unless
/// `config.image_base_dir` names an override.
///
/// # Example
/// ```rust
/// use md2page::{convert_str, ConversionConfig};
/// use std::path::Path;
///
/// let out = convert_str("# Hello", "Greeting", Path::new("."), &ConversionConfig::default()).unwrap();
/// assert!(out.html.contains("<h1 id=\"hello\">Hello</h1>"));
/// ```
pub fn convert_str(
    markdown: &str,
    title: &str,
    base_dir: &Path,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Md2PageError> {
    Converter::new(config.clone())?.convert_str(markdown, title, base_dir)
}

/// Read Markdown from `input`, convert it, and write the page to `output`.
///
/// Relative images resolve as in [`convert_str`]. The page is written with
/// a single `write_all` once it is complete.
pub fn convert(
    input: impl Read,
    mut output: impl Write,
    title: &str,
    base_dir: &Path,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Md2PageError> {
    let markdown = input::read_from(input, "<input>")?;
    let result = convert_str(&markdown, title, base_dir, config)?;
    output
        .write_all(result.html.as_bytes())
        .and_then(|()| output.flush())
        .map_err(|source| Md2PageError::OutputWriteFailed {
            path: PathBuf::from("<output>"),
            source,
        })?;
    Ok(result)
}

/// Convert a Markdown file to an HTML file.
///
/// `output_path` defaults to [`default_output_path`]; the title is
/// `title_hint` when non-empty, otherwise the output file's base name.
/// Relative images resolve against the input file's directory unless
/// `config.image_base_dir` is set.
pub fn convert_to_file(
    input_path: impl AsRef<Path>,
    output_path: Option<&Path>,
    title_hint: Option<&str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Md2PageError> {
    let converter = Converter::new(config.clone())?;
    converter
        .convert_file(input_path.as_ref(), output_path, title_hint)
        .map(|(_, output)| output)
}

/// The input path with its extension replaced by `.html`.
///
/// An input that already ends in `.html` gets `.html` appended instead so
/// it is never overwritten.
pub fn default_output_path(input: &Path) -> PathBuf {
    let is_html = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html"));
    if is_html {
        let mut name = input.as_os_str().to_os_string();
        name.push(".html");
        PathBuf::from(name)
    } else {
        input.with_extension("html")
    }
}

/// Non-empty `hint`, else the output file's base name, else [`FALLBACK_TITLE`].
pub fn derive_title(hint: Option<&str>, output_path: &Path) -> String {
    if let Some(hint) = hint.map(str::trim).filter(|h| !h.is_empty()) {
        return hint.to_string();
    }
    output_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().trim().to_string())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| FALLBACK_TITLE.to_string())
}

/// Atomic write: temp file in the destination directory, then rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Md2PageError> {
    let write_err = |source: std::io::Error| Md2PageError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = input::parent_dir(path);
    std::fs::create_dir_all(&dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
