//! Configuration types for Markdown-to-HTML conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. One struct holds every knob so the
//! same config can be shared read-only by batch workers and logged as a
//! whole when two runs need comparing.

use crate::error::Md2PageError;
use crate::profile::ExtensionProfile;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Media type used when the legacy fixed-tag behaviour is requested.
pub const LEGACY_IMAGE_MEDIA_TYPE: &str = "image/jpeg";

/// Name of the packaged page template.
pub const DEFAULT_TEMPLATE: &str = "templates/page.html";

/// Configuration for a Markdown-to-HTML conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use md2page::{ConversionConfig, ParserBackend};
///
/// let config = ConversionConfig::builder()
///     .backend(ParserBackend::Pulldown)
///     .include_outline(false)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Which Markdown parser implementation renders the body. Default: [`ParserBackend::Pulldown`].
    pub backend: ParserBackend,

    /// Optional syntax enabled for the parser. Default: [`ExtensionProfile::default()`].
    pub profile: ExtensionProfile,

    /// Directory relative image paths are resolved against.
    ///
    /// Overrides the directory the caller supplies: the input file's
    /// directory for file conversions, the `base_dir` argument for
    /// in-memory and stream conversions.
    pub image_base_dir: Option<PathBuf>,

    /// Embed local images as `data:` URIs. Default: true.
    pub inline_images: bool,

    /// How the media type of an embedded image is chosen. Default: [`MediaTypePolicy::Sniff`].
    pub media_type: MediaTypePolicy,

    /// Images larger than this many bytes stay referenced. Default: None (no limit).
    pub max_image_bytes: Option<u64>,

    /// Include the collapsible outline tree stylesheet/script. Default: true.
    ///
    /// When false, the outline placeholders are left empty and the outline
    /// assets are not required to exist.
    pub include_outline: bool,

    /// Strip line breaks from stylesheet/script text before embedding. Default: true.
    pub compact_assets: bool,

    /// Asset name of the page template. Default: [`DEFAULT_TEMPLATE`].
    pub template: String,

    /// Worker threads for batch conversion. Default: number of CPUs.
    pub concurrency: usize,

    /// Optional batch progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            backend: ParserBackend::default(),
            profile: ExtensionProfile::default(),
            image_base_dir: None,
            inline_images: true,
            media_type: MediaTypePolicy::default(),
            max_image_bytes: None,
            include_outline: true,
            compact_assets: true,
            template: DEFAULT_TEMPLATE.to_string(),
            concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("backend", &self.backend)
            .field("profile", &self.profile)
            .field("image_base_dir", &self.image_base_dir)
            .field("inline_images", &self.inline_images)
            .field("media_type", &self.media_type)
            .field("max_image_bytes", &self.max_image_bytes)
            .field("include_outline", &self.include_outline)
            .field("compact_assets", &self.compact_assets)
            .field("template", &self.template)
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn backend(mut self, backend: ParserBackend) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn profile(mut self, profile: ExtensionProfile) -> Self {
        self.config.profile = profile;
        self
    }

    pub fn image_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.image_base_dir = Some(dir.into());
        self
    }

    pub fn inline_images(mut self, v: bool) -> Self {
        self.config.inline_images = v;
        self
    }

    pub fn media_type(mut self, policy: MediaTypePolicy) -> Self {
        self.config.media_type = policy;
        self
    }

    pub fn max_image_bytes(mut self, limit: u64) -> Self {
        self.config.max_image_bytes = Some(limit);
        self
    }

    pub fn include_outline(mut self, v: bool) -> Self {
        self.config.include_outline = v;
        self
    }

    pub fn compact_assets(mut self, v: bool) -> Self {
        self.config.compact_assets = v;
        self
    }

    pub fn template(mut self, name: impl Into<String>) -> Self {
        self.config.template = name.into();
        self
    }

    /// Worker count for batch conversion; `0` is raised to `1`.
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Md2PageError> {
        let c = &self.config;
        if c.template.trim().is_empty() {
            return Err(Md2PageError::InvalidConfig(
                "Template name must not be empty".into(),
            ));
        }
        if let MediaTypePolicy::Fixed(ref mt) = c.media_type {
            if !mt.contains('/') || mt.contains(';') || mt.contains(',') {
                return Err(Md2PageError::InvalidConfig(format!(
                    "Fixed media type must look like 'type/subtype', got '{mt}'"
                )));
            }
        }
        let levels = c.profile.toc_levels;
        crate::profile::TocLevels::new(levels.min(), levels.max())?;
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Markdown parser implementation.
///
/// Both backends agree on the core rendering (headings, emphasis, links,
/// lists, blockquotes, escaped `<pre><code>` blocks) and differ in which
/// [`crate::profile::Extension`]s they honour:
///
/// | Backend    | Crate          | Not supported                          |
/// |------------|----------------|----------------------------------------|
/// | `Pulldown` | pulldown-cmark | autolinks, wiki-links                  |
/// | `Comrak`   | comrak         | —                                      |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserBackend {
    /// pulldown-cmark: fast, strict CommonMark with GFM-style extensions. (default)
    #[default]
    Pulldown,
    /// comrak: GFM superset with autolinks, wiki-links and front matter.
    Comrak,
}

impl ParserBackend {
    pub fn name(self) -> &'static str {
        match self {
            ParserBackend::Pulldown => "pulldown",
            ParserBackend::Comrak => "comrak",
        }
    }
}

impl fmt::Display for ParserBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the media type in an embedded `data:` URI is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MediaTypePolicy {
    /// Detect from the file's magic bytes, then its extension. (default)
    #[default]
    Sniff,
    /// Always use this media type, whatever the file contains.
    ///
    /// `Fixed(LEGACY_IMAGE_MEDIA_TYPE.into())` reproduces documents produced
    /// by tools that tagged every image as JPEG.
    Fixed(String),
}

impl MediaTypePolicy {
    /// The legacy policy: every image tagged `image/jpeg`.
    pub fn legacy() -> Self {
        MediaTypePolicy::Fixed(LEGACY_IMAGE_MEDIA_TYPE.to_string())
    }
}
