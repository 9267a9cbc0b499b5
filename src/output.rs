//! Result types returned by the conversion entry points.

use crate::error::ImageWarning;
use serde::{Deserialize, Serialize};

/// The result of converting one Markdown document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The complete, self-contained HTML document.
    pub html: String,

    /// The title placed in `<title>` (unescaped).
    pub title: String,

    /// What the image inliner did to the body.
    pub images: InlineReport,

    /// Byte counts and stage timings.
    pub stats: ConversionStats,
}

/// Outcome of one image-inlining pass over an HTML fragment.
///
/// Every `<img>` with a non-empty `src` lands in exactly one bucket:
/// inlined, remote, already-embedded, or a warning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineReport {
    /// Images whose `src` was replaced by a `data:` URI.
    pub inlined: usize,

    /// Images left alone because they point at a network resource.
    pub skipped_remote: usize,

    /// Images that were already `data:` URIs.
    pub already_embedded: usize,

    /// Images whose original `src` was kept because inlining failed.
    pub warnings: Vec<ImageWarning>,
}

impl InlineReport {
    /// Number of images that could not be inlined.
    pub fn failed(&self) -> usize {
        self.warnings.len()
    }

    /// True when nothing was inlined or skipped and nothing failed.
    pub fn is_empty(&self) -> bool {
        self.inlined == 0
            && self.skipped_remote == 0
            && self.already_embedded == 0
            && self.warnings.is_empty()
    }
}

/// Aggregate statistics for a single conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Bytes of Markdown read (after BOM stripping).
    pub input_bytes: usize,
    /// Bytes of HTML produced.
    pub output_bytes: usize,
    pub images_inlined: usize,
    pub images_skipped_remote: usize,
    pub images_failed: usize,
    /// Wall-clock time in the parser backend and heading pass.
    pub parse_duration_ms: u64,
    /// Wall-clock time spent inlining images.
    pub inline_duration_ms: u64,
    /// Wall-clock time spent loading assets and filling the template.
    pub assemble_duration_ms: u64,
    /// Wall-clock time for the whole conversion.
    pub total_duration_ms: u64,
}

/// Result of converting one file in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    /// Input Markdown path.
    pub input: std::path::PathBuf,
    /// Output HTML path (whether or not it was written).
    pub output: std::path::PathBuf,
    /// Statistics when the document was written; `None` on failure.
    pub stats: Option<ConversionStats>,
    /// Image warnings for this document.
    pub warnings: Vec<ImageWarning>,
    /// The rendered fatal error when the document failed.
    pub error: Option<String>,
}

impl BatchItem {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report() {
        let r = InlineReport::default();
        assert!(r.is_empty());
        assert_eq!(r.failed(), 0);
    }

    #[test]
    fn report_counts_warnings_as_failures() {
        let r = InlineReport {
            inlined: 2,
            warnings: vec![ImageWarning::NotFound {
                src: "a.png".into(),
                path: "/x/a.png".into(),
            }],
            ..Default::default()
        };
        assert!(!r.is_empty());
        assert_eq!(r.failed(), 1);
    }

    #[test]
    fn stats_serialise_to_json() {
        let stats = ConversionStats {
            input_bytes: 10,
            output_bytes: 200,
            images_inlined: 1,
            ..Default::default()
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"output_bytes\":200"), "got: {json}");
    }
}
