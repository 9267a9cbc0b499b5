//! Markdown → HTML fragment, over interchangeable parser backends.
//!
//! Every backend implements [`MarkdownParser`]. [`ParserAdapter`] wraps the
//! chosen backend with the behaviour all backends share:
//!
//! * a panic inside the backend is caught and the input is emitted escaped
//!   inside `<pre>` instead, so parsing never fails
//! * the heading pass in [`outline`] adds anchor ids and expands `[TOC]`
//!
//! The adapter receives its [`ExtensionProfile`] once, at construction, and
//! exposes no way to change it.

#[cfg(feature = "comrak")]
pub mod comrak;
pub mod outline;
#[cfg(feature = "pulldown")]
pub mod pulldown;

use crate::config::ParserBackend;
use crate::error::Md2PageError;
use crate::profile::{Extension, ExtensionProfile};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// A Markdown-to-HTML backend.
///
/// Implementations must accept any Unicode text and never fail: malformed
/// constructs degrade to literal text, and empty input yields an empty
/// fragment.
pub trait MarkdownParser: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Extensions this backend can honour.
    fn supports(&self, ext: Extension) -> bool;

    /// Render `markdown` to an HTML body fragment.
    fn parse(&self, markdown: &str) -> String;
}

/// Build the backend selected by `backend`, configured from `profile`.
///
/// Options the backend cannot honour are logged at `warn` and ignored.
pub fn build_backend(
    backend: ParserBackend,
    profile: &ExtensionProfile,
) -> Result<Box<dyn MarkdownParser>, Md2PageError> {
    let parser: Box<dyn MarkdownParser> = match backend {
        #[cfg(feature = "pulldown")]
        ParserBackend::Pulldown => Box::new(pulldown::PulldownParser::new(profile)),
        #[cfg(feature = "comrak")]
        ParserBackend::Comrak => Box::new(comrak::ComrakParser::new(profile)),
        #[allow(unreachable_patterns)]
        other => {
            return Err(Md2PageError::InvalidConfig(format!(
                "Parser backend '{other}' is not compiled in; rebuild with --features {other}"
            )))
        }
    };

    for ext in profile.enabled() {
        if !parser.supports(ext) {
            warn!(
                "Backend '{}' does not support '{}'; the option is ignored",
                parser.name(),
                ext
            );
        }
    }
    debug!("Built parser backend '{}'", parser.name());
    Ok(parser)
}

/// The parser used by the pipeline: a backend plus the shared heading pass.
pub struct ParserAdapter {
    backend: Box<dyn MarkdownParser>,
    outline: Option<outline::OutlineOptions>,
}

impl ParserAdapter {
    /// Build the configured backend for `profile`.
    pub fn new(backend: ParserBackend, profile: &ExtensionProfile) -> Result<Self, Md2PageError> {
        let parser = build_backend(backend, profile)?;
        Ok(Self::with_backend(parser, profile))
    }

    /// Wrap a caller-supplied backend.
    pub fn with_backend(backend: Box<dyn MarkdownParser>, profile: &ExtensionProfile) -> Self {
        let outline = profile
            .needs_outline_pass()
            .then(|| outline::OutlineOptions::from_profile(profile));
        Self { backend, outline }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

impl MarkdownParser for ParserAdapter {
    fn name(&self) -> &'static str {
        self.backend.name()
    }

    fn supports(&self, ext: Extension) -> bool {
        match ext {
            Extension::AnchorLinks | Extension::TableOfContents => true,
            other => self.backend.supports(other),
        }
    }

    fn parse(&self, markdown: &str) -> String {
        if markdown.is_empty() {
            return String::new();
        }

        let html = match panic::catch_unwind(AssertUnwindSafe(|| self.backend.parse(markdown))) {
            Ok(html) => html,
            Err(_) => {
                warn!(
                    "Backend '{}' panicked; emitting the source as preformatted text",
                    self.backend.name()
                );
                return escaped_fallback(markdown);
            }
        };

        match &self.outline {
            Some(opts) => match outline::apply(&html, opts) {
                Ok(rewritten) => rewritten,
                Err(e) => {
                    warn!("Heading pass skipped: {e}");
                    html
                }
            },
            None => html,
        }
    }
}

/// The whole input, escaped and visible.
fn escaped_fallback(markdown: &str) -> String {
    format!(
        "<pre class=\"md2page-unparsed\">{}</pre>\n",
        crate::pipeline::assemble::escape_html(markdown)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PanickingParser;

    impl MarkdownParser for PanickingParser {
        fn name(&self) -> &'static str {
            "panicking"
        }
        fn supports(&self, _ext: Extension) -> bool {
            false
        }
        fn parse(&self, _markdown: &str) -> String {
            panic!("backend bug");
        }
    }

    struct EchoParser;

    impl MarkdownParser for EchoParser {
        fn name(&self) -> &'static str {
            "echo"
        }
        fn supports(&self, _ext: Extension) -> bool {
            true
        }
        fn parse(&self, markdown: &str) -> String {
            markdown.to_string()
        }
    }

    #[test]
    fn panicking_backend_degrades_to_escaped_text() {
        let adapter =
            ParserAdapter::with_backend(Box::new(PanickingParser), &ExtensionProfile::commonmark());
        let html = adapter.parse("<b> & </b>");
        assert!(html.starts_with("<pre"), "got: {html}");
        assert!(html.contains("&lt;b&gt; &amp; &lt;/b&gt;"), "got: {html}");
    }

    #[test]
    fn empty_input_is_empty_fragment() {
        let adapter = ParserAdapter::with_backend(Box::new(EchoParser), &ExtensionProfile::default());
        assert_eq!(adapter.parse(""), "");
    }

    #[test]
    fn outline_pass_runs_over_backend_output() {
        let adapter = ParserAdapter::with_backend(Box::new(EchoParser), &ExtensionProfile::default());
        let html = adapter.parse("<h2>Intro</h2>\n");
        assert_eq!(html, "<h2 id=\"intro\">Intro</h2>\n");
    }

    #[test]
    fn outline_pass_skipped_when_disabled() {
        let adapter =
            ParserAdapter::with_backend(Box::new(EchoParser), &ExtensionProfile::commonmark());
        assert_eq!(adapter.parse("<h2>Intro</h2>"), "<h2>Intro</h2>");
    }

    #[test]
    fn adapter_reports_heading_extensions() {
        let adapter =
            ParserAdapter::with_backend(Box::new(PanickingParser), &ExtensionProfile::commonmark());
        assert!(adapter.supports(Extension::TableOfContents));
        assert!(!adapter.supports(Extension::Tables));
    }

    #[cfg(feature = "pulldown")]
    #[test]
    fn builds_pulldown() {
        let adapter = ParserAdapter::new(ParserBackend::Pulldown, &ExtensionProfile::default()).unwrap();
        assert_eq!(adapter.backend_name(), "pulldown");
    }

    #[cfg(feature = "comrak")]
    #[test]
    fn builds_comrak() {
        let adapter = ParserAdapter::new(ParserBackend::Comrak, &ExtensionProfile::default()).unwrap();
        assert_eq!(adapter.backend_name(), "comrak");
    }

    /// Behaviour every compiled-in backend must share.
    #[test]
    fn backends_agree_on_core_rendering() {
        let backends: Vec<ParserBackend> = vec![
            #[cfg(feature = "pulldown")]
            ParserBackend::Pulldown,
            #[cfg(feature = "comrak")]
            ParserBackend::Comrak,
        ];
        let profile = ExtensionProfile::gfm();
        for backend in backends {
            let parser = ParserAdapter::new(backend, &profile).unwrap();

            let html = parser.parse("# Hello");
            assert!(html.contains("<h1>Hello</h1>"), "{backend}: {html}");

            let html = parser.parse("```\nif a < b && c > d {}\n```\n");
            assert!(html.contains("<pre><code>"), "{backend}: {html}");
            assert!(
                html.contains("if a &lt; b &amp;&amp; c &gt; d {}"),
                "{backend}: {html}"
            );

            let html = parser.parse("    indented <x>\n");
            assert!(html.contains("<pre><code>indented &lt;x&gt;"), "{backend}: {html}");

            let html = parser.parse("| a | b |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |\n");
            assert!(html.contains("<table>"), "{backend}: {html}");
            assert_eq!(html.matches("<tr>").count(), 3, "{backend}: {html}");

            let html = parser.parse("*em* **strong** [link](https://x.test)\n\n> quote\n\n- item\n");
            assert!(html.contains("<em>em</em>"), "{backend}: {html}");
            assert!(html.contains("<strong>strong</strong>"), "{backend}: {html}");
            assert!(html.contains("<a href=\"https://x.test\">link</a>"), "{backend}: {html}");
            assert!(html.contains("<blockquote>"), "{backend}: {html}");
            assert!(html.contains("<li>item</li>"), "{backend}: {html}");

            assert_eq!(parser.parse(""), "", "{backend}");
        }
    }
}
