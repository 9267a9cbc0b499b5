//! pulldown-cmark backend.

use super::MarkdownParser;
use crate::profile::{Extension, ExtensionProfile};
use pulldown_cmark::{html, Event, Options, Parser};

/// CommonMark via pulldown-cmark.
///
/// Supports tables, strikethrough, task lists, footnotes, smart
/// punctuation, definition lists, YAML front matter and hard wraps. Bare
/// autolinks and wiki-links are not recognised.
#[derive(Debug, Clone)]
pub struct PulldownParser {
    options: Options,
    hard_wraps: bool,
    raw_html: bool,
}

impl PulldownParser {
    pub fn new(profile: &ExtensionProfile) -> Self {
        Self {
            options: parser_options(profile),
            hard_wraps: profile.hard_wraps,
            raw_html: profile.raw_html,
        }
    }

    pub fn options(&self) -> Options {
        self.options
    }
}

fn parser_options(profile: &ExtensionProfile) -> Options {
    let mut options = Options::empty();
    if profile.tables {
        options.insert(Options::ENABLE_TABLES);
    }
    if profile.strikethrough {
        options.insert(Options::ENABLE_STRIKETHROUGH);
    }
    if profile.task_lists {
        options.insert(Options::ENABLE_TASKLISTS);
    }
    if profile.footnotes {
        options.insert(Options::ENABLE_FOOTNOTES);
    }
    if profile.typographic {
        options.insert(Options::ENABLE_SMART_PUNCTUATION);
    }
    if profile.definition_lists {
        options.insert(Options::ENABLE_DEFINITION_LIST);
    }
    if profile.front_matter {
        options.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);
    }
    options
}

impl MarkdownParser for PulldownParser {
    fn name(&self) -> &'static str {
        "pulldown"
    }

    fn supports(&self, ext: Extension) -> bool {
        !matches!(ext, Extension::Autolinks | Extension::WikiLinks)
    }

    fn parse(&self, markdown: &str) -> String {
        let hard_wraps = self.hard_wraps;
        let raw_html = self.raw_html;
        let events = Parser::new_ext(markdown, self.options).map(move |event| match event {
            Event::SoftBreak if hard_wraps => Event::HardBreak,
            Event::Html(raw) | Event::InlineHtml(raw) if !raw_html => Event::Text(raw),
            other => other,
        });

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, events);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(profile: &ExtensionProfile, md: &str) -> String {
        PulldownParser::new(profile).parse(md)
    }

    #[test]
    fn heading() {
        assert_eq!(
            parse(&ExtensionProfile::commonmark(), "# Hello"),
            "<h1>Hello</h1>\n"
        );
    }

    #[test]
    fn options_follow_profile() {
        let opts = PulldownParser::new(&ExtensionProfile::gfm()).options();
        assert!(opts.contains(Options::ENABLE_TABLES));
        assert!(opts.contains(Options::ENABLE_STRIKETHROUGH));
        assert!(opts.contains(Options::ENABLE_TASKLISTS));
        assert!(!opts.contains(Options::ENABLE_FOOTNOTES));

        let opts = PulldownParser::new(&ExtensionProfile::commonmark()).options();
        assert!(opts.is_empty());
    }

    #[test]
    fn tables_only_when_enabled() {
        let md = "| a |\n|---|\n| 1 |\n";
        assert!(parse(&ExtensionProfile::gfm(), md).contains("<table>"));
        assert!(!parse(&ExtensionProfile::commonmark(), md).contains("<table>"));
    }

    #[test]
    fn strikethrough_and_tasks() {
        let html = parse(&ExtensionProfile::gfm(), "~~gone~~\n\n- [x] done\n");
        assert!(html.contains("<del>gone</del>"), "got: {html}");
        assert!(html.contains("type=\"checkbox\""), "got: {html}");
    }

    #[test]
    fn footnotes() {
        let profile = ExtensionProfile::builder().footnotes(true).build().unwrap();
        let html = parse(&profile, "Text[^1].\n\n[^1]: Note.\n");
        assert!(html.contains("footnote-reference"), "got: {html}");
        assert!(html.contains("footnote-definition"), "got: {html}");
    }

    #[test]
    fn typographic_quotes() {
        let profile = ExtensionProfile::builder().typographic(true).build().unwrap();
        let html = parse(&profile, "\"quoted\" -- dash...");
        assert!(html.contains('\u{201C}') && html.contains('\u{201D}'), "got: {html}");
        assert!(html.contains('\u{2013}'), "got: {html}");
        assert!(html.contains('\u{2026}'), "got: {html}");
    }

    #[test]
    fn front_matter_is_not_rendered() {
        let profile = ExtensionProfile::builder().front_matter(true).build().unwrap();
        let html = parse(&profile, "---\ntitle: x\n---\n\n# Body\n");
        assert!(!html.contains("title: x"), "got: {html}");
        assert!(html.contains("<h1>Body</h1>"), "got: {html}");
    }

    #[test]
    fn hard_wraps() {
        let profile = ExtensionProfile::builder().hard_wraps(true).build().unwrap();
        assert!(parse(&profile, "one\ntwo").contains("<br />"));
        assert!(!parse(&ExtensionProfile::commonmark(), "one\ntwo").contains("<br />"));
    }

    #[test]
    fn raw_html_policy() {
        let md = "<div class=\"x\">hi</div>\n\ninline <b>bold</b>\n";
        let passed = parse(&ExtensionProfile::commonmark(), md);
        assert!(passed.contains("<div class=\"x\">"), "got: {passed}");
        assert!(passed.contains("<b>bold</b>"), "got: {passed}");

        let profile = ExtensionProfile::builder().raw_html(false).build().unwrap();
        let escaped = parse(&profile, md);
        assert!(!escaped.contains("<div"), "got: {escaped}");
        assert!(escaped.contains("&lt;b&gt;bold&lt;/b&gt;"), "got: {escaped}");
    }

    #[test]
    fn unsupported_extensions() {
        let p = PulldownParser::new(&ExtensionProfile::default());
        assert!(!p.supports(Extension::WikiLinks));
        assert!(!p.supports(Extension::Autolinks));
        assert!(p.supports(Extension::Footnotes));
    }

    #[test]
    fn malformed_input_degrades_to_text() {
        let html = parse(&ExtensionProfile::gfm(), "[unclosed *emph `code");
        assert!(html.contains("[unclosed *emph `code"), "got: {html}");
    }
}
