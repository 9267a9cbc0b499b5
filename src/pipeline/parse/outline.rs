//! Heading pass: slug ids on headings and `[TOC]` expansion.
//!
//! Runs over backend output, so both backends get identical anchors and
//! outlines. Two rewriter passes:
//!
//! 1. collect every `h1`–`h6` with its level, text and any existing `id`
//! 2. give headings a unique slug `id` (existing ids are kept)
//!
//! Then a paragraph consisting of `[TOC]` alone is replaced by a nested
//! `<ul class="toc">` of links to headings within [`TocLevels`]. A document
//! with no such headings loses the marker and gains nothing.

use crate::error::Md2PageError;
use crate::profile::{ExtensionProfile, TocLevels};
use lol_html::{element, rewrite_str, text, RewriteStrSettings};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::rc::Rc;

static TOC_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<p>\s*\[TOC\]\s*</p>\n?").expect("valid regex"));

const HEADINGS: &str = "h1, h2, h3, h4, h5, h6";

/// What the heading pass does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineOptions {
    /// Give every heading an `id`.
    pub anchors: bool,
    /// Expand `[TOC]` markers.
    pub toc: bool,
    /// Heading levels listed in an expanded `[TOC]`.
    pub levels: TocLevels,
}

impl OutlineOptions {
    pub fn from_profile(profile: &ExtensionProfile) -> Self {
        Self {
            anchors: profile.anchor_links,
            toc: profile.table_of_contents,
            levels: profile.toc_levels,
        }
    }
}

#[derive(Debug, Default)]
struct Heading {
    level: u8,
    /// Inner text as it appears in the markup (entities still encoded).
    text_html: String,
    existing_id: Option<String>,
    id: Option<String>,
}

/// Apply the heading pass to `html`.
pub fn apply(html: &str, opts: &OutlineOptions) -> Result<String, Md2PageError> {
    let has_marker = opts.toc && TOC_MARKER.is_match(html);
    if !opts.anchors && !has_marker {
        return Ok(html.to_string());
    }

    let mut headings = collect_headings(html)?;
    if headings.is_empty() {
        return Ok(if has_marker {
            TOC_MARKER.replace_all(html, "").into_owned()
        } else {
            html.to_string()
        });
    }

    assign_ids(&mut headings, opts);
    let html = write_ids(html, &headings)?;

    if !has_marker {
        return Ok(html);
    }
    let toc = render_toc(&headings, opts.levels);
    Ok(TOC_MARKER
        .replace_all(&html, regex::NoExpand(&toc))
        .into_owned())
}

// ── Pass 1: collect ──────────────────────────────────────────────────────

fn collect_headings(html: &str) -> Result<Vec<Heading>, Md2PageError> {
    let found: Rc<RefCell<Vec<Heading>>> = Rc::new(RefCell::new(Vec::new()));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(HEADINGS, {
                    let found = Rc::clone(&found);
                    move |el| {
                        let level = heading_level(&el.tag_name());
                        found.borrow_mut().push(Heading {
                            level,
                            existing_id: el.get_attribute("id").filter(|id| !id.is_empty()),
                            ..Heading::default()
                        });
                        Ok(())
                    }
                }),
                text!(HEADINGS, {
                    let found = Rc::clone(&found);
                    move |t| {
                        if let Some(h) = found.borrow_mut().last_mut() {
                            h.text_html.push_str(t.as_str());
                        }
                        Ok(())
                    }
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| Md2PageError::HtmlRewriteFailed {
        stage: "heading scan",
        detail: e.to_string(),
    })?;

    Ok(found.take())
}

fn heading_level(tag: &str) -> u8 {
    tag.strip_prefix(['h', 'H'])
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

// ── Slugs ────────────────────────────────────────────────────────────────

fn assign_ids(headings: &mut [Heading], opts: &OutlineOptions) {
    let mut used: HashSet<String> = headings
        .iter()
        .filter_map(|h| h.existing_id.clone())
        .collect();

    for h in headings.iter_mut() {
        if let Some(existing) = &h.existing_id {
            h.id = Some(existing.clone());
            continue;
        }
        if !opts.anchors && !(opts.toc && opts.levels.contains(h.level)) {
            continue;
        }
        let base = slugify(&html_escape::decode_html_entities(&h.text_html));
        let mut candidate = base.clone();
        let mut n = 1;
        while used.contains(&candidate) {
            candidate = format!("{base}-{n}");
            n += 1;
        }
        used.insert(candidate.clone());
        h.id = Some(candidate);
    }
}

/// Lowercase, alphanumerics kept, runs of anything else collapsed to `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("section");
    }
    slug
}

// ── Pass 2: write ids ────────────────────────────────────────────────────

fn write_ids(html: &str, headings: &[Heading]) -> Result<String, Md2PageError> {
    let ids: Rc<Vec<Option<String>>> = Rc::new(headings.iter().map(|h| h.id.clone()).collect());
    let index = Rc::new(RefCell::new(0usize));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(HEADINGS, {
                let ids = Rc::clone(&ids);
                let index = Rc::clone(&index);
                move |el| {
                    let mut idx = index.borrow_mut();
                    if let Some(Some(id)) = ids.get(*idx) {
                        if el.get_attribute("id").map_or(true, |v| v.is_empty()) {
                            el.set_attribute("id", id)?;
                        }
                    }
                    *idx += 1;
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| Md2PageError::HtmlRewriteFailed {
        stage: "heading ids",
        detail: e.to_string(),
    })
}

// ── TOC ──────────────────────────────────────────────────────────────────

fn render_toc(headings: &[Heading], levels: TocLevels) -> String {
    let entries: Vec<&Heading> = headings
        .iter()
        .filter(|h| levels.contains(h.level) && h.id.is_some())
        .collect();
    let Some(base) = entries.iter().map(|h| h.level).min() else {
        return String::new();
    };

    let mut out = String::from("<ul class=\"toc\">\n");
    let mut depth = 0usize;
    for (i, h) in entries.iter().enumerate() {
        let rel = usize::from(h.level - base);
        if i > 0 {
            if rel > depth {
                while depth < rel {
                    out.push_str("\n<ul>\n<li>");
                    depth += 1;
                }
            } else {
                out.push_str("</li>\n");
                while depth > rel {
                    out.push_str("</ul>\n</li>\n");
                    depth -= 1;
                }
                out.push_str("<li>");
            }
        } else {
            out.push_str("<li>");
            while depth < rel {
                out.push_str("\n<ul>\n<li>");
                depth += 1;
            }
        }
        let id = h.id.as_deref().unwrap_or_default();
        let _ = write!(out, "<a href=\"#{id}\">{}</a>", h.text_html.trim());
    }
    out.push_str("</li>\n");
    while depth > 0 {
        out.push_str("</ul>\n</li>\n");
        depth -= 1;
    }
    out.push_str("</ul>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn opts(anchors: bool, toc: bool) -> OutlineOptions {
        OutlineOptions {
            anchors,
            toc,
            levels: TocLevels::default(),
        }
    }

    #[test]
    fn slugify_examples() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  API: v2.0 — notes "), "api-v20-notes");
        assert_eq!(slugify("Ünïcödé Straße"), "ünïcödé-straße");
        assert_eq!(slugify("!!!"), "section");
    }

    #[test]
    fn anchors_are_unique() {
        let html = "<h2>Setup</h2>\n<h2>Setup</h2>\n<h3 id=\"setup-1\">Other</h3>\n";
        let out = apply(html, &opts(true, false)).unwrap();
        assert_eq!(
            out,
            "<h2 id=\"setup\">Setup</h2>\n<h2 id=\"setup-2\">Setup</h2>\n<h3 id=\"setup-1\">Other</h3>\n"
        );
    }

    #[test]
    fn nested_markup_contributes_text() {
        let out = apply("<h2>Use <code>a &amp; b</code></h2>", &opts(true, false)).unwrap();
        assert_eq!(out, "<h2 id=\"use-a-b\">Use <code>a &amp; b</code></h2>");
    }

    #[test]
    fn numeric_references_decode_before_slugging() {
        let out = apply("<h2>John&#x27;s &#8220;Notes&#8221;</h2>", &opts(true, false)).unwrap();
        assert_eq!(out, "<h2 id=\"johns-notes\">John&#x27;s &#8220;Notes&#8221;</h2>");
    }

    #[test]
    fn toc_lists_configured_levels() {
        let html = "<h1>Title</h1>\n<p>[TOC]</p>\n<h2>One</h2>\n<h3>One A</h3>\n<h4>Deep</h4>\n<h2>Two</h2>\n";
        let out = apply(html, &opts(true, true)).unwrap();
        let expected_toc = "<ul class=\"toc\">\n\
            <li><a href=\"#one\">One</a>\n<ul>\n<li><a href=\"#one-a\">One A</a></li>\n</ul>\n</li>\n\
            <li><a href=\"#two\">Two</a></li>\n\
            </ul>\n";
        assert!(out.contains(expected_toc), "got: {out}");
        assert!(!out.contains("[TOC]"));
        assert!(!out.contains("href=\"#title\""));
        assert!(!out.contains("href=\"#deep\""));
    }

    #[test]
    fn toc_without_anchor_option_still_links() {
        let html = "<p>[TOC]</p>\n<h2>Only</h2>\n<h5>Skipped</h5>\n";
        let out = apply(html, &opts(false, true)).unwrap();
        assert!(out.contains("<h2 id=\"only\">Only</h2>"), "got: {out}");
        assert!(out.contains("<h5>Skipped</h5>"), "got: {out}");
        assert!(out.contains("<a href=\"#only\">Only</a>"), "got: {out}");
    }

    #[test]
    fn no_headings_removes_marker() {
        let out = apply("<p>intro</p>\n<p>[TOC]</p>\n<p>end</p>\n", &opts(true, true)).unwrap();
        assert_eq!(out, "<p>intro</p>\n<p>end</p>\n");
    }

    #[test]
    fn no_headings_no_marker_is_unchanged() {
        let html = "<p>plain</p>\n";
        assert_eq!(apply(html, &opts(true, true)).unwrap(), html);
    }

    #[test]
    fn marker_left_alone_when_toc_disabled() {
        let html = "<p>[TOC]</p>\n<h2>A</h2>\n";
        let out = apply(html, &opts(true, false)).unwrap();
        assert!(out.contains("<p>[TOC]</p>"));
    }

    #[test]
    fn toc_starting_deeper_than_base() {
        let html = "<p>[TOC]</p>\n<h3>Deep first</h3>\n<h2>Shallow</h2>\n";
        let out = apply(html, &opts(true, true)).unwrap();
        assert!(out.contains("<ul class=\"toc\">\n<li>\n<ul>\n<li><a href=\"#deep-first\">"), "got: {out}");
        assert!(out.contains("<li><a href=\"#shallow\">Shallow</a></li>\n</ul>\n"), "got: {out}");
    }
}
