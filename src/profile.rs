//! Extension profiles: which optional Markdown syntax a parser honours.
//!
//! An [`ExtensionProfile`] is handed to a parser backend once, at
//! construction. The backend translates it into its own option set and keeps
//! that translation for its whole lifetime; nothing reconfigures a parser
//! after it is built.
//!
//! Not every backend supports every option. [`Extension`] names each option
//! so a backend can advertise its support matrix and the factory in
//! [`crate::pipeline::parse`] can warn about options that will be ignored.

use crate::error::Md2PageError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One optional Markdown feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extension {
    Tables,
    Strikethrough,
    TaskLists,
    Footnotes,
    TableOfContents,
    AnchorLinks,
    Typographic,
    Autolinks,
    WikiLinks,
    DefinitionLists,
    FrontMatter,
    HardWraps,
}

impl Extension {
    pub const ALL: [Extension; 12] = [
        Extension::Tables,
        Extension::Strikethrough,
        Extension::TaskLists,
        Extension::Footnotes,
        Extension::TableOfContents,
        Extension::AnchorLinks,
        Extension::Typographic,
        Extension::Autolinks,
        Extension::WikiLinks,
        Extension::DefinitionLists,
        Extension::FrontMatter,
        Extension::HardWraps,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Extension::Tables => "tables",
            Extension::Strikethrough => "strikethrough",
            Extension::TaskLists => "task_lists",
            Extension::Footnotes => "footnotes",
            Extension::TableOfContents => "table_of_contents",
            Extension::AnchorLinks => "anchor_links",
            Extension::Typographic => "typographic",
            Extension::Autolinks => "autolinks",
            Extension::WikiLinks => "wiki_links",
            Extension::DefinitionLists => "definition_lists",
            Extension::FrontMatter => "front_matter",
            Extension::HardWraps => "hard_wraps",
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive range of heading levels listed by a `[TOC]` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocLevels {
    min: u8,
    max: u8,
}

impl TocLevels {
    /// Validated constructor: `1 ≤ min ≤ max ≤ 6`.
    pub fn new(min: u8, max: u8) -> Result<Self, Md2PageError> {
        if !(1..=6).contains(&min) || !(1..=6).contains(&max) || min > max {
            return Err(Md2PageError::InvalidConfig(format!(
                "TOC levels must satisfy 1 ≤ min ≤ max ≤ 6, got {min}–{max}"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u8 {
        self.min
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    pub fn contains(&self, level: u8) -> bool {
        (self.min..=self.max).contains(&level)
    }
}

impl Default for TocLevels {
    /// Levels 2–3: the document title (`h1`) is left out of its own outline.
    fn default() -> Self {
        Self { min: 2, max: 3 }
    }
}

/// The set of optional Markdown features enabled for a conversion.
///
/// Built via [`ExtensionProfile::builder()`] or one of the presets
/// ([`commonmark`](Self::commonmark), [`gfm`](Self::gfm),
/// [`full`](Self::full)). The default matches `gfm()` plus heading anchors
/// and the `[TOC]` marker.
///
/// # Example
/// ```rust
/// use md2page::ExtensionProfile;
///
/// let profile = ExtensionProfile::builder()
///     .footnotes(true)
///     .toc_levels(1, 4)
///     .build()
///     .unwrap();
/// assert!(profile.footnotes);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionProfile {
    /// GFM pipe tables.
    pub tables: bool,
    /// `~~struck~~` text.
    pub strikethrough: bool,
    /// `- [ ]` / `- [x]` list items.
    pub task_lists: bool,
    /// `[^1]` references and definitions.
    pub footnotes: bool,
    /// Replace a paragraph containing only `[TOC]` with a heading outline.
    pub table_of_contents: bool,
    /// Heading levels listed by the `[TOC]` marker.
    pub toc_levels: TocLevels,
    /// Give every heading a unique slug `id`.
    pub anchor_links: bool,
    /// Curly quotes, en/em dashes and ellipses.
    pub typographic: bool,
    /// Bare `www.` / `https://` text becomes a link.
    pub autolinks: bool,
    /// `[[Page]]` and `[[Page|title]]` links.
    pub wiki_links: bool,
    /// `Term` / `: definition` lists.
    pub definition_lists: bool,
    /// Skip a leading `---` delimited front-matter block.
    pub front_matter: bool,
    /// Every soft line break renders as `<br />`.
    pub hard_wraps: bool,
    /// Pass raw HTML in the source through; when off it is escaped.
    pub raw_html: bool,
}

impl Default for ExtensionProfile {
    fn default() -> Self {
        Self {
            table_of_contents: true,
            anchor_links: true,
            ..Self::gfm()
        }
    }
}

impl ExtensionProfile {
    /// Create a new builder starting from [`ExtensionProfile::default()`].
    pub fn builder() -> ExtensionProfileBuilder {
        ExtensionProfileBuilder {
            profile: Self::default(),
        }
    }

    /// Plain CommonMark: every extension off, raw HTML passed through.
    pub fn commonmark() -> Self {
        Self {
            tables: false,
            strikethrough: false,
            task_lists: false,
            footnotes: false,
            table_of_contents: false,
            toc_levels: TocLevels::default(),
            anchor_links: false,
            typographic: false,
            autolinks: false,
            wiki_links: false,
            definition_lists: false,
            front_matter: false,
            hard_wraps: false,
            raw_html: true,
        }
    }

    /// GitHub-flavoured: tables, strikethrough, task lists, autolinks.
    pub fn gfm() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            task_lists: true,
            autolinks: true,
            ..Self::commonmark()
        }
    }

    /// Everything on except hard wraps.
    pub fn full() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            task_lists: true,
            footnotes: true,
            table_of_contents: true,
            toc_levels: TocLevels::default(),
            anchor_links: true,
            typographic: true,
            autolinks: true,
            wiki_links: true,
            definition_lists: true,
            front_matter: true,
            hard_wraps: false,
            raw_html: true,
        }
    }

    /// Whether a single extension is switched on.
    pub fn is_enabled(&self, ext: Extension) -> bool {
        match ext {
            Extension::Tables => self.tables,
            Extension::Strikethrough => self.strikethrough,
            Extension::TaskLists => self.task_lists,
            Extension::Footnotes => self.footnotes,
            Extension::TableOfContents => self.table_of_contents,
            Extension::AnchorLinks => self.anchor_links,
            Extension::Typographic => self.typographic,
            Extension::Autolinks => self.autolinks,
            Extension::WikiLinks => self.wiki_links,
            Extension::DefinitionLists => self.definition_lists,
            Extension::FrontMatter => self.front_matter,
            Extension::HardWraps => self.hard_wraps,
        }
    }

    /// All switched-on extensions, in [`Extension::ALL`] order.
    pub fn enabled(&self) -> Vec<Extension> {
        Extension::ALL
            .into_iter()
            .filter(|ext| self.is_enabled(*ext))
            .collect()
    }

    /// Whether the heading post-pass (anchors and/or `[TOC]`) has work to do.
    pub fn needs_outline_pass(&self) -> bool {
        self.anchor_links || self.table_of_contents
    }
}

/// Builder for [`ExtensionProfile`].
#[derive(Debug)]
pub struct ExtensionProfileBuilder {
    profile: ExtensionProfile,
}

impl ExtensionProfileBuilder {
    /// Start from a preset instead of the default.
    pub fn from_profile(profile: ExtensionProfile) -> Self {
        Self { profile }
    }

    pub fn tables(mut self, v: bool) -> Self {
        self.profile.tables = v;
        self
    }

    pub fn strikethrough(mut self, v: bool) -> Self {
        self.profile.strikethrough = v;
        self
    }

    pub fn task_lists(mut self, v: bool) -> Self {
        self.profile.task_lists = v;
        self
    }

    pub fn footnotes(mut self, v: bool) -> Self {
        self.profile.footnotes = v;
        self
    }

    pub fn table_of_contents(mut self, v: bool) -> Self {
        self.profile.table_of_contents = v;
        self
    }

    /// Levels are checked in [`build`](Self::build).
    pub fn toc_levels(mut self, min: u8, max: u8) -> Self {
        self.profile.toc_levels = TocLevels { min, max };
        self
    }

    pub fn anchor_links(mut self, v: bool) -> Self {
        self.profile.anchor_links = v;
        self
    }

    pub fn typographic(mut self, v: bool) -> Self {
        self.profile.typographic = v;
        self
    }

    pub fn autolinks(mut self, v: bool) -> Self {
        self.profile.autolinks = v;
        self
    }

    pub fn wiki_links(mut self, v: bool) -> Self {
        self.profile.wiki_links = v;
        self
    }

    pub fn definition_lists(mut self, v: bool) -> Self {
        self.profile.definition_lists = v;
        self
    }

    pub fn front_matter(mut self, v: bool) -> Self {
        self.profile.front_matter = v;
        self
    }

    pub fn hard_wraps(mut self, v: bool) -> Self {
        self.profile.hard_wraps = v;
        self
    }

    pub fn raw_html(mut self, v: bool) -> Self {
        self.profile.raw_html = v;
        self
    }

    /// Build the profile, validating constraints.
    pub fn build(self) -> Result<ExtensionProfile, Md2PageError> {
        let levels = self.profile.toc_levels;
        TocLevels::new(levels.min, levels.max)?;
        Ok(self.profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_gfm_with_outline() {
        let p = ExtensionProfile::default();
        assert!(p.tables && p.strikethrough && p.task_lists && p.autolinks);
        assert!(p.table_of_contents && p.anchor_links);
        assert!(!p.footnotes && !p.wiki_links && !p.hard_wraps);
        assert!(p.raw_html);
    }

    #[test]
    fn commonmark_enables_nothing() {
        let p = ExtensionProfile::commonmark();
        assert!(p.enabled().is_empty());
        assert!(!p.needs_outline_pass());
    }

    #[test]
    fn full_enables_all_but_hard_wraps() {
        let enabled = ExtensionProfile::full().enabled();
        assert_eq!(enabled.len(), Extension::ALL.len() - 1);
        assert!(!enabled.contains(&Extension::HardWraps));
    }

    #[test]
    fn toc_levels_validation() {
        assert!(TocLevels::new(2, 3).is_ok());
        assert!(TocLevels::new(1, 6).is_ok());
        assert!(TocLevels::new(0, 3).is_err());
        assert!(TocLevels::new(4, 2).is_err());
        assert!(TocLevels::new(1, 7).is_err());
    }

    #[test]
    fn builder_rejects_bad_levels() {
        let err = ExtensionProfile::builder().toc_levels(5, 1).build();
        assert!(matches!(err, Err(Md2PageError::InvalidConfig(_))));
    }

    #[test]
    fn builder_sets_fields() {
        let p = ExtensionProfile::builder()
            .tables(false)
            .wiki_links(true)
            .raw_html(false)
            .toc_levels(1, 2)
            .build()
            .unwrap();
        assert!(!p.tables);
        assert!(p.wiki_links);
        assert!(!p.raw_html);
        assert!(p.toc_levels.contains(1) && !p.toc_levels.contains(3));
    }

    #[test]
    fn deserialises_partial_json() {
        let p: ExtensionProfile = serde_json::from_str(r#"{"footnotes": true}"#).unwrap();
        assert!(p.footnotes);
        // Missing fields take the default profile's values.
        assert!(p.tables);
    }
}
