//! comrak backend.

use super::MarkdownParser;
use crate::profile::{Extension, ExtensionProfile};
use ::comrak::options::Options;

const FRONT_MATTER_DELIMITER: &str = "---";

/// GitHub-flavoured Markdown via comrak.
///
/// Honours every [`Extension`]; headings and `[TOC]` are handled by the
/// shared heading pass rather than comrak's own header ids.
#[derive(Debug, Clone)]
pub struct ComrakParser {
    profile: ExtensionProfile,
}

impl ComrakParser {
    pub fn new(profile: &ExtensionProfile) -> Self {
        Self {
            profile: profile.clone(),
        }
    }

    /// The comrak options this parser renders with.
    pub fn options(&self) -> Options<'static> {
        let p = &self.profile;
        let mut options = Options::default();

        let ext = &mut options.extension;
        ext.table = p.tables;
        ext.strikethrough = p.strikethrough;
        ext.tasklist = p.task_lists;
        ext.footnotes = p.footnotes;
        ext.autolink = p.autolinks;
        ext.wikilinks_title_after_pipe = p.wiki_links;
        ext.description_lists = p.definition_lists;
        if p.front_matter {
            ext.front_matter_delimiter = Some(FRONT_MATTER_DELIMITER.to_string());
        }

        options.parse.smart = p.typographic;

        let render = &mut options.render;
        render.hardbreaks = p.hard_wraps;
        if p.raw_html {
            render.r#unsafe = true;
        } else {
            render.escape = true;
        }
        options
    }
}

impl MarkdownParser for ComrakParser {
    fn name(&self) -> &'static str {
        "comrak"
    }

    fn supports(&self, _ext: Extension) -> bool {
        true
    }

    fn parse(&self, markdown: &str) -> String {
        ::comrak::markdown_to_html(markdown, &self.options())
    }
}
