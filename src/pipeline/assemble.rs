//! Document assembly: template + title + body + assets → final HTML.
//!
//! The template is scanned once for `{{ name }}` placeholders and every
//! placeholder is filled in that single pass. Substituted text is never
//! rescanned, so a body that happens to contain `{{ title }}` is emitted
//! verbatim.
//!
//! | Placeholder        | Filled with                                    |
//! |--------------------|------------------------------------------------|
//! | `title`            | document title, HTML-escaped                   |
//! | `body`             | the inlined body fragment, verbatim            |
//! | `markdown_css` …   | the matching [`AssetSlot`]'s text              |

use crate::assets::{AssetBundle, AssetSlot};
use crate::error::Md2PageError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::debug;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([a-z_]+)\s*\}\}").expect("valid regex"));

static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n|\r|\n").expect("valid regex"));

/// How the assembler treats assets.
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Asset name of the page template.
    pub template: String,
    /// Fill the outline slots; when false they are left empty.
    pub include_outline: bool,
    /// Strip line breaks from asset text.
    pub compact_assets: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            template: crate::config::DEFAULT_TEMPLATE.to_string(),
            include_outline: true,
            compact_assets: true,
        }
    }
}

/// Build the final document.
///
/// # Errors
/// * [`Md2PageError::AssetMissing`] if the template or an asset it
///   references is not in `assets`
/// * [`Md2PageError::TemplateInvalid`] if the template has no `body`
///   placeholder or names one nothing can fill
pub fn assemble(
    title: &str,
    body: &str,
    assets: &dyn AssetBundle,
    opts: &AssembleOptions,
) -> Result<String, Md2PageError> {
    let template_bytes = assets.load(&opts.template)?;
    let template = String::from_utf8_lossy(&template_bytes);

    let mut values: HashMap<&str, Cow<'_, str>> = HashMap::new();
    let mut has_body = false;
    for caps in PLACEHOLDER.captures_iter(&template) {
        let name = caps.get(1).map_or("", |m| m.as_str());
        if values.contains_key(name) {
            continue;
        }
        let value: Cow<'_, str> = match name {
            "title" => escape_html(title),
            "body" => {
                has_body = true;
                Cow::Borrowed(body)
            }
            other => match AssetSlot::from_placeholder(other) {
                Some(slot) if slot.is_outline() && !opts.include_outline => Cow::Borrowed(""),
                Some(slot) => Cow::Owned(load_text(assets, slot, opts.compact_assets)?),
                None => {
                    return Err(Md2PageError::TemplateInvalid {
                        template: opts.template.clone(),
                        detail: format!("unknown placeholder '{{{{ {other} }}}}'"),
                    })
                }
            },
        };
        values.insert(name, value);
    }
    if !has_body {
        return Err(Md2PageError::TemplateInvalid {
            template: opts.template.clone(),
            detail: "no '{{ body }}' placeholder".into(),
        });
    }

    let extra: usize = values.values().map(|v| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(&template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&template[last..whole.start()]);
        if let Some(value) = values.get(name.as_str()) {
            out.push_str(value);
        }
        last = whole.end();
    }
    out.push_str(&template[last..]);

    debug!(
        "Assembled {} bytes from template '{}' ({} placeholders)",
        out.len(),
        opts.template,
        values.len()
    );
    Ok(out)
}

fn load_text(
    assets: &dyn AssetBundle,
    slot: AssetSlot,
    compact: bool,
) -> Result<String, Md2PageError> {
    let bytes = assets.load(slot.asset_name())?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(if compact {
        LINE_BREAKS.replace_all(&text, "").into_owned()
    } else {
        text.into_owned()
    })
}

/// Escape `&`, `<`, `>`, `"` and `'` for HTML text and attribute values.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}
