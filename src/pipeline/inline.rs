//! Image inlining: local `<img src>` references → embedded `data:` URIs.
//!
//! For every `<img>` with a non-empty `src`:
//!
//! 1. `data:` sources are already embedded and left alone
//! 2. network sources (`http:`, `https:`, protocol-relative `//host`, any
//!    other non-`file:` scheme) are left alone
//! 3. `file:` URIs and bare paths resolve against the base directory
//! 4. the file is read whole and `src` replaced with a `data:` URI
//!
//! Any failure keeps the original `src` byte-for-byte and records an
//! [`ImageWarning`]. Only `src` is ever modified.

use crate::config::MediaTypePolicy;
use crate::error::{ImageWarning, Md2PageError};
use crate::output::InlineReport;
use crate::pipeline::encode;
use lol_html::{element, rewrite_str, RewriteStrSettings};
use percent_encoding::percent_decode_str;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, warn};
use url::Url;

/// Rewrites local image references in an HTML fragment.
#[derive(Debug, Clone)]
pub struct ImageInliner {
    base_dir: PathBuf,
    media_type: MediaTypePolicy,
    max_bytes: Option<u64>,
}

/// The rewritten fragment and what happened to each image.
#[derive(Debug, Clone)]
pub struct Inlined {
    pub html: String,
    pub report: InlineReport,
}

enum Source {
    Embedded,
    Remote,
    Local(PathBuf),
}

impl ImageInliner {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            media_type: MediaTypePolicy::default(),
            max_bytes: None,
        }
    }

    pub fn media_type(mut self, policy: MediaTypePolicy) -> Self {
        self.media_type = policy;
        self
    }

    pub fn max_bytes(mut self, limit: Option<u64>) -> Self {
        self.max_bytes = limit;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Inline every resolvable local image in `html`.
    ///
    /// A fragment in which nothing was inlined is returned byte-identical.
    pub fn inline(&self, html: &str) -> Result<Inlined, Md2PageError> {
        if !mentions_img(html) {
            return Ok(Inlined {
                html: html.to_string(),
                report: InlineReport::default(),
            });
        }

        let report = Rc::new(RefCell::new(InlineReport::default()));

        let rewritten = rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![element!("img[src]", {
                    let report = Rc::clone(&report);
                    move |el| {
                        let Some(src) = el.get_attribute("src") else {
                            return Ok(());
                        };
                        if src.trim().is_empty() {
                            return Ok(());
                        }
                        match self.inline_one(&src) {
                            Ok(uri) => {
                                el.set_attribute("src", &uri)?;
                                report.borrow_mut().inlined += 1;
                            }
                            Err(Skip::Embedded) => report.borrow_mut().already_embedded += 1,
                            Err(Skip::Remote) => {
                                debug!("Leaving remote image '{}'", src);
                                report.borrow_mut().skipped_remote += 1;
                            }
                            Err(Skip::Failed(warning)) => {
                                warn!("{warning}");
                                report.borrow_mut().warnings.push(warning);
                            }
                        }
                        Ok(())
                    }
                })],
                ..RewriteStrSettings::default()
            },
        )
        .map_err(|e| Md2PageError::HtmlRewriteFailed {
            stage: "image inlining",
            detail: e.to_string(),
        })?;

        let report = report.take();
        let html = if report.inlined == 0 {
            html.to_string()
        } else {
            rewritten
        };
        Ok(Inlined { html, report })
    }

    fn inline_one(&self, src: &str) -> Result<String, Skip> {
        let path = match classify(src, &self.base_dir)? {
            Source::Embedded => return Err(Skip::Embedded),
            Source::Remote => return Err(Skip::Remote),
            Source::Local(path) => path,
        };
        let path = existing_candidate(&path).ok_or_else(|| {
            Skip::Failed(ImageWarning::NotFound {
                src: src.to_string(),
                path: path.clone(),
            })
        })?;

        if let Some(limit) = self.max_bytes {
            let size = std::fs::metadata(&path)
                .map(|m| m.len())
                .map_err(|e| read_failed(src, &path, &e))?;
            if size > limit {
                return Err(Skip::Failed(ImageWarning::TooLarge {
                    src: src.to_string(),
                    size,
                    limit,
                }));
            }
        }

        let bytes = std::fs::read(&path).map_err(|e| read_failed(src, &path, &e))?;
        let media_type = encode::media_type(&bytes, &path, &self.media_type);
        debug!("Inlining '{}' from {} as {}", src, path.display(), media_type);
        Ok(encode::data_uri(&bytes, &media_type))
    }
}

enum Skip {
    Embedded,
    Remote,
    Failed(ImageWarning),
}

fn read_failed(src: &str, path: &Path, e: &std::io::Error) -> Skip {
    Skip::Failed(ImageWarning::ReadFailed {
        src: src.to_string(),
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Decide what kind of reference `src` is, resolving local ones.
fn classify(src: &str, base_dir: &Path) -> Result<Source, Skip> {
    let decoded = html_escape::decode_html_entities(src.trim());
    if encode::is_data_uri(&decoded) {
        return Ok(Source::Embedded);
    }
    if decoded.starts_with("//") {
        return Ok(Source::Remote);
    }

    if has_scheme(&decoded) {
        let url = Url::parse(&decoded).map_err(|e| unresolvable(src, e.to_string()))?;
        if url.scheme() != "file" {
            return Ok(Source::Remote);
        }
        return url
            .to_file_path()
            .map(Source::Local)
            .map_err(|()| unresolvable(src, "file URI does not name a local path".into()));
    }

    // A file name may itself contain `?` or `#`; the literal path wins.
    let literal = resolve(&decoded, base_dir);
    if existing_candidate(&literal).is_some() {
        return Ok(Source::Local(literal));
    }
    let local = strip_query_and_fragment(&decoded);
    if local.is_empty() {
        return Err(unresolvable(src, "reference has no path".into()));
    }
    Ok(Source::Local(resolve(local, base_dir)))
}

fn resolve(local: &str, base_dir: &Path) -> PathBuf {
    let path = Path::new(local);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn mentions_img(html: &str) -> bool {
    html.as_bytes()
        .windows(4)
        .any(|w| w.eq_ignore_ascii_case(b"<img"))
}

fn unresolvable(src: &str, detail: String) -> Skip {
    Skip::Failed(ImageWarning::Unresolvable {
        src: src.to_string(),
        detail,
    })
}

/// `scheme:` prefix per RFC 3986; single letters are Windows drive paths.
fn has_scheme(src: &str) -> bool {
    let Some((scheme, _)) = src.split_once(':') else {
        return false;
    };
    scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn strip_query_and_fragment(src: &str) -> &str {
    let end = src.find(['?', '#']).unwrap_or(src.len());
    &src[..end]
}

/// The path itself, or its percent-decoded form, whichever exists.
fn existing_candidate(path: &Path) -> Option<PathBuf> {
    if path.exists() {
        return Some(path.to_path_buf());
    }
    let raw = path.to_str()?;
    if !raw.contains('%') {
        return None;
    }
    let decoded = percent_decode_str(raw).decode_utf8().ok()?;
    let decoded = PathBuf::from(decoded.as_ref());
    decoded.exists().then_some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use pretty_assertions::assert_eq;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn src_of(html: &str) -> &str {
        let start = html.find("src=\"").expect("src attribute") + 5;
        let end = html[start..].find('"').expect("closing quote") + start;
        &html[start..end]
    }

    #[test]
    fn no_images_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let html = "<h1>Title</h1>\n<p>No <em>images</em> here &amp; there.</p>\n";
        let out = ImageInliner::new(dir.path()).inline(html).unwrap();
        assert_eq!(out.html, html);
        assert!(out.report.is_empty());
    }

    #[test]
    fn local_image_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pic.png"), PNG_MAGIC).unwrap();
        let html = "<p><img src=\"pic.png\" alt=\"A picture\" width=\"10\" /></p>\n";

        let out = ImageInliner::new(dir.path()).inline(html).unwrap();
        let src = src_of(&out.html);
        let payload = src.strip_prefix("data:image/png;base64,").expect("data prefix");
        assert_eq!(STANDARD.decode(payload).unwrap(), PNG_MAGIC);
        assert!(out.html.contains("alt=\"A picture\""));
        assert!(out.html.contains("width=\"10\""));
        assert_eq!(out.report.inlined, 1);
    }

    #[test]
    fn legacy_media_type() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pic.png"), PNG_MAGIC).unwrap();
        let out = ImageInliner::new(dir.path())
            .media_type(MediaTypePolicy::legacy())
            .inline("<img src=\"pic.png\">")
            .unwrap();
        assert!(src_of(&out.html).starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn missing_image_keeps_src() {
        let dir = tempfile::tempdir().unwrap();
        let html = "<p><img src=\"pic.png\" alt=\"x\"></p>";
        let out = ImageInliner::new(dir.path()).inline(html).unwrap();
        assert_eq!(out.html, html);
        assert_eq!(out.report.failed(), 1);
        assert!(matches!(
            out.report.warnings[0],
            ImageWarning::NotFound { ref src, .. } if src == "pic.png"
        ));
    }

    #[test]
    fn remote_and_embedded_are_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let html = "<img src=\"https://example.com/a.png\"><img src=\"//cdn.test/b.png\"><img src=\"data:image/gif;base64,R0lGOD\"><img src=\"\">";
        let out = ImageInliner::new(dir.path()).inline(html).unwrap();
        assert_eq!(out.html, html);
        assert_eq!(out.report.skipped_remote, 2);
        assert_eq!(out.report.already_embedded, 1);
        assert!(out.report.warnings.is_empty());
    }

    #[test]
    fn inlining_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pic.png"), PNG_MAGIC).unwrap();
        let inliner = ImageInliner::new(dir.path());
        let once = inliner.inline("<img src=\"pic.png\">").unwrap().html;
        let twice = inliner.inline(&once).unwrap();
        assert_eq!(twice.html, once);
        assert_eq!(twice.report.already_embedded, 1);
    }

    #[test]
    fn file_uri_and_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("abs.png");
        std::fs::write(&file, PNG_MAGIC).unwrap();
        let uri = Url::from_file_path(&file).unwrap();
        let other = tempfile::tempdir().unwrap();

        let html = format!("<img src=\"{uri}\"><img src=\"{}\">", file.display());
        let out = ImageInliner::new(other.path()).inline(&html).unwrap();
        assert_eq!(out.report.inlined, 2, "warnings: {:?}", out.report.warnings);
    }

    #[test]
    fn percent_encoded_name_resolves() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("my pic.png"), PNG_MAGIC).unwrap();
        let out = ImageInliner::new(dir.path())
            .inline("<img src=\"my%20pic.png\">")
            .unwrap();
        assert_eq!(out.report.inlined, 1);
    }

    #[test]
    fn character_references_are_decoded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pic.png"), PNG_MAGIC).unwrap();
        std::fs::write(dir.path().join("john's.png"), PNG_MAGIC).unwrap();
        std::fs::write(dir.path().join("a&b.png"), PNG_MAGIC).unwrap();

        let out = ImageInliner::new(dir.path())
            .inline(
                "<img src=\"pic&#46;png\"><img src=\"john&#x27;s.png\"><img src=\"a&amp;b.png\">",
            )
            .unwrap();
        assert_eq!(out.report.inlined, 3, "{:?}", out.report.warnings);
        assert!(out.report.warnings.is_empty());
    }

    #[test]
    fn hash_in_file_name_resolves() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("issue#12.png"), PNG_MAGIC).unwrap();
        let out = ImageInliner::new(dir.path())
            .inline("<img src=\"issue#12.png\">")
            .unwrap();
        assert_eq!(out.report.inlined, 1, "{:?}", out.report.warnings);
    }

    #[test]
    fn query_string_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pic.png"), PNG_MAGIC).unwrap();
        let out = ImageInliner::new(dir.path())
            .inline("<img src=\"pic.png?v=2#frag\">")
            .unwrap();
        assert_eq!(out.report.inlined, 1);
    }

    #[test]
    fn oversize_image_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big.png"), vec![0u8; 64]).unwrap();
        let html = "<img src=\"big.png\">";
        let out = ImageInliner::new(dir.path())
            .max_bytes(Some(16))
            .inline(html)
            .unwrap();
        assert_eq!(out.html, html);
        assert!(matches!(
            out.report.warnings[0],
            ImageWarning::TooLarge { size: 64, limit: 16, .. }
        ));
    }

    #[test]
    fn directory_is_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("folder.png")).unwrap();
        let out = ImageInliner::new(dir.path())
            .inline("<img src=\"folder.png\">")
            .unwrap();
        assert!(matches!(
            out.report.warnings[0],
            ImageWarning::ReadFailed { .. }
        ));
    }

    #[test]
    fn mixed_success_and_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.png"), PNG_MAGIC).unwrap();
        let html = "<img src=\"ok.png\"><img src=\"missing.png\">";
        let out = ImageInliner::new(dir.path()).inline(html).unwrap();
        assert!(out.html.contains("src=\"missing.png\""));
        assert!(out.html.contains("data:image/png;base64,"));
        assert_eq!(out.report.inlined, 1);
        assert_eq!(out.report.failed(), 1);
    }

    #[test]
    fn fragment_only_reference_is_unresolvable() {
        let dir = tempfile::tempdir().unwrap();
        let out = ImageInliner::new(dir.path())
            .inline("<img src=\"#anchor\">")
            .unwrap();
        assert!(matches!(
            out.report.warnings[0],
            ImageWarning::Unresolvable { ref src, .. } if src == "#anchor"
        ));
    }

    #[test]
    fn scheme_detection() {
        assert!(has_scheme("https://x"));
        assert!(has_scheme("file:///tmp/a.png"));
        assert!(has_scheme("mailto:x"));
        assert!(!has_scheme("C:\\images\\a.png"));
        assert!(!has_scheme("images/a.png"));
        assert!(!has_scheme("1x:foo"));
    }
}
