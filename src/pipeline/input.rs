//! Input reading: Markdown bytes from a file or reader into text.
//!
//! Input is decoded as UTF-8. A leading byte-order mark is dropped and
//! invalid sequences are replaced with U+FFFD instead of rejecting the
//! document, since any Unicode text is legal Markdown.

use crate::error::Md2PageError;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A Markdown document ready for parsing.
///
/// Created once at pipeline start and never modified afterwards.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Markdown text.
    pub markdown: String,
    /// Non-empty document title (unescaped).
    pub title: String,
    /// Directory relative image paths resolve against.
    pub base_dir: PathBuf,
}

impl SourceDocument {
    pub fn new(markdown: String, title: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            crate::convert::FALLBACK_TITLE.to_string()
        } else {
            title
        };
        Self {
            markdown,
            title,
            base_dir: base_dir.into(),
        }
    }
}

/// Read a Markdown file fully.
///
/// Missing and unreadable files map to distinct fatal errors carrying the
/// path.
pub fn read_markdown(path: &Path) -> Result<String, Md2PageError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Md2PageError::InputNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => Md2PageError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Md2PageError::InputReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(decode(bytes))
}

/// Read Markdown from an arbitrary reader.
///
/// `label` names the source in error messages (e.g. `<stdin>`).
pub fn read_from(mut reader: impl Read, label: &str) -> Result<String, Md2PageError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|source| Md2PageError::InputReadFailed {
            path: PathBuf::from(label),
            source,
        })?;
    Ok(decode(bytes))
}

/// Decode raw bytes as UTF-8, dropping a BOM and replacing invalid sequences.
pub fn decode(mut bytes: Vec<u8>) -> String {
    if bytes.starts_with(UTF8_BOM) {
        bytes.drain(..UTF8_BOM.len());
    }
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!("Input is not valid UTF-8, decoding lossily");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

/// Directory containing `path`, or `.` for a bare file name.
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
