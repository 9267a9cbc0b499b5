//! Image encoding: file bytes → `data:<media-type>;base64,<payload>`.
//!
//! The media type comes from the file's magic bytes when the `image` crate
//! recognises them, then from the file extension, and finally falls back to
//! `application/octet-stream`. [`MediaTypePolicy::Fixed`] bypasses detection.

use crate::config::MediaTypePolicy;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::borrow::Cow;
use std::path::Path;
use tracing::debug;

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Choose the media type for an image under `policy`.
pub fn media_type<'a>(bytes: &[u8], path: &Path, policy: &'a MediaTypePolicy) -> Cow<'a, str> {
    match policy {
        MediaTypePolicy::Fixed(mt) => Cow::Borrowed(mt.as_str()),
        MediaTypePolicy::Sniff => Cow::Borrowed(sniff(bytes, path)),
    }
}

fn sniff(bytes: &[u8], path: &Path) -> &'static str {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type();
    }
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_MEDIA_TYPE)
}

/// Build a `data:` URI embedding `bytes`.
pub fn data_uri(bytes: &[u8], media_type: &str) -> String {
    let payload = STANDARD.encode(bytes);
    debug!(
        "Encoded {} bytes as {} → {} bytes base64",
        bytes.len(),
        media_type,
        payload.len()
    );
    let mut uri = String::with_capacity(payload.len() + media_type.len() + 13);
    uri.push_str("data:");
    uri.push_str(media_type);
    uri.push_str(";base64,");
    uri.push_str(&payload);
    uri
}

/// True when `src` already embeds its content.
pub fn is_data_uri(src: &str) -> bool {
    src.get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:"))
}
