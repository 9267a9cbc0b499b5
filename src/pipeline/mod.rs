//! Pipeline stages for Markdown-to-HTML conversion.
//!
//! Each submodule implements exactly one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ parse ──▶ inline ──▶ assemble
//! (bytes)   (HTML      (data:     (template +
//!            fragment)  URIs)      assets)
//! ```
//!
//! 1. [`input`]    — read and decode the Markdown source
//! 2. [`parse`]    — render the body with the configured backend, then add
//!    heading anchors and expand `[TOC]`
//! 3. [`inline`]   — replace local `<img src>` references with `data:` URIs;
//!    [`encode`] picks the media type and builds the URI
//! 4. [`assemble`] — fill the page template with title, body and assets

pub mod assemble;
pub mod encode;
pub mod inline;
pub mod input;
pub mod parse;
