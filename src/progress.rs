//! Progress-callback trait for batch conversion events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as [`crate::batch::convert_batch`] works through its documents.
//!
//! # Example
//!
//! ```rust
//! use md2page::{BatchProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, index: usize, total: usize, output_bytes: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Document {}/{} done ({} bytes)", index + 1, total, output_bytes);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: AtomicUsize::new(0),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by [`crate::batch::convert_batch`] as it processes each document.
///
/// Documents run on a worker pool, so `on_document_start`,
/// `on_document_complete` and `on_document_error` may be called concurrently
/// from different threads and in any order. Protect shared mutable state with
/// `Mutex` or atomics. All methods default to no-ops.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before any document is converted.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before a document is read.
    ///
    /// # Arguments
    /// * `index` — 0-based position of the document in the batch
    /// * `total` — number of documents in the batch
    /// * `input` — the document's input path
    fn on_document_start(&self, index: usize, total: usize, input: &Path) {
        let _ = (index, total, input);
    }

    /// Called when a document has been written.
    ///
    /// `output_bytes` is the byte length of the written HTML.
    fn on_document_complete(&self, index: usize, total: usize, output_bytes: usize) {
        let _ = (index, total, output_bytes);
    }

    /// Called when a document fails; `error` is the rendered fatal error.
    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        batch_total: AtomicUsize,
        successes: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total: usize) {
            self.batch_total.store(total, Ordering::SeqCst);
        }

        fn on_document_start(&self, _index: usize, _total: usize, _input: &Path) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_complete(&self, _index: usize, _total: usize, _output_bytes: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_error(&self, _index: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, _total: usize, success_count: usize) {
            self.successes.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_document_start(0, 2, Path::new("a.md"));
        cb.on_document_complete(0, 2, 42);
        cb.on_document_error(1, 2, "missing");
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_batch_start(3);
        assert_eq!(tracker.batch_total.load(Ordering::SeqCst), 3);

        tracker.on_document_start(0, 3, Path::new("a.md"));
        tracker.on_document_complete(0, 3, 100);
        tracker.on_document_start(1, 3, Path::new("b.md"));
        tracker.on_document_complete(1, 3, 200);
        tracker.on_document_start(2, 3, Path::new("c.md"));
        tracker.on_document_error(2, 3, "Markdown file not found");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);

        tracker.on_batch_complete(3, 2);
        assert_eq!(tracker.successes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10);
        cb.on_document_complete(0, 10, 512);
    }
}
