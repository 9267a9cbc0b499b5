//! Batch conversion: many Markdown files across a worker pool.
//!
//! Documents are independent. Workers share one [`Converter`] (parser and
//! asset bundle are immutable and `Send + Sync`) and each document is
//! written atomically, so one failing document never affects another.
//! Results come back in input order regardless of completion order.

use crate::config::ConversionConfig;
use crate::convert::{default_output_path, Converter};
use crate::error::Md2PageError;
use crate::output::BatchItem;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where a batch input's page is written.
///
/// With `out_dir` the page keeps the input's file stem inside that
/// directory; otherwise it lands beside the input.
pub fn batch_output_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let beside = default_output_path(input);
    match (out_dir, beside.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => beside,
    }
}

/// Convert every file in `inputs`, writing each page to disk.
///
/// # Returns
/// One [`BatchItem`] per input, in input order. Per-document failures are
/// reported in the item, not as `Err`.
///
/// # Errors
/// Returns `Err(Md2PageError)` only when the batch cannot start at all
/// (parser backend unavailable, worker pool creation failed).
pub fn convert_batch(
    inputs: &[PathBuf],
    out_dir: Option<&Path>,
    config: &ConversionConfig,
) -> Result<Vec<BatchItem>, Md2PageError> {
    let converter = Converter::new(config.clone())?;
    convert_batch_with(&converter, inputs, out_dir)
}

/// [`convert_batch`] over an existing converter.
pub fn convert_batch_with(
    converter: &Converter,
    inputs: &[PathBuf],
    out_dir: Option<&Path>,
) -> Result<Vec<BatchItem>, Md2PageError> {
    let total = inputs.len();
    let config = converter.config();
    let callback = config.progress_callback.as_ref();
    info!(
        "Starting batch of {} document(s) on {} worker(s)",
        total, config.concurrency
    );
    if let Some(cb) = callback {
        cb.on_batch_start(total);
    }
    if inputs.is_empty() {
        if let Some(cb) = callback {
            cb.on_batch_complete(0, 0);
        }
        return Ok(Vec::new());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.concurrency)
        .build()
        .map_err(|e| Md2PageError::Internal(format!("Failed to create worker pool: {e}")))?;

    let items: Vec<BatchItem> = pool.install(|| {
        inputs
            .par_iter()
            .enumerate()
            .map(|(index, input)| {
                if let Some(cb) = callback {
                    cb.on_document_start(index, total, input);
                }
                let output = batch_output_path(input, out_dir);
                match converter.convert_file(input, Some(&output), None) {
                    Ok((written, result)) => {
                        if let Some(cb) = callback {
                            cb.on_document_complete(index, total, result.stats.output_bytes);
                        }
                        BatchItem {
                            input: input.clone(),
                            output: written,
                            stats: Some(result.stats),
                            warnings: result.images.warnings,
                            error: None,
                        }
                    }
                    Err(e) => {
                        warn!("Failed to convert {}: {}", input.display(), e);
                        let message = e.to_string();
                        if let Some(cb) = callback {
                            cb.on_document_error(index, total, &message);
                        }
                        BatchItem {
                            input: input.clone(),
                            output,
                            stats: None,
                            warnings: Vec::new(),
                            error: Some(message),
                        }
                    }
                }
            })
            .collect()
    });

    let succeeded = items.iter().filter(|item| item.is_success()).count();
    info!("Batch complete: {}/{} document(s) converted", succeeded, total);
    if let Some(cb) = callback {
        cb.on_batch_complete(total, succeeded);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{BatchProgressCallback, ProgressCallback};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counter {
        completes: AtomicUsize,
        errors: AtomicUsize,
        successes: AtomicUsize,
    }

    impl BatchProgressCallback for Counter {
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
    fn output_path_in_out_dir() {
        assert_eq!(
            batch_output_path(Path::new("docs/a.md"), Some(Path::new("site"))),
            PathBuf::from("site/a.html")
        );
        assert_eq!(
            batch_output_path(Path::new("docs/a.md"), None),
            PathBuf::from("docs/a.html")
        );
    }

    #[test]
    fn empty_batch() {
        let items = convert_batch(&[], None, &ConversionConfig::default()).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn failures_are_isolated_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.md");
        std::fs::write(&good, "# Good").unwrap();
        let missing = dir.path().join("missing.md");
        let also_good = dir.path().join("also.md");
        std::fs::write(&also_good, "text").unwrap();

        let counter = Arc::new(Counter::default());
        let config = ConversionConfig::builder()
            .concurrency(2)
            .progress_callback(Arc::clone(&counter) as ProgressCallback)
            .build()
            .unwrap();

        let items = convert_batch(
            &[good.clone(), missing.clone(), also_good.clone()],
            None,
            &config,
        )
        .unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].input, good);
        assert!(items[0].is_success());
        assert!(dir.path().join("good.html").exists());
        assert!(!items[1].is_success());
        assert!(items[1].error.as_deref().unwrap_or("").contains("missing.md"));
        assert!(!dir.path().join("missing.html").exists());
        assert!(items[2].is_success());

        assert_eq!(counter.completes.load(Ordering::SeqCst), 2);
        assert_eq!(counter.errors.load(Ordering::SeqCst), 1);
        assert_eq!(counter.successes.load(Ordering::SeqCst), 2);
    }
}
