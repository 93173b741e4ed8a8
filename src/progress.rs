//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as [`crate::batch::convert_dir`] works through a directory tree.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a log, or a terminal progress bar without the
//! library knowing how the host application communicates. The trait is
//! `Send + Sync` because jobs run concurrently.
//!
//! # Example
//!
//! ```rust
//! use docs2gfm::{ConversionProgressCallback, ConversionConfig};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_job_complete(&self, index: usize, total: usize, path: &Path, markdown_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} {} ({} bytes)", index + 1, total, path.display(), markdown_len);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the batch orchestrator as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
///
/// # Thread safety
///
/// `on_job_start`, `on_job_complete` and `on_job_error` may be called
/// concurrently and in any order across jobs. Protect shared mutable state
/// with `Mutex` or atomics.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after discovery, before any job starts.
    fn on_batch_start(&self, total_jobs: usize) {
        let _ = total_jobs;
    }

    /// Called just before a file is converted.
    ///
    /// # Arguments
    /// * `index` — 0-indexed position in discovery order
    /// * `total` — number of jobs in the batch
    /// * `path`  — source file
    fn on_job_start(&self, index: usize, total: usize, path: &Path) {
        let _ = (index, total, path);
    }

    /// Called when a file's Markdown has been written.
    ///
    /// `markdown_len` is the byte length of the output.
    fn on_job_complete(&self, index: usize, total: usize, path: &Path, markdown_len: usize) {
        let _ = (index, total, path, markdown_len);
    }

    /// Called when a file fails. Sibling jobs are unaffected.
    fn on_job_error(&self, index: usize, total: usize, path: &Path, error: &str) {
        let _ = (index, total, path, error);
    }

    /// Called once after every job has been attempted.
    fn on_batch_complete(&self, total_jobs: usize, success_count: usize) {
        let _ = (total_jobs, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: Mutex<Vec<String>>,
        batch_total: AtomicUsize,
        batch_success: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total_jobs: usize) {
            self.batch_total.store(total_jobs, Ordering::SeqCst);
        }

        fn on_job_start(&self, _index: usize, _total: usize, _path: &Path) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_job_complete(&self, _index: usize, _total: usize, _path: &Path, _len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_job_error(&self, _index: usize, _total: usize, path: &Path, error: &str) {
            self.errors
                .lock()
                .unwrap()
                .push(format!("{}: {}", path.display(), error));
        }

        fn on_batch_complete(&self, _total_jobs: usize, success_count: usize) {
            self.batch_success.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(5);
        cb.on_job_start(0, 5, Path::new("a.html"));
        cb.on_job_complete(0, 5, Path::new("a.html"), 42);
        cb.on_job_error(1, 5, Path::new("b.pdf"), "some error");
        cb.on_batch_complete(5, 4);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_batch_start(3);
        assert_eq!(tracker.batch_total.load(Ordering::SeqCst), 3);

        tracker.on_job_start(0, 3, Path::new("a.html"));
        tracker.on_job_complete(0, 3, Path::new("a.html"), 100);
        tracker.on_job_start(1, 3, Path::new("b.html"));
        tracker.on_job_complete(1, 3, Path::new("b.html"), 200);
        tracker.on_job_start(2, 3, Path::new("c.pdf"));
        tracker.on_job_error(2, 3, Path::new("c.pdf"), "pdftohtml not found");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(
            tracker.errors.lock().unwrap().as_slice(),
            ["c.pdf: pdftohtml not found".to_string()]
        );

        tracker.on_batch_complete(3, 2);
        assert_eq!(tracker.batch_success.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10);
        cb.on_job_start(0, 10, Path::new("x.htm"));
        cb.on_job_complete(0, 10, Path::new("x.htm"), 512);
    }
}
