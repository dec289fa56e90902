//! Progress-callback trait for per-badge generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to receive
//! events as the pipeline renders each badge and assembles the document.
//!
//! # Example
//!
//! ```rust
//! use badgepress::{GenerationConfig, GenerationProgressCallback};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl GenerationProgressCallback for CountingCallback {
//!     fn on_badge_complete(&self, index: usize, total: usize, path: &Path) {
//!         self.written.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Badge {}/{} → {}", index, total, path.display());
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { written: AtomicUsize::new(0) });
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(counter as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the generation pipeline as it works through the records.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive in record order from a single task.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once, after the spreadsheet has been read.
    ///
    /// # Arguments
    /// * `total_badges`: number of records that will be rendered
    fn on_generation_start(&self, total_badges: usize) {
        let _ = total_badges;
    }

    /// Called just before a badge is rasterised.
    ///
    /// # Arguments
    /// * `index`: 1-indexed badge number
    /// * `total`: total badges in the run
    fn on_badge_start(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called when a badge PNG has been written.
    fn on_badge_complete(&self, index: usize, total: usize, path: &Path) {
        let _ = (index, total, path);
    }

    /// Called when a badge could not be written. The run continues.
    fn on_badge_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once before the written badges are packed into the document.
    fn on_packing_start(&self, images: usize) {
        let _ = images;
    }

    /// Called once after the document has been written.
    ///
    /// # Arguments
    /// * `total_badges`: records read from the spreadsheet
    /// * `written`: badges that made it into the document
    fn on_generation_complete(&self, total_badges: usize, written: usize) {
        let _ = (total_badges, written);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        started_total: AtomicUsize,
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        packed: AtomicUsize,
        written: AtomicUsize,
    }

    impl GenerationProgressCallback for TrackingCallback {
        fn on_generation_start(&self, total_badges: usize) {
            self.started_total.store(total_badges, Ordering::SeqCst);
        }

        fn on_badge_start(&self, _index: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_badge_complete(&self, _index: usize, _total: usize, _path: &Path) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_badge_error(&self, _index: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_packing_start(&self, images: usize) {
            self.packed.store(images, Ordering::SeqCst);
        }

        fn on_generation_complete(&self, _total_badges: usize, written: usize) {
            self.written.store(written, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_generation_start(5);
        cb.on_badge_start(1, 5);
        cb.on_badge_complete(1, 5, Path::new("image001.png"));
        cb.on_badge_error(2, 5, "disk full");
        cb.on_packing_start(4);
        cb.on_generation_complete(5, 4);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_generation_start(3);
        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 3);

        tracker.on_badge_start(1, 3);
        tracker.on_badge_complete(1, 3, Path::new("image001.png"));
        tracker.on_badge_start(2, 3);
        tracker.on_badge_complete(2, 3, Path::new("image002.png"));
        tracker.on_badge_start(3, 3);
        tracker.on_badge_error(3, 3, "permission denied");
        tracker.on_packing_start(2);
        tracker.on_generation_complete(3, 2);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.packed.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.written.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_generation_start(10);
        cb.on_badge_start(1, 10);
        cb.on_badge_complete(1, 10, Path::new("image001.png"));
    }
}
