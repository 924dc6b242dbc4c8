//! Progress reporting and cancellation for contour extraction.
//!
//! Two mechanisms stop an extraction early:
//! - an [`AbortHandle`] that any thread may trip at any time
//! - a [`ProgressCallback`] that returns `false` after a contour value
//!
//! Workers poll the abort flag once per block of cells. A callback cancel
//! stops only the call it was raised in, while an abort stays set until
//! [`AbortHandle::reset`]. Output produced before either is kept.
//!
//! # Example
//!
//! ```
//! use mesh_contour::progress::{Progress, ProgressCallback};
//!
//! let callback: ProgressCallback = Box::new(|progress: &Progress| {
//!     println!("{}% complete: {}", progress.percent(), progress.message);
//!     true // Continue processing (return false to cancel)
//! });
//! # let _ = callback;
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Progress information passed to callbacks.
#[derive(Debug, Clone)]
pub struct Progress {
    /// Contour values finished so far.
    pub current: u64,

    /// Total number of contour values.
    pub total: u64,

    /// Human-readable message describing the last finished step.
    pub message: String,

    /// Elapsed time since extraction started.
    pub elapsed: Duration,

    /// Estimated time remaining (if available).
    pub estimated_remaining: Option<Duration>,
}

impl Progress {
    /// Create a new progress report.
    pub fn new(current: u64, total: u64, message: impl Into<String>) -> Self {
        Self {
            current,
            total,
            message: message.into(),
            elapsed: Duration::ZERO,
            estimated_remaining: None,
        }
    }

    /// Get progress as a fraction (0.0 to 1.0).
    #[inline]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.current as f64) / (self.total as f64)
        }
    }

    /// Get progress as a percentage (0 to 100).
    #[inline]
    pub fn percent(&self) -> u32 {
        (self.fraction() * 100.0).round() as u32
    }

    /// Check if the operation is complete.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.current >= self.total
    }
}

/// Callback function for progress reporting.
///
/// Returns `true` to continue, `false` to request cancellation.
pub type ProgressCallback = Box<dyn Fn(&Progress) -> bool + Send + Sync>;

/// Shared abort flag for a contour filter.
///
/// Cloning yields a handle to the same flag, so a caller may keep one and
/// trip it from another thread while the filter runs. The flag stays set
/// until [`AbortHandle::reset`] is called.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that extraction stop as soon as possible.
    pub fn abort(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Clear a previous abort request.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn flag(&self) -> &AtomicBool {
        &self.flag
    }
}

/// Tracks per-value progress of one extraction call.
///
/// Cancellation requested through [`cancel`](Self::cancel) or the callback
/// lives in the tracker, so it ends with the call. The shared abort handle
/// is only read.
#[derive(Debug)]
pub struct ProgressTracker {
    current: AtomicU64,
    total: u64,
    abort: AbortHandle,
    cancelled: AtomicBool,
    start_time: Instant,
}

impl ProgressTracker {
    /// Create a tracker that also honours aborts raised on `abort`.
    pub fn new(total: u64, abort: AbortHandle) -> Self {
        Self {
            current: AtomicU64::new(0),
            total,
            abort,
            cancelled: AtomicBool::new(false),
            start_time: Instant::now(),
        }
    }

    /// Increment progress by one.
    #[inline]
    pub fn increment(&self) {
        self.current.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current progress value.
    #[inline]
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Relaxed)
    }

    /// Get the total count.
    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Check if this call was cancelled or the shared handle aborted.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed) || self.abort.is_aborted()
    }

    /// Cancel this call only.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Get elapsed time.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Estimate remaining time based on current progress.
    pub fn estimated_remaining(&self) -> Option<Duration> {
        let current = self.current();
        if current == 0 {
            return None;
        }

        let rate = current as f64 / self.elapsed().as_secs_f64();
        if rate > 0.0 && rate.is_finite() {
            let remaining = self.total.saturating_sub(current) as f64 / rate;
            Some(Duration::from_secs_f64(remaining))
        } else {
            None
        }
    }

    /// Create a Progress snapshot.
    pub fn snapshot(&self, message: impl Into<String>) -> Progress {
        Progress {
            current: self.current(),
            total: self.total,
            message: message.into(),
            elapsed: self.elapsed(),
            estimated_remaining: self.estimated_remaining(),
        }
    }

    /// Report progress to the callback, if any.
    ///
    /// Returns `false` if extraction should stop, either because it was
    /// already cancelled or because the callback requested cancellation.
    pub fn maybe_callback(
        &self,
        callback: Option<&ProgressCallback>,
        message: impl Into<String>,
    ) -> bool {
        if self.is_cancelled() {
            return false;
        }

        let Some(callback) = callback else {
            return true;
        };

        let should_continue = callback(&self.snapshot(message));
        if !should_continue {
            self.cancel();
        }
        should_continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_progress_fraction() {
        let p = Progress::new(1, 4, "value 1");
        assert!((p.fraction() - 0.25).abs() < 1e-12);
        assert_eq!(p.percent(), 25);
        assert!(!p.is_complete());
    }

    #[test]
    fn test_progress_zero_total() {
        let p = Progress::new(0, 0, "nothing");
        assert_eq!(p.fraction(), 0.0);
        assert!(p.is_complete());
    }

    #[test]
    fn test_abort_handle_is_shared() {
        let handle = AbortHandle::new();
        let clone = handle.clone();
        assert!(!handle.is_aborted());
        clone.abort();
        assert!(handle.is_aborted());
        handle.reset();
        assert!(!clone.is_aborted());
    }

    #[test]
    fn test_tracker_without_callback() {
        let tracker = ProgressTracker::new(3, AbortHandle::new());
        tracker.increment();
        assert_eq!(tracker.current(), 1);
        assert!(tracker.maybe_callback(None, "value 0"));
    }

    #[test]
    fn test_callback_cancels_only_this_call() {
        let abort = AbortHandle::new();
        let tracker = ProgressTracker::new(2, abort.clone());
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let callback: ProgressCallback = Box::new(move |progress| {
            seen.fetch_add(1, Ordering::SeqCst);
            progress.current < 1
        });

        assert!(tracker.maybe_callback(Some(&callback), "start"));
        tracker.increment();
        assert!(!tracker.maybe_callback(Some(&callback), "value 0"));
        assert!(tracker.is_cancelled());
        assert!(!abort.is_aborted());

        // Once cancelled the callback is not called again.
        assert!(!tracker.maybe_callback(Some(&callback), "value 1"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // A fresh tracker on the same handle starts clean.
        let next = ProgressTracker::new(2, abort);
        assert!(!next.is_cancelled());
        assert!(next.maybe_callback(Some(&callback), "start"));
    }

    #[test]
    fn test_tracker_sees_shared_abort() {
        let abort = AbortHandle::new();
        let tracker = ProgressTracker::new(1, abort.clone());
        abort.abort();
        assert!(tracker.is_cancelled());
        assert!(!tracker.maybe_callback(None, "value 0"));
    }
}
