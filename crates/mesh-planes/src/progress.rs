//! Progress reporting and cancellation for fragment classification.
//!
//! ```ignore
//! use mesh_planes::progress::ProgressCallback;
//!
//! let callback: ProgressCallback = Box::new(|progress| {
//!     eprintln!("{}% {}", progress.percent(), progress.message);
//!     true // return false to stop
//! });
//!
//! let analysis = analyze_fragments_with_progress(&fragments, &config, Some(&callback))?;
//! ```

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Progress information passed to callbacks.
#[derive(Debug, Clone)]
pub struct Progress {
    /// Fragments handled so far.
    pub current: u64,

    /// Total number of fragments.
    pub total: u64,

    /// What is being worked on.
    pub message: String,

    /// Elapsed time since the pass started.
    pub elapsed: Duration,

    /// Estimated time remaining, once at least one fragment is done.
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

    /// Progress as a fraction (0.0 to 1.0).
    #[inline]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.current as f64) / (self.total as f64)
        }
    }

    /// Progress as a percentage (0 to 100).
    #[inline]
    pub fn percent(&self) -> u32 {
        (self.fraction() * 100.0).round() as u32
    }

    /// Whether every fragment has been handled.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.current >= self.total
    }
}

/// Callback function for progress reporting.
///
/// Returns `true` to continue, `false` to request cancellation.
pub type ProgressCallback = Box<dyn Fn(&Progress) -> bool + Send + Sync>;

/// Thread-safe progress counter shared by rayon workers.
///
/// Workers bump the counter with atomics; the callback is rate-limited so a
/// pass over many small fragments does not flood the host.
#[derive(Debug)]
pub struct ProgressTracker {
    current: AtomicU64,
    total: u64,
    cancelled: AtomicBool,
    start_time: Instant,
    last_callback_time: Mutex<Option<Instant>>,
    callback_interval: Duration,
}

impl ProgressTracker {
    /// Create a tracker that reports at most every 100 ms.
    pub fn new(total: u64) -> Self {
        Self::with_interval(total, Duration::from_millis(100))
    }

    /// Create a tracker with a custom callback interval.
    pub fn with_interval(total: u64, interval: Duration) -> Self {
        Self {
            current: AtomicU64::new(0),
            total,
            cancelled: AtomicBool::new(false),
            start_time: Instant::now(),
            last_callback_time: Mutex::new(None),
            callback_interval: interval,
        }
    }

    /// Increment progress by one.
    #[inline]
    pub fn increment(&self) {
        self.current.fetch_add(1, Ordering::Relaxed);
    }

    /// Current progress value.
    #[inline]
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Relaxed)
    }

    /// Total count.
    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Whether cancellation was requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Estimate remaining time from the average rate so far.
    pub fn estimated_remaining(&self) -> Option<Duration> {
        let current = self.current();
        if current == 0 {
            return None;
        }

        let rate = current as f64 / self.start_time.elapsed().as_secs_f64();
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
            elapsed: self.start_time.elapsed(),
            estimated_remaining: self.estimated_remaining(),
        }
    }

    /// Call the callback if the interval has passed since the last call.
    ///
    /// Returns `false` once cancellation has been requested.
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

        let now = Instant::now();
        {
            let mut last = self
                .last_callback_time
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if last.is_some_and(|t| now.duration_since(t) < self.callback_interval) {
                return true;
            }
            *last = Some(now);
        }

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
    use std::sync::Arc;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_progress_fraction() {
        let p = Progress::new(3, 4, "fragment 3");
        assert!((p.fraction() - 0.75).abs() < 1e-10);
        assert_eq!(p.percent(), 75);
        assert!(!p.is_complete());
        assert!(Progress::new(4, 4, "done").is_complete());
    }

    #[test]
    fn test_progress_zero_total() {
        let p = Progress::new(0, 0, "empty");
        assert!(p.fraction().abs() < 1e-10);
        assert_eq!(p.percent(), 0);
    }

    #[test]
    fn test_tracker_counts_and_cancel() {
        let tracker = ProgressTracker::new(10);
        tracker.increment();
        tracker.increment();
        assert_eq!(tracker.current(), 2);
        assert_eq!(tracker.total(), 10);
        assert!(tracker.estimated_remaining().is_some());

        tracker.cancel();
        assert!(tracker.is_cancelled());
        assert!(!tracker.maybe_callback(None, "after cancel"));
    }

    #[test]
    fn test_first_callback_is_not_rate_limited() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        let callback: ProgressCallback = Box::new(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            true
        });

        let tracker = ProgressTracker::with_interval(5, Duration::from_secs(3600));
        assert!(tracker.maybe_callback(Some(&callback), "first"));
        assert!(tracker.maybe_callback(Some(&callback), "second"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callback_cancels() {
        let callback: ProgressCallback = Box::new(|p| p.current < 3);
        let tracker = ProgressTracker::with_interval(10, Duration::ZERO);

        let mut stopped_at = None;
        for i in 0..10 {
            tracker.increment();
            if !tracker.maybe_callback(Some(&callback), "fragment") {
                stopped_at = Some(i);
                break;
            }
        }

        assert_eq!(stopped_at, Some(2));
        assert!(tracker.is_cancelled());
    }
}
