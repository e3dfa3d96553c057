//! Progress reporting for long-running algorithms.
//!
//! Algorithms take a [`Progress`] in their `*_with_progress` variants and call
//! it as work completes.
//!
//! # Example
//!
//! ```
//! use texelgrid::algo::Progress;
//!
//! let progress = Progress::new(|current, total, message| {
//!     println!("[{}/{}] {}", current, total, message);
//! });
//! progress.report(1, 4, "Solving faces");
//! ```

/// A progress callback that receives updates during long-running operations.
///
/// The callback receives:
/// - `current`: Steps completed so far
/// - `total`: Total number of steps
/// - `message`: Description of the current stage
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Create a new progress reporter with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// Report progress of a stage made of `stage_total` items, placed after
    /// `offset` steps of a run that has `total` steps overall.
    ///
    /// Lets the face loop report per face while the pack and snap stages
    /// report as single trailing steps of the same run.
    #[inline]
    pub fn report_stage(
        &self,
        offset: usize,
        stage_current: usize,
        total: usize,
        message: &str,
    ) {
        if total == 0 {
            return;
        }
        (self.callback)((offset + stage_current).min(total), total, message);
    }

    /// Create a no-op progress reporter that discards all updates.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_report_stage_clamps_to_total() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = Progress::new(move |current, total, _| {
            sink.lock().unwrap().push((current, total));
        });

        progress.report_stage(4, 1, 6, "Packing");
        progress.report_stage(4, 5, 6, "Snapping");
        progress.report_stage(0, 1, 0, "ignored");

        assert_eq!(*seen.lock().unwrap(), vec![(5, 6), (6, 6)]);
    }
}
