//! Error types and reporting for pipeline stations.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Outcome of a failed station item.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StationError {
    /// The item is skipped and the station keeps running.
    #[error("{0}")]
    Recoverable(String),
    /// The station loop stops.
    #[error("fatal: {0}")]
    Fatal(String),
}

/// Sink for station failures.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, station: &str, error: &StationError);
}

/// Logs through `tracing`: recoverable errors at warn, fatal ones at error.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, station: &str, error: &StationError) {
        match error {
            StationError::Recoverable(_) => tracing::warn!(station, "{error}"),
            StationError::Fatal(_) => tracing::error!(station, "{error}"),
        }
    }
}

/// Forwards per-frame errors only for frame indices divisible by `every`.
///
/// A video with no visible face can fail on every sample; reporting each one
/// would flood the log.
pub struct ThrottledReporter {
    inner: Arc<dyn ErrorReporter>,
    every: u64,
    suppressed: AtomicU64,
}

impl ThrottledReporter {
    /// `every` of 0 is treated as 1 (report everything).
    pub fn new(inner: Arc<dyn ErrorReporter>, every: u64) -> Self {
        Self {
            inner,
            every: every.max(1),
            suppressed: AtomicU64::new(0),
        }
    }

    /// Report `error` for frame `index` if the index is on the reporting grid.
    ///
    /// Returns whether the error was forwarded.
    pub fn report_frame(&self, station: &str, index: u64, error: &StationError) -> bool {
        if index % self.every == 0 {
            self.inner.report(station, error);
            true
        } else {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Number of errors swallowed without being forwarded.
    pub fn suppressed(&self) -> u64 {
        self.suppressed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockReporter {
        errors: Mutex<Vec<String>>,
    }

    impl ErrorReporter for MockReporter {
        fn report(&self, _station: &str, error: &StationError) {
            self.errors.lock().unwrap().push(error.to_string());
        }
    }

    #[test]
    fn test_station_error_display() {
        let skipped = StationError::Recoverable("frame 7: no face".to_string());
        assert_eq!(skipped.to_string(), "frame 7: no face");
        let fatal = StationError::Fatal("classifier gone".to_string());
        assert_eq!(fatal.to_string(), "fatal: classifier gone");
    }

    #[test]
    fn test_log_reporter_accepts_both_kinds() {
        LogReporter.report("Classifier", &StationError::Recoverable("skip".into()));
        LogReporter.report("Classifier", &StationError::Fatal("stop".into()));
    }

    #[test]
    fn test_throttled_reporter_only_forwards_grid_indices() {
        let mock = Arc::new(MockReporter::default());
        let throttled = ThrottledReporter::new(mock.clone(), 100);
        let error = StationError::Recoverable("no face".to_string());

        let forwarded: Vec<u64> = [0, 5, 99, 100, 150, 200, 1000]
            .into_iter()
            .filter(|&i| throttled.report_frame("Classifier", i, &error))
            .collect();

        assert_eq!(forwarded, vec![0, 100, 200, 1000]);
        assert_eq!(mock.errors.lock().unwrap().len(), 4);
        assert_eq!(throttled.suppressed(), 3);
    }

    #[test]
    fn test_throttled_reporter_zero_interval_reports_everything() {
        let mock = Arc::new(MockReporter::default());
        let throttled = ThrottledReporter::new(mock.clone(), 0);
        let error = StationError::Recoverable("x".to_string());
        for i in 0..5 {
            assert!(throttled.report_frame("Classifier", i, &error));
        }
        assert_eq!(mock.errors.lock().unwrap().len(), 5);
    }
}
