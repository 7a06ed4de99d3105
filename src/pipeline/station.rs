//! Core station abstraction and runner for background pipeline work.

use crate::pipeline::error::{ErrorReporter, StationError};
use crate::pipeline::queue::{Dequeued, SampleReceiver};
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Background work item handler, run on its own thread by [`StationRunner`].
///
/// `process` returns `Ok(None)` when an item yields nothing to publish.
/// A `Recoverable` error is reported and the loop moves on; a `Fatal` one
/// ends the loop.
pub trait Station: Send + 'static {
    type Input: Send + 'static;
    type Output: Send + 'static;

    fn process(&mut self, input: Self::Input) -> Result<Option<Self::Output>, StationError>;

    /// Label used in logs and error reports.
    fn name(&self) -> &'static str;

    /// Runs once on the station thread after the loop exits.
    fn shutdown(&mut self) {}
}

/// How waiting for a station thread ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    Panicked(String),
    /// Still running at the deadline; the thread was detached.
    TimedOut,
}

impl JoinOutcome {
    pub fn is_joined(&self) -> bool {
        matches!(self, JoinOutcome::Joined)
    }
}

/// Settings for the station loop.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// How long one dequeue waits before re-checking `stop`.
    pub poll_interval: Duration,
    /// Set to ask the station to exit at its next poll.
    pub stop: Arc<AtomicBool>,
}

/// Owns the thread a [`Station`] runs on.
pub struct StationRunner<S: Station> {
    handle: Option<JoinHandle<()>>,
    station_name: &'static str,
    _phantom: PhantomData<S>,
}

impl<S: Station> StationRunner<S> {
    /// Start `station` on a new thread, reading from `input`.
    ///
    /// `output` is called on the station thread for every produced value.
    /// The loop ends on the shutdown sentinel, a dropped sender, a fatal
    /// error, or `options.stop`.
    pub fn spawn(
        mut station: S,
        input: SampleReceiver<S::Input>,
        mut output: impl FnMut(S::Output) + Send + 'static,
        options: RunnerOptions,
        error_reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let station_name = station.name();

        let handle = thread::spawn(move || {
            Self::run_station(&mut station, input, &mut output, options, error_reporter);
        });

        Self {
            handle: Some(handle),
            station_name,
            _phantom: PhantomData,
        }
    }

    fn run_station(
        station: &mut S,
        input: SampleReceiver<S::Input>,
        output: &mut impl FnMut(S::Output),
        options: RunnerOptions,
        error_reporter: Arc<dyn ErrorReporter>,
    ) {
        let station_name = station.name();

        while !options.stop.load(Ordering::SeqCst) {
            let item = match input.dequeue(options.poll_interval) {
                Dequeued::Item(item) => item,
                Dequeued::Timeout => continue,
                Dequeued::Shutdown | Dequeued::Disconnected => break,
            };

            match station.process(item) {
                Ok(Some(result)) => output(result),
                Ok(None) => {}
                Err(error) => {
                    let fatal = matches!(error, StationError::Fatal(_));
                    error_reporter.report(station_name, &error);
                    if fatal {
                        break;
                    }
                }
            }
        }

        station.shutdown();
        tracing::debug!(station = station_name, "Station stopped");
    }

    /// Block until the station thread exits.
    pub fn join(mut self) -> Result<(), String> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| format!("{} station panicked", self.station_name)),
            None => Ok(()),
        }
    }

    /// Waits up to `timeout` for the station thread to finish.
    ///
    /// After the deadline the thread is detached; it dies with the process.
    pub fn join_timeout(mut self, timeout: Duration) -> JoinOutcome {
        let Some(handle) = self.handle.take() else {
            return JoinOutcome::Joined;
        };

        let deadline = Instant::now() + timeout;
        let poll_interval = Duration::from_millis(10);

        while !handle.is_finished() {
            if Instant::now() >= deadline {
                tracing::warn!(
                    "Station '{}' still running after {:?}, detaching",
                    self.station_name,
                    timeout
                );
                return JoinOutcome::TimedOut;
            }
            thread::sleep(poll_interval);
        }

        match handle.join() {
            Ok(()) => JoinOutcome::Joined,
            Err(panic_info) => {
                let msg = panic_info
                    .downcast_ref::<&str>()
                    .copied()
                    .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                    .unwrap_or("unknown panic")
                    .to_string();
                tracing::error!("Station '{}' thread panicked: {msg}", self.station_name);
                JoinOutcome::Panicked(msg)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        self.station_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::queue::sampling_queue;
    use crossbeam_channel::unbounded;
    use std::sync::Mutex;

    const POLL: Duration = Duration::from_millis(20);

    fn options() -> (RunnerOptions, Arc<AtomicBool>) {
        let stop = Arc::new(AtomicBool::new(false));
        (
            RunnerOptions {
                poll_interval: POLL,
                stop: stop.clone(),
            },
            stop,
        )
    }

    /// Squares frame indices and records that shutdown ran.
    struct Squarer {
        stopped: Arc<AtomicBool>,
    }

    impl Squarer {
        fn new() -> Self {
            Self {
                stopped: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl Station for Squarer {
        type Input = u64;
        type Output = u64;

        fn process(&mut self, index: u64) -> Result<Option<u64>, StationError> {
            Ok(Some(index * index))
        }

        fn name(&self) -> &'static str {
            "Squarer"
        }

        fn shutdown(&mut self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    /// Passes indices through, except one that fails.
    struct Rejecting {
        reject: u64,
        fatal: bool,
    }

    impl Station for Rejecting {
        type Input = u64;
        type Output = u64;

        fn process(&mut self, index: u64) -> Result<Option<u64>, StationError> {
            if index != self.reject {
                return Ok(Some(index));
            }
            let message = format!("rejected frame {index}");
            Err(if self.fatal {
                StationError::Fatal(message)
            } else {
                StationError::Recoverable(message)
            })
        }

        fn name(&self) -> &'static str {
            "Rejecting"
        }
    }

    struct Sleepy(Duration);

    impl Station for Sleepy {
        type Input = u64;
        type Output = u64;

        fn process(&mut self, index: u64) -> Result<Option<u64>, StationError> {
            thread::sleep(self.0);
            Ok(Some(index))
        }

        fn name(&self) -> &'static str {
            "Sleepy"
        }
    }

    struct Exploding;

    impl Station for Exploding {
        type Input = u64;
        type Output = u64;

        fn process(&mut self, _index: u64) -> Result<Option<u64>, StationError> {
            panic!("boom");
        }

        fn name(&self) -> &'static str {
            "Exploding"
        }
    }

    #[derive(Default)]
    struct Recorder {
        reports: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl ErrorReporter for Recorder {
        fn report(&self, station: &str, error: &StationError) {
            self.reports
                .lock()
                .unwrap()
                .push((station.to_owned(), error.to_string()));
        }
    }

    #[test]
    fn test_runner_processes_until_sentinel() {
        let (tx, rx) = sampling_queue(10);
        let (out_tx, out_rx) = unbounded();
        let (options, _stop) = options();
        let station = Squarer::new();
        let stopped = station.stopped.clone();

        let runner = StationRunner::spawn(
            station,
            rx,
            move |v| out_tx.send(v).unwrap(),
            options,
            Arc::new(Recorder::default()),
        );
        assert_eq!(runner.name(), "Squarer");

        for index in [2, 3, 4] {
            assert!(tx.try_enqueue(index));
        }
        assert!(tx.close());

        assert!(runner.join_timeout(Duration::from_secs(5)).is_joined());
        assert_eq!(out_rx.try_iter().collect::<Vec<_>>(), vec![4, 9, 16]);
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_runner_exits_when_sender_dropped() {
        let (tx, rx) = sampling_queue::<u64>(4);
        let (options, _stop) = options();
        let runner = StationRunner::spawn(
            Squarer::new(),
            rx,
            |_| {},
            options,
            Arc::new(Recorder::default()),
        );
        drop(tx);
        runner.join().unwrap();
    }

    #[test]
    fn test_runner_observes_stop_flag_within_poll() {
        let (_tx, rx) = sampling_queue::<u64>(4);
        let (options, stop) = options();
        let runner = StationRunner::spawn(
            Squarer::new(),
            rx,
            |_| {},
            options,
            Arc::new(Recorder::default()),
        );

        stop.store(true, Ordering::SeqCst);
        let waited = Instant::now();
        assert!(runner.join_timeout(Duration::from_secs(5)).is_joined());
        assert!(waited.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_recoverable_error_is_reported_and_skipped() {
        let (tx, rx) = sampling_queue(10);
        let (out_tx, out_rx) = unbounded();
        let recorder = Arc::new(Recorder::default());
        let reports = recorder.reports.clone();
        let (options, _stop) = options();

        let runner = StationRunner::spawn(
            Rejecting {
                reject: 5,
                fatal: false,
            },
            rx,
            move |v| out_tx.send(v).unwrap(),
            options,
            recorder,
        );

        for index in [0, 5, 10] {
            assert!(tx.try_enqueue(index));
        }
        assert!(tx.close());
        runner.join().unwrap();

        assert_eq!(out_rx.try_iter().collect::<Vec<_>>(), vec![0, 10]);
        let reports = reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, "Rejecting");
        assert!(reports[0].1.contains("rejected frame 5"));
    }

    #[test]
    fn test_fatal_error_ends_loop() {
        let (tx, rx) = sampling_queue(10);
        let (out_tx, out_rx) = unbounded();
        let (options, _stop) = options();

        let runner = StationRunner::spawn(
            Rejecting {
                reject: 5,
                fatal: true,
            },
            rx,
            move |v| out_tx.send(v).unwrap(),
            options,
            Arc::new(Recorder::default()),
        );

        for index in [0, 5, 10] {
            assert!(tx.try_enqueue(index));
        }
        runner.join().unwrap();

        // Frame 10 is never processed
        assert_eq!(out_rx.try_iter().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_join_timeout_detaches_hung_station() {
        let (tx, rx) = sampling_queue(4);
        let (options, stop) = options();
        let runner = StationRunner::spawn(
            Sleepy(Duration::from_secs(2)),
            rx,
            |_| {},
            options,
            Arc::new(Recorder::default()),
        );

        assert!(tx.try_enqueue(1));
        // Let the station pick the item up and start its long sleep
        thread::sleep(Duration::from_millis(100));
        stop.store(true, Ordering::SeqCst);
        assert!(tx.close());

        let waited = Instant::now();
        let outcome = runner.join_timeout(Duration::from_millis(100));
        assert_eq!(outcome, JoinOutcome::TimedOut);
        assert!(waited.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_join_timeout_reports_panic() {
        let (tx, rx) = sampling_queue(4);
        let (options, _stop) = options();
        let runner = StationRunner::spawn(
            Exploding,
            rx,
            |_| {},
            options,
            Arc::new(Recorder::default()),
        );
        assert!(tx.try_enqueue(1));

        match runner.join_timeout(Duration::from_secs(5)) {
            JoinOutcome::Panicked(msg) => assert_eq!(msg, "boom"),
            other => panic!("Expected Panicked, got {other:?}"),
        }
    }
}
