//! Video annotation pipeline.
//!
//! Frames are decoded and written on the caller's thread. Every Nth frame is
//! offered to a classification station running on its own thread, connected
//! by a bounded crossbeam channel that drops samples instead of blocking.
//! The station publishes its latest result into shared state, which the
//! decode loop reads once per frame to decide what to draw.

pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod queue;
pub mod smoothing;
pub mod stability;
pub mod state;
pub mod station;
pub mod types;
pub mod worker;

pub use engine::{EngineConfig, OverlayEngine};
pub use error::{ErrorReporter, LogReporter, StationError, ThrottledReporter};
pub use orchestrator::{Pipeline, PipelineConfig};
pub use queue::{Dequeued, QueueItem, SampleReceiver, SampleSender, sampling_queue};
pub use smoothing::{Smoothed, SmoothingEngine, SmoothingWindow, Vote};
pub use stability::IconStability;
pub use state::SharedState;
pub use station::{JoinOutcome, RunnerOptions, Station, StationRunner};
pub use types::{
    Classification, DisplayText, FrameDecision, FrameTrace, LatestSample, Sample, VideoSummary,
    count_labels, majority,
};
pub use worker::ClassifierStation;
