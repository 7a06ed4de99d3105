//! emoverlay - Emotion overlay for recorded video
//!
//! Decodes a video, classifies the facial emotion in sampled frames on a
//! background worker, and writes a copy annotated with a smoothed label and
//! a stable emoji icon.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod classify;
pub mod config;
pub mod defaults;
pub mod error;
pub mod overlay;
pub mod pipeline;
pub mod video;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
pub mod output;

// Composition root - needs every adapter
#[cfg(feature = "cli")]
pub mod app;

// Core traits (source → process → sink)
pub use classify::classifier::Classifier;
pub use video::sink::FrameSink;
pub use video::source::FrameSource;

// Pipeline
pub use pipeline::orchestrator::{Pipeline, PipelineConfig};
pub use pipeline::types::VideoSummary;

// Error handling
pub use error::{EmoverlayError, Result};

// Config
pub use config::Config;

// Station framework (for advanced users)
pub use pipeline::error::{ErrorReporter, StationError};
pub use pipeline::station::Station;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
