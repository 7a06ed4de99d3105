//! Video input and output.
//!
//! Frames flow from a `FrameSource` (decoder) through the pipeline into a
//! `FrameSink` (encoder). The FFmpeg implementations are used in production;
//! the synthetic source and collector sink drive tests and benchmarks.

pub mod ffmpeg;
pub mod frame;
pub mod sink;
pub mod source;

pub use ffmpeg::{FfmpegFrameSink, FfmpegFrameSource, probe};
pub use frame::Frame;
pub use sink::{CollectorSink, FrameSink};
pub use source::{FrameSource, SyntheticSource, VideoInfo};
