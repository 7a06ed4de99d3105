//! Frame pipeline driver: decode, sample, annotate, encode.

use crate::classify::{Classifier, Emotion};
use crate::config::Config;
use crate::defaults;
use crate::error::Result;
use crate::overlay::{IconSet, LabelFont, OverlayLayout, OverlayRenderer};
use crate::pipeline::engine::{EngineConfig, OverlayEngine};
use crate::pipeline::error::{ErrorReporter, LogReporter, ThrottledReporter};
use crate::pipeline::queue::{SampleSender, sampling_queue};
use crate::pipeline::state::SharedState;
use crate::pipeline::station::{RunnerOptions, StationRunner};
use crate::pipeline::types::{
    FrameTrace, Sample, VideoSummary, count_labels, majority,
};
use crate::pipeline::worker::ClassifierStation;
use crate::video::{FrameSink, FrameSource};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Classify every Nth frame
    pub sample_interval: u64,
    /// Sampling queue capacity
    pub queue_capacity: usize,
    /// Stop after this many decoded frames
    pub frame_limit: Option<u64>,
    /// Smoothing and icon hysteresis thresholds
    pub engine: EngineConfig,
    /// Width frames are shrunk to before classification
    pub classify_width: u32,
    /// Worker dequeue timeout
    pub poll_interval: Duration,
    /// How long shutdown waits for the worker
    pub join_timeout: Duration,
    /// Only log worker failures for frame indices divisible by this
    pub error_log_every: u64,
    /// Text and icon placement
    pub layout: OverlayLayout,
    /// Label font; without one frames only get the icon
    pub font: Option<LabelFont>,
    /// Keep every frame's decision in the summary
    pub record_trace: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_interval: defaults::SAMPLE_INTERVAL,
            queue_capacity: defaults::QUEUE_CAPACITY,
            frame_limit: None,
            engine: EngineConfig::default(),
            classify_width: defaults::CLASSIFY_WIDTH,
            poll_interval: Duration::from_millis(defaults::POLL_INTERVAL_MS),
            join_timeout: Duration::from_millis(defaults::JOIN_TIMEOUT_MS),
            error_log_every: defaults::ERROR_LOG_EVERY,
            layout: OverlayLayout::default(),
            font: None,
            record_trace: false,
        }
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            sample_interval: config.sampling.interval,
            queue_capacity: config.sampling.queue_capacity,
            frame_limit: config.sampling.frame_limit,
            engine: EngineConfig {
                window: config.smoothing.window,
                min_confidence: config.smoothing.min_confidence,
                hold_frames: config.overlay.hold_frames,
                change_threshold: config.overlay.change_threshold,
            },
            classify_width: config.classifier.target_width,
            poll_interval: Duration::from_millis(config.worker.poll_interval_ms),
            join_timeout: Duration::from_millis(config.worker.join_timeout_ms),
            error_log_every: config.worker.error_log_every,
            layout: OverlayLayout::from(&config.overlay),
            font: None,
            record_trace: false,
        }
    }
}

/// Counters from the decode loop.
#[derive(Debug, Default)]
struct LoopStats {
    frames_read: u64,
    frames_written: u64,
    stopped_early: bool,
    trace: Vec<FrameTrace>,
}

/// Video pipeline: FrameSource → overlay → FrameSink, with a classification
/// worker fed from sampled frames.
pub struct Pipeline {
    config: PipelineConfig,
    error_reporter: Arc<dyn ErrorReporter>,
}

impl Pipeline {
    /// Creates a new pipeline with default error reporter.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            error_reporter: Arc::new(LogReporter),
        }
    }

    /// Sets a custom error reporter.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process a whole video.
    ///
    /// Frames are written in decode order, one output frame per input frame.
    /// Setting `cancel` stops at the next frame; the frames written so far are
    /// still finalised and summarised.
    ///
    /// # Errors
    /// Fails if the very first frame cannot be decoded, or if writing or
    /// finalising the output fails. Decode errors after the first frame end
    /// the stream early instead.
    pub fn run(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
        classifier: Arc<dyn Classifier>,
        icons: IconSet,
        cancel: Arc<AtomicBool>,
    ) -> Result<VideoSummary> {
        let started = Instant::now();
        let info = source.info();
        tracing::info!(
            "Processing {}x{} @ {:.2} fps (~{} frames), classifier '{}', sampling every {} frame(s)",
            info.width,
            info.height,
            info.fps,
            info.frame_count,
            classifier.name(),
            self.config.sample_interval.max(1)
        );

        let (sender, receiver) = sampling_queue(self.config.queue_capacity);
        let state = Arc::new(SharedState::new());
        let stop = Arc::new(AtomicBool::new(false));

        let station = ClassifierStation::new(classifier, self.config.classify_width).with_reporter(
            ThrottledReporter::new(self.error_reporter.clone(), self.config.error_log_every),
        );
        let publish_state = state.clone();
        let runner = StationRunner::spawn(
            station,
            receiver,
            move |c| publish_state.publish(c.label, c.confidence),
            RunnerOptions {
                poll_interval: self.config.poll_interval,
                stop: stop.clone(),
            },
            self.error_reporter.clone(),
        );

        let renderer =
            OverlayRenderer::new(icons, self.config.layout).with_font(self.config.font.clone());
        let stats = self.drive(source, sink, &sender, &state, renderer, &cancel);

        // Shut the worker down whatever happened in the loop
        stop.store(true, Ordering::SeqCst);
        if !sender.close() {
            tracing::debug!("Sampling queue full at shutdown, worker will see the stop flag");
        }
        let worker_joined = runner.join_timeout(self.config.join_timeout).is_joined();

        let stats = stats?;
        sink.finish()?;

        let results = state.results();
        let latest = state.snapshot();
        let summary = VideoSummary {
            frames_read: stats.frames_read,
            frames_written: stats.frames_written,
            samples_offered: sender.offered(),
            samples_dropped: sender.dropped(),
            frames_analyzed: latest.processed,
            counts: count_labels(&results),
            overall: majority(&results)
                .or(latest.label)
                .unwrap_or(Emotion::Neutral),
            stopped_early: stats.stopped_early,
            worker_joined,
            trace: stats.trace,
        };

        tracing::info!(
            "Done in {:.1}s: {} frames written, {} analysed, {} sample(s) dropped, overall {}",
            started.elapsed().as_secs_f64(),
            summary.frames_written,
            summary.frames_analyzed,
            summary.samples_dropped,
            summary.overall
        );
        Ok(summary)
    }

    /// Decode loop. Runs on the caller's thread and never waits on the worker.
    fn drive(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
        sender: &SampleSender<Sample>,
        state: &SharedState,
        mut renderer: OverlayRenderer,
        cancel: &AtomicBool,
    ) -> Result<LoopStats> {
        let interval = self.config.sample_interval.max(1);
        let (out_width, out_height) = sink.dimensions();
        let mut engine = OverlayEngine::new(self.config.engine);
        let mut stats = LoopStats::default();
        let mut resize_warned = false;

        loop {
            if cancel.load(Ordering::SeqCst) {
                tracing::info!("Cancelled after {} frames", stats.frames_read);
                stats.stopped_early = true;
                break;
            }
            if let Some(limit) = self.config.frame_limit
                && stats.frames_read >= limit
            {
                tracing::info!("Frame limit of {limit} reached");
                stats.stopped_early = true;
                break;
            }

            let frame = match source.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) if stats.frames_read == 0 => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        "Decoding stopped after {} frames: {e}",
                        stats.frames_read
                    );
                    break;
                }
            };
            let index = stats.frames_read;
            stats.frames_read += 1;

            if index % interval == 0
                && !sender.try_enqueue(Sample {
                    index,
                    frame: frame.clone(),
                })
            {
                tracing::trace!(frame = index, "Sampling queue full, sample dropped");
            }

            let decision = engine.step(index, &state.snapshot());
            let mut annotated = frame;
            renderer.render(&mut annotated, &decision);

            if (annotated.width, annotated.height) != (out_width, out_height) {
                match annotated.resized(out_width, out_height) {
                    Some(resized) => annotated = resized,
                    None if !resize_warned => {
                        tracing::warn!(
                            "Cannot resize {}x{} frame to {out_width}x{out_height}",
                            annotated.width,
                            annotated.height
                        );
                        resize_warned = true;
                    }
                    None => {}
                }
            }

            sink.write_frame(&annotated)?;
            stats.frames_written += 1;

            if self.config.record_trace {
                stats.trace.push(FrameTrace::from(&decision));
            }
            if stats.frames_read % 100 == 0 {
                tracing::debug!(
                    "{} frames written, {} analysed",
                    stats.frames_written,
                    state.processed()
                );
            }
        }

        Ok(stats)
    }
}
