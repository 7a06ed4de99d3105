//! Per-frame overlay decisions: smoothing followed by icon stability.

use crate::pipeline::smoothing::SmoothingEngine;
use crate::pipeline::stability::IconStability;
use crate::pipeline::types::{FrameDecision, LatestSample};

/// Thresholds for [`OverlayEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub window: usize,
    pub min_confidence: f32,
    pub hold_frames: u32,
    pub change_threshold: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: crate::defaults::SMOOTH_WINDOW,
            min_confidence: crate::defaults::MIN_CONFIDENCE,
            hold_frames: crate::defaults::HOLD_FRAMES,
            change_threshold: crate::defaults::CHANGE_THRESHOLD,
        }
    }
}

/// Turns the stream of latest-result snapshots into per-frame decisions.
///
/// Pure and synchronous: the decode loop calls `step` once per frame with
/// whatever the worker has published so far.
#[derive(Debug, Clone)]
pub struct OverlayEngine {
    config: EngineConfig,
    smoothing: SmoothingEngine,
    stability: IconStability,
}

impl OverlayEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            smoothing: SmoothingEngine::new(config.window, config.min_confidence),
            stability: IconStability::default(),
        }
    }

    pub fn step(&mut self, index: u64, latest: &LatestSample) -> FrameDecision {
        let smoothed = self.smoothing.update(latest);
        if self.stability.update(
            smoothed.vote.as_ref(),
            self.config.hold_frames,
            self.config.change_threshold,
        ) {
            tracing::debug!(frame = index, icon = ?self.stability.held(), "Icon changed");
        }

        FrameDecision {
            index,
            text: smoothed.text,
            icon: self.stability.held().or(smoothed.text.label()),
        }
    }

    pub fn stability(&self) -> IconStability {
        self.stability
    }
}
