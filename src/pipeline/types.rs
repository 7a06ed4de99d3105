//! Data types for the emotion-overlay pipeline.

use crate::classify::Emotion;
use crate::defaults;
use crate::video::frame::Frame;
use serde::Serialize;
use std::collections::BTreeMap;

/// A sampled frame on its way to the classification worker.
///
/// Holds its own copy of the pixels so the worker never aliases the frame
/// being encoded.
#[derive(Debug, Clone)]
pub struct Sample {
    pub index: u64,
    pub frame: Frame,
}

/// One successful classification, already reduced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub index: u64,
    pub label: Emotion,
    /// Percent, 0-100.
    pub confidence: f32,
}

/// Snapshot of the shared latest-result record.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatestSample {
    /// `None` until the first classification lands.
    pub label: Option<Emotion>,
    pub confidence: f32,
    pub processed: u64,
}

/// Text label shown on a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayText {
    /// Nothing accepted yet.
    Analyzing,
    /// Window is empty; keep showing the last label.
    Held(Emotion),
    /// Majority of the window with its mean confidence.
    Voted { label: Emotion, confidence: f32 },
}

impl DisplayText {
    pub fn label(&self) -> Option<Emotion> {
        match self {
            DisplayText::Analyzing => None,
            DisplayText::Held(label) | DisplayText::Voted { label, .. } => Some(*label),
        }
    }

    /// The string drawn on the frame.
    pub fn render(&self) -> String {
        match self {
            DisplayText::Analyzing => defaults::ANALYZING_TEXT.to_string(),
            DisplayText::Held(label) => label.to_string(),
            DisplayText::Voted { label, confidence } => format!("{label} ({confidence:.1}%)"),
        }
    }
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameDecision {
    pub index: u64,
    pub text: DisplayText,
    /// Icon to composite, if any.
    pub icon: Option<Emotion>,
}

/// Per-frame record kept when tracing is enabled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameTrace {
    pub index: u64,
    pub text: String,
    pub icon: Option<Emotion>,
}

impl From<&FrameDecision> for FrameTrace {
    fn from(decision: &FrameDecision) -> Self {
        Self {
            index: decision.index,
            text: decision.text.render(),
            icon: decision.icon,
        }
    }
}

/// Aggregate statistics for one processed video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoSummary {
    pub frames_read: u64,
    pub frames_written: u64,
    pub samples_offered: u64,
    pub samples_dropped: u64,
    /// Classifications published by the worker.
    pub frames_analyzed: u64,
    /// Reduced label -> number of classifications.
    pub counts: BTreeMap<Emotion, u64>,
    /// Majority label over the whole video.
    pub overall: Emotion,
    /// Stopped before the end of the input (cancelled or frame limit).
    pub stopped_early: bool,
    /// False when the worker had to be detached at shutdown.
    pub worker_joined: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<FrameTrace>,
}

/// Most frequent label, ties going to the label seen first.
pub fn majority(labels: &[Emotion]) -> Option<Emotion> {
    let mut tally: Vec<(Emotion, usize)> = Vec::new();
    for &label in labels {
        match tally.iter_mut().find(|(l, _)| *l == label) {
            Some((_, count)) => *count += 1,
            None => tally.push((label, 1)),
        }
    }
    let mut best: Option<(Emotion, usize)> = None;
    for (label, count) in tally {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label)
}

/// Count occurrences of each label.
pub fn count_labels(labels: &[Emotion]) -> BTreeMap<Emotion, u64> {
    let mut counts = BTreeMap::new();
    for &label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}
