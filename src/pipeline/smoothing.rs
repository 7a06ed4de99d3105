//! Rolling-window smoothing and majority voting of classifications.
//!
//! The worker's latest result is re-read on every decoded frame. Results
//! confident enough are pushed into a fixed-size window, and the label shown
//! is the window's majority. An empty window keeps the last label on screen.

use crate::classify::Emotion;
use crate::pipeline::types::{DisplayText, LatestSample};
use std::collections::VecDeque;

/// Outcome of voting over the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vote {
    /// Most frequent label.
    pub label: Emotion,
    /// Mean confidence of every entry in the window.
    pub confidence: f32,
    /// Share of the window held by `label`, in (0, 1].
    pub consensus: f32,
}

/// Bounded, insertion-ordered window of confidence-gated predictions.
#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    entries: VecDeque<(Emotion, f32)>,
    capacity: usize,
    min_confidence: f32,
}

impl SmoothingWindow {
    /// `capacity` of 0 is raised to 1.
    pub fn new(capacity: usize, min_confidence: f32) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            min_confidence,
        }
    }

    /// Push a prediction if its confidence reaches the threshold, evicting the
    /// oldest entry when full. Returns whether it was admitted.
    pub fn admit(&mut self, label: Emotion, confidence: f32) -> bool {
        if confidence.is_nan() || confidence < self.min_confidence {
            return false;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((label, confidence));
        true
    }

    /// Majority vote over the window, `None` when empty.
    ///
    /// Equal counts go to the label whose first occurrence is oldest.
    pub fn vote(&self) -> Option<Vote> {
        // (label, count) in order of first occurrence
        let mut tally: Vec<(Emotion, usize)> = Vec::with_capacity(Emotion::ALL.len());
        let mut total = 0.0f32;
        for &(label, confidence) in &self.entries {
            total += confidence;
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

        let (label, count) = best?;
        let len = self.entries.len() as f32;
        Some(Vote {
            label,
            confidence: total / len,
            consensus: count as f32 / len,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Labels currently in the window, oldest first.
    pub fn labels(&self) -> impl Iterator<Item = Emotion> + '_ {
        self.entries.iter().map(|(label, _)| *label)
    }
}

/// Text decision for one frame plus the vote it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothed {
    pub text: DisplayText,
    pub vote: Option<Vote>,
}

/// Per-frame smoothing with flicker suppression.
#[derive(Debug, Clone)]
pub struct SmoothingEngine {
    window: SmoothingWindow,
    previous: Option<Emotion>,
}

impl SmoothingEngine {
    pub fn new(window: usize, min_confidence: f32) -> Self {
        Self {
            window: SmoothingWindow::new(window, min_confidence),
            previous: None,
        }
    }

    /// Feed this frame's snapshot of the latest result and decide the text.
    pub fn update(&mut self, latest: &LatestSample) -> Smoothed {
        if let Some(label) = latest.label {
            self.window.admit(label, latest.confidence);
        }

        match self.window.vote() {
            Some(vote) => {
                self.previous = Some(vote.label);
                Smoothed {
                    text: DisplayText::Voted {
                        label: vote.label,
                        confidence: vote.confidence,
                    },
                    vote: Some(vote),
                }
            }
            None => Smoothed {
                text: self
                    .previous
                    .map_or(DisplayText::Analyzing, DisplayText::Held),
                vote: None,
            },
        }
    }

    pub fn window(&self) -> &SmoothingWindow {
        &self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Emotion::{Happy, Neutral, Sad};

    fn window_of(entries: &[(Emotion, f32)]) -> SmoothingWindow {
        let mut window = SmoothingWindow::new(entries.len().max(1), 0.0);
        for &(label, conf) in entries {
            window.admit(label, conf);
        }
        window
    }

    fn latest(label: Emotion, confidence: f32) -> LatestSample {
        LatestSample {
            label: Some(label),
            confidence,
            processed: 1,
        }
    }

    #[test]
    fn test_confidence_gate() {
        let mut window = SmoothingWindow::new(5, 50.0);
        assert!(!window.admit(Happy, 49.9));
        assert!(window.admit(Happy, 50.0));
        assert!(!window.admit(Sad, f32::NAN));
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_oldest_entry_evicted() {
        let mut window = SmoothingWindow::new(3, 0.0);
        for label in [Happy, Sad, Sad, Neutral] {
            window.admit(label, 60.0);
        }
        assert_eq!(window.labels().collect::<Vec<_>>(), vec![Sad, Sad, Neutral]);
        assert_eq!(window.capacity(), 3);
    }

    #[test]
    fn test_vote_mode_mean_and_consensus() {
        let window = window_of(&[(Happy, 90.0), (Sad, 60.0), (Happy, 60.0), (Neutral, 70.0)]);
        let vote = window.vote().unwrap();
        assert_eq!(vote.label, Happy);
        assert_eq!(vote.confidence, 70.0);
        assert_eq!(vote.consensus, 0.5);
    }

    #[test]
    fn test_vote_tie_goes_to_earliest_first_occurrence() {
        let window = window_of(&[(Sad, 60.0), (Happy, 90.0), (Happy, 90.0), (Sad, 60.0)]);
        assert_eq!(window.vote().unwrap().label, Sad);

        let window = window_of(&[(Neutral, 60.0), (Happy, 90.0), (Sad, 99.0)]);
        assert_eq!(window.vote().unwrap().label, Neutral);
    }

    #[test]
    fn test_vote_is_deterministic_over_sequences() {
        // Every sequence of length 4 over the three labels
        for code in 0..81u32 {
            let labels: Vec<Emotion> = (0..4)
                .map(|i| Emotion::ALL[((code / 3u32.pow(i)) % 3) as usize])
                .collect();
            let entries: Vec<(Emotion, f32)> = labels.iter().map(|&l| (l, 75.0)).collect();
            let first = window_of(&entries).vote().unwrap();
            let second = window_of(&entries).vote().unwrap();
            assert_eq!(first, second);

            // Expected: highest count, earliest first occurrence among ties
            let count = |l: Emotion| labels.iter().filter(|&&x| x == l).count();
            let top = labels.iter().map(|&l| count(l)).max().unwrap();
            let expected = *labels.iter().find(|&&l| count(l) == top).unwrap();
            assert_eq!(first.label, expected, "labels {labels:?}");
        }
    }

    #[test]
    fn test_empty_window_has_no_vote() {
        assert!(SmoothingWindow::new(3, 50.0).vote().is_none());
    }

    #[test]
    fn test_engine_shows_analyzing_until_first_accepted_prediction() {
        let mut engine = SmoothingEngine::new(3, 50.0);
        assert_eq!(
            engine.update(&LatestSample::default()).text,
            DisplayText::Analyzing
        );
        // Below threshold: still nothing accepted
        assert_eq!(engine.update(&latest(Happy, 30.0)).text, DisplayText::Analyzing);

        let smoothed = engine.update(&latest(Happy, 80.0));
        assert_eq!(
            smoothed.text,
            DisplayText::Voted {
                label: Happy,
                confidence: 80.0
            }
        );
        assert_eq!(smoothed.vote.unwrap().consensus, 1.0);
    }

    #[test]
    fn test_engine_pushes_latest_every_frame() {
        let mut engine = SmoothingEngine::new(5, 50.0);
        for _ in 0..4 {
            engine.update(&latest(Sad, 70.0));
        }
        assert_eq!(engine.window().len(), 4);
    }

    #[test]
    fn test_engine_majority_lags_behind_latest() {
        let mut engine = SmoothingEngine::new(3, 50.0);
        engine.update(&latest(Happy, 90.0));
        engine.update(&latest(Happy, 90.0));
        let text = engine.update(&latest(Sad, 90.0)).text;
        assert_eq!(text.label(), Some(Happy));
        let text = engine.update(&latest(Sad, 90.0)).text;
        assert_eq!(text.label(), Some(Sad));
    }
}
