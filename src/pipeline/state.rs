//! Latest classification shared between the worker and the decode loop.

use crate::classify::Emotion;
use crate::pipeline::types::LatestSample;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Inner {
    latest: LatestSample,
    results: Vec<Emotion>,
}

/// Single-writer, single-reader record behind one lock.
///
/// The worker publishes, the decode loop takes snapshots. The results log is
/// appended under the same lock so counts and the latest label never disagree.
#[derive(Debug, Default)]
pub struct SharedState {
    inner: Mutex<Inner>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic in the worker must not wedge the decode loop.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a classification: overwrite the latest result, bump the
    /// processed count and append to the results log.
    pub fn publish(&self, label: Emotion, confidence: f32) {
        let mut inner = self.lock();
        inner.latest.label = Some(label);
        inner.latest.confidence = confidence;
        inner.latest.processed += 1;
        inner.results.push(label);
    }

    pub fn snapshot(&self) -> LatestSample {
        self.lock().latest
    }

    /// Every published label, in publication order.
    pub fn results(&self) -> Vec<Emotion> {
        self.lock().results.clone()
    }

    pub fn processed(&self) -> u64 {
        self.lock().latest.processed
    }
}
