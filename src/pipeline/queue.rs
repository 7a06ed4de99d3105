//! Bounded sampling queue between the decode loop and the classification worker.
//!
//! The producer never blocks: when the queue is full the new sample is
//! dropped. The consumer waits with a timeout so it can re-check for
//! cancellation, and a sentinel item asks it to stop.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// What travels through the queue.
#[derive(Debug)]
pub enum QueueItem<T> {
    Sample(T),
    /// Sentinel: the consumer should exit.
    Shutdown,
}

/// Result of waiting on the queue.
#[derive(Debug, PartialEq, Eq)]
pub enum Dequeued<T> {
    Item(T),
    Shutdown,
    /// Nothing arrived within the timeout.
    Timeout,
    /// The producer is gone and the queue is drained.
    Disconnected,
}

/// Create a queue holding at most `capacity` samples (minimum 1).
pub fn sampling_queue<T>(capacity: usize) -> (SampleSender<T>, SampleReceiver<T>) {
    let (tx, rx) = bounded(capacity.max(1));
    (
        SampleSender {
            tx,
            offered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        },
        SampleReceiver { rx },
    )
}

pub struct SampleSender<T> {
    tx: Sender<QueueItem<T>>,
    offered: AtomicU64,
    dropped: AtomicU64,
}

impl<T> SampleSender<T> {
    /// Offer a sample without blocking.
    ///
    /// Returns `false` if it was dropped because the queue is full or the
    /// consumer has gone away.
    pub fn try_enqueue(&self, item: T) -> bool {
        self.offered.fetch_add(1, Ordering::Relaxed);
        match self.tx.try_send(QueueItem::Sample(item)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Send the shutdown sentinel without blocking.
    ///
    /// Returns `false` if the queue was full; the consumer then relies on its
    /// cancellation flag instead.
    pub fn close(&self) -> bool {
        self.tx.try_send(QueueItem::Shutdown).is_ok()
    }

    /// Samples offered so far.
    pub fn offered(&self) -> u64 {
        self.offered.load(Ordering::Relaxed)
    }

    /// Samples dropped so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.tx.capacity().unwrap_or(0)
    }
}

pub struct SampleReceiver<T> {
    rx: Receiver<QueueItem<T>>,
}

impl<T> SampleReceiver<T> {
    /// Wait up to `timeout` for the next item.
    pub fn dequeue(&self, timeout: Duration) -> Dequeued<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(QueueItem::Sample(item)) => Dequeued::Item(item),
            Ok(QueueItem::Shutdown) => Dequeued::Shutdown,
            Err(RecvTimeoutError::Timeout) => Dequeued::Timeout,
            Err(RecvTimeoutError::Disconnected) => Dequeued::Disconnected,
        }
    }
}
