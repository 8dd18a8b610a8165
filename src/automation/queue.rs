//! Frame queue between the recognition side and the engine worker.
//!
//! Uses a std::sync::mpsc channel. The producer sends detection batches as
//! they arrive; the worker only ever evaluates the newest one and drops
//! anything that queued up behind it.

use chrono::{DateTime, Local};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError, channel};
use std::time::Duration;

use crate::detection::Detection;

/// One frame's worth of detections.
#[derive(Debug, Clone)]
pub struct FrameBatch {
    /// Frame number assigned by the producer (1-based)
    pub sequence: u64,
    pub detections: Vec<Detection>,
    /// Timestamp when the batch was handed to the queue
    pub captured_at: DateTime<Local>,
}

impl FrameBatch {
    pub fn new(sequence: u64, detections: Vec<Detection>) -> Self {
        Self {
            sequence,
            detections,
            captured_at: Local::now(),
        }
    }
}

/// Result of waiting on the queue.
#[derive(Debug)]
pub enum Poll {
    /// The newest available batch and how many older ones were discarded
    Frame { batch: FrameBatch, skipped: u64 },
    /// Nothing arrived within the timeout
    Idle,
    /// Every sender is gone and the queue is empty
    Closed,
}

/// Creates a new frame queue.
///
/// Returns a tuple of (sender, receiver). The channel itself is unbounded;
/// staleness is bounded by [`recv_latest`] draining it on every read.
pub fn create_frame_queue() -> (Sender<FrameBatch>, Receiver<FrameBatch>) {
    channel()
}

/// Waits up to `timeout` for a batch, then keeps only the newest one queued.
pub fn recv_latest(receiver: &Receiver<FrameBatch>, timeout: Duration) -> Poll {
    let mut batch = match receiver.recv_timeout(timeout) {
        Ok(batch) => batch,
        Err(RecvTimeoutError::Timeout) => return Poll::Idle,
        Err(RecvTimeoutError::Disconnected) => return Poll::Closed,
    };

    let mut skipped = 0;
    loop {
        match receiver.try_recv() {
            Ok(newer) => {
                batch = newer;
                skipped += 1;
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
        }
    }

    Poll::Frame { batch, skipped }
}

/// Discards everything currently queued. Returns the number of batches dropped.
pub fn drain(receiver: &Receiver<FrameBatch>) -> u64 {
    receiver.try_iter().map(|_| 1).sum()
}
