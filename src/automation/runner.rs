//! Runner - main entry point for a live detection stream.
//!
//! Spawns the frame worker thread and hands back a handle through which the
//! recognition side submits batches and the configuration side edits rules.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

use crate::automation::config::{EngineConfig, SharedConfig};
use crate::automation::frame_worker::{WorkerContext, run_frame_worker};
use crate::automation::queue::{FrameBatch, create_frame_queue};
use crate::detection::Detection;
use crate::engine::{ActionSink, EngineError};
use crate::rules::RuleConfig;

/// Counters updated by the worker, readable at any time.
#[derive(Debug, Default)]
pub struct RunnerStats {
    frames_evaluated: AtomicU64,
    frames_dropped: AtomicU64,
    actions_dispatched: AtomicU64,
}

impl RunnerStats {
    pub fn record_frame(&self) {
        self.frames_evaluated.fetch_add(1, Ordering::SeqCst);
    }

    pub fn add_dropped(&self, count: u64) {
        self.frames_dropped.fetch_add(count, Ordering::SeqCst);
    }

    pub fn record_action(&self) {
        self.actions_dispatched.fetch_add(1, Ordering::SeqCst);
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            frames_evaluated: self.frames_evaluated.load(Ordering::SeqCst),
            frames_dropped: self.frames_dropped.load(Ordering::SeqCst),
            actions_dispatched: self.actions_dispatched.load(Ordering::SeqCst),
        }
    }
}

/// Snapshot of runner statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub frames_evaluated: u64,
    /// Batches superseded by a newer one or discarded at shutdown
    pub frames_dropped: u64,
    pub actions_dispatched: u64,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frame(s) evaluated, {} dropped, {} action(s) dispatched",
            self.frames_evaluated, self.frames_dropped, self.actions_dispatched
        )
    }
}

/// Handle to a running engine worker.
///
/// Dropping the handle stops the worker and waits for it.
pub struct RunnerHandle {
    sender: Option<Sender<FrameBatch>>,
    config: Arc<SharedConfig>,
    stats: Arc<RunnerStats>,
    stop: Arc<AtomicBool>,
    next_sequence: AtomicU64,
    worker: Option<JoinHandle<()>>,
}

/// Starts the engine worker in a background thread.
///
/// Returns immediately after spawning the worker.
///
/// # Errors
/// Returns an error if:
/// - The configuration is invalid
/// - The worker thread cannot be spawned
pub fn start_runner<S>(config: EngineConfig, sink: S) -> Result<RunnerHandle>
where
    S: ActionSink + 'static,
{
    config.validate().context("Invalid engine configuration")?;

    info!(
        "Starting runner: {} rule(s), region offset ({}, {})",
        config.rules.len(),
        config.region_offset.x,
        config.region_offset.y
    );

    let (sender, receiver) = create_frame_queue();
    let shared = Arc::new(SharedConfig::new(config));
    let stats = Arc::new(RunnerStats::default());
    let stop = Arc::new(AtomicBool::new(false));

    let context = WorkerContext {
        config: Arc::clone(&shared),
        stats: Arc::clone(&stats),
        stop: Arc::clone(&stop),
        sink: Arc::new(sink),
    };

    let worker = thread::Builder::new()
        .name("frame-worker".to_string())
        .spawn(move || run_frame_worker(receiver, context))
        .context("Failed to spawn frame worker")?;

    Ok(RunnerHandle {
        sender: Some(sender),
        config: shared,
        stats,
        stop,
        next_sequence: AtomicU64::new(1),
        worker: Some(worker),
    })
}

impl RunnerHandle {
    /// Queues one frame's detections. Returns false once the runner has stopped.
    pub fn submit(&self, detections: Vec<Detection>) -> bool {
        if self.stop.load(Ordering::SeqCst) {
            return false;
        }
        let Some(sender) = &self.sender else {
            return false;
        };
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        sender.send(FrameBatch::new(sequence, detections)).is_ok()
    }

    /// Replaces the rule list; the worker applies it before its next frame.
    pub fn update_rules(&self, rules: Vec<RuleConfig>) {
        info!("Rule update queued: {} rule(s)", rules.len());
        self.config.replace_rules(rules);
    }

    /// Replaces the whole configuration. Invalid configurations are rejected
    /// and the previous one stays in effect.
    pub fn update_config(&self, config: EngineConfig) -> Result<(), EngineError> {
        if let Err(e) = config.validate() {
            warn!("Configuration update rejected: {}", e);
            return Err(e);
        }
        self.config.replace(config);
        Ok(())
    }

    /// Configuration the worker will use for its next frame.
    pub fn config(&self) -> Arc<EngineConfig> {
        self.config.snapshot().1
    }

    pub fn stats(&self) -> RunSummary {
        self.stats.summary()
    }

    /// Checks if the worker thread is still alive.
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stops the worker, waits for it and returns the final statistics.
    pub fn stop(mut self) -> RunSummary {
        self.shutdown();
        self.stats.summary()
    }

    /// Closes the queue and lets the worker evaluate what is still queued
    /// (newest batch only) before it exits.
    pub fn finish(mut self) -> RunSummary {
        self.sender = None;
        self.join_worker();
        self.stats.summary()
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.sender = None;
        self.join_worker();
    }

    fn join_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Frame worker thread panicked");
            }
            info!("Runner stopped: {}", self.stats.summary());
        }
    }
}

impl Drop for RunnerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
