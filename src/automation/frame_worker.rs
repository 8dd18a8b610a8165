//! Engine worker thread.
//!
//! Runs in a separate thread, receiving detection batches from the frame
//! queue and evaluating the newest one against the rule engine. Dispatched
//! commands go to the action sink and, when configured, the CSV ledger.

use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

use crate::automation::config::{EngineConfig, SharedConfig};
use crate::automation::ledger::{append_firing, init_ledger};
use crate::automation::queue::{FrameBatch, Poll, drain, recv_latest};
use crate::automation::runner::RunnerStats;
use crate::engine::{ActionSink, Engine};

/// How long the worker waits for a batch before re-checking the stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Everything the worker shares with its runner handle.
pub struct WorkerContext {
    pub config: Arc<SharedConfig>,
    pub stats: Arc<RunnerStats>,
    pub stop: Arc<AtomicBool>,
    pub sink: Arc<dyn ActionSink>,
}

/// Runs the worker loop.
///
/// Processes batches until the stop flag is raised or the channel closes.
/// A batch being evaluated when stop is requested still completes; batches
/// still queued afterwards are discarded.
///
/// This function blocks, so it should be run in a dedicated thread.
pub fn run_frame_worker(receiver: Receiver<FrameBatch>, context: WorkerContext) {
    info!("Frame worker started");

    let started = Instant::now();
    let (mut seen, config) = context.config.snapshot();
    let mut engine = Engine::new(&config);
    let mut ledger = prepare_ledger(&config);

    loop {
        if context.stop.load(Ordering::SeqCst) {
            let discarded = drain(&receiver);
            context.stats.add_dropped(discarded);
            info!("Frame worker: stop requested, discarded {} batch(es)", discarded);
            break;
        }

        let (batch, skipped) = match recv_latest(&receiver, POLL_INTERVAL) {
            Poll::Frame { batch, skipped } => (batch, skipped),
            Poll::Idle => continue,
            Poll::Closed => {
                info!("Frame worker: channel closed, exiting");
                break;
            }
        };

        context.stats.add_dropped(skipped);
        if skipped > 0 {
            debug!("Skipped {} stale batch(es) before frame {}", skipped, batch.sequence);
        }

        if context.stop.load(Ordering::SeqCst) {
            context.stats.add_dropped(1);
            continue;
        }

        if let Some(config) = context.config.changed_since(&mut seen) {
            engine.reconfigure(&config);
            ledger = prepare_ledger(&config);
            info!("Configuration applied: {} rule(s)", engine.store().len());
        }

        let now = started.elapsed();
        context.stats.record_frame();
        trace!(
            "Evaluating frame {} ({} ms after capture)",
            batch.sequence,
            (Local::now() - batch.captured_at).num_milliseconds()
        );

        if let Some(command) = engine.evaluate(&batch.detections, now) {
            context.stats.record_action();

            if let Some(path) = &ledger {
                if let Err(e) = append_firing(path, &command, Local::now()) {
                    warn!("Failed to write ledger row for frame {}: {:#}", batch.sequence, e);
                }
            }

            context.sink.submit(command);
        }
    }

    info!("Frame worker finished");
}

/// Returns the ledger path if one is configured and writable.
fn prepare_ledger(config: &EngineConfig) -> Option<PathBuf> {
    let path = config.ledger_path.clone()?;
    match init_ledger(&path) {
        Ok(()) => {
            info!("Ledger: {}", path.display());
            Some(path)
        }
        Err(e) => {
            warn!("Ledger disabled: {:#}", e);
            None
        }
    }
}
