//! Runtime around the rule engine.
//!
//! This module provides:
//! - Configuration loading and live configuration sharing
//! - A newest-wins frame queue between recognition and evaluation
//! - The worker thread and the runner handle that owns it
//! - CSV ledger output for dispatched actions

pub mod config;
pub mod frame_worker;
pub mod ledger;
pub mod queue;
pub mod runner;

pub use config::{EngineConfig, SharedConfig, default_config_path, load_config, load_config_or_default};
pub use queue::{FrameBatch, create_frame_queue};
pub use runner::{RunSummary, RunnerHandle, RunnerStats, start_runner};
