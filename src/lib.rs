//! Auto-buy rule engine.
//!
//! Turns per-frame OCR detections from a shop screen into at most one
//! purchase action per frame. Text is corrected and priced, matched against
//! user rules, ranked by how overdue each rule is and gated on per-rule
//! cooldowns before a single `ActionCommand` is dispatched.

pub mod automation;
pub mod detection;
pub mod engine;
pub mod logging;
pub mod paths;
pub mod rules;
pub mod text;

pub use automation::{EngineConfig, RunSummary, RunnerHandle, start_runner};
pub use detection::{BoundingBox, Detection};
pub use engine::{ActionCommand, ActionSink, Engine, EngineError};
pub use rules::{Rarity, RuleConfig};
