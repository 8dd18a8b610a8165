//! Rule definitions, cooldown state and matching.
//!
//! This module provides:
//! - Rarity tiers and minimum-tier cascading
//! - Compilation of configured rules into match-ready form
//! - The per-engine rule store with cooldown timestamps
//! - Matching of normalized detections against the rule set

pub mod matcher;
pub mod rarity;
pub mod rule;
pub mod state;
pub mod store;

pub use matcher::{MatchCandidate, match_detection, match_frame};
pub use rarity::{Rarity, UnknownRarity};
pub use rule::{MATCH_ANYTHING, Rule, RuleConfig};
pub use state::RuleStatus;
pub use store::RuleStore;
