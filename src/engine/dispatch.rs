//! Action dispatch: turning a winning match into an `ActionCommand`.
//!
//! Dispatch is the only place engine state changes. Delivery to the
//! input-simulation side is fire-and-forget through an [`ActionSink`].

use serde::{Serialize, Serializer};
use std::sync::mpsc::Sender;
use std::time::Duration;
use tracing::{info, warn};

use crate::detection::BoundingBox;
use crate::rules::{MatchCandidate, RuleStore};

/// Instruction for the input-simulation collaborator.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActionCommand {
    /// Full-frame box of the detection that fired
    pub target_box: BoundingBox,
    pub rule_id: String,
    /// How long to hold the action key (global setting)
    pub hold_duration_secs: f32,
    /// Engine clock at dispatch
    #[serde(serialize_with = "as_secs")]
    pub dispatched_at: Duration,
    pub action_key: String,
    pub matched_text: String,
    pub price: Option<u64>,
}

fn as_secs<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

/// The winning match, detached from the frame and rule store it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct Decision {
    pub rule_id: String,
    pub target_box: BoundingBox,
    pub matched_text: String,
    pub price: Option<u64>,
}

impl From<&MatchCandidate<'_>> for Decision {
    fn from(candidate: &MatchCandidate<'_>) -> Self {
        Self {
            rule_id: candidate.rule.id().to_string(),
            target_box: candidate.detection.full_frame_box,
            matched_text: candidate.detection.corrected_text.clone(),
            price: candidate.price,
        }
    }
}

/// Receives dispatched commands. Implementations must not block.
pub trait ActionSink: Send + Sync {
    fn submit(&self, command: ActionCommand);
}

impl<F> ActionSink for F
where
    F: Fn(ActionCommand) + Send + Sync,
{
    fn submit(&self, command: ActionCommand) {
        self(command)
    }
}

/// Forwards commands over an mpsc channel.
#[derive(Debug)]
pub struct ChannelSink {
    sender: Sender<ActionCommand>,
}

impl ChannelSink {
    pub fn new(sender: Sender<ActionCommand>) -> Self {
        Self { sender }
    }
}

impl ActionSink for ChannelSink {
    fn submit(&self, command: ActionCommand) {
        if let Err(e) = self.sender.send(command) {
            warn!("Action receiver gone, dropping command for rule '{}'", e.0.rule_id);
        }
    }
}

/// Builds commands and records firings.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionDispatcher {
    hold_duration_secs: f32,
    action_key: String,
}

impl ActionDispatcher {
    pub fn new(hold_duration_secs: f32, action_key: impl Into<String>) -> Self {
        Self {
            hold_duration_secs,
            action_key: action_key.into(),
        }
    }

    /// Builds the command for `decision` and marks its rule as fired at `now`.
    pub fn dispatch(&self, decision: Decision, store: &mut RuleStore, now: Duration) -> ActionCommand {
        store.record_firing(&decision.rule_id, now);

        info!(
            "Rule '{}' FIRED on '{}' (price: {}) at ({:.0}, {:.0})",
            decision.rule_id,
            decision.matched_text,
            decision
                .price
                .map_or_else(|| "-".to_string(), |p| p.to_string()),
            decision.target_box.x,
            decision.target_box.y
        );

        ActionCommand {
            target_box: decision.target_box,
            rule_id: decision.rule_id,
            hold_duration_secs: self.hold_duration_secs,
            dispatched_at: now,
            action_key: self.action_key.clone(),
            matched_text: decision.matched_text,
            price: decision.price,
        }
    }
}
