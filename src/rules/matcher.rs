//! Rule matching against one frame of normalized detections.
//!
//! A detection matches a rule when every configured condition holds:
//! trigger term, price ceiling, profit floor and cluster attribute. Missing
//! price or attribute data is a non-match, never an error.

use std::time::Duration;
use tracing::debug;

use super::rule::Rule;
use super::store::RuleStore;
use crate::detection::{FrameView, NormalizedDetection};
use crate::engine::error::EngineError;

/// One (rule, detection) pair that satisfied every condition this frame.
#[derive(Clone, Debug)]
pub struct MatchCandidate<'a> {
    pub rule: &'a Rule,
    pub detection: &'a NormalizedDetection,
    /// Price read from the detection or its row, if any
    pub price: Option<u64>,
    /// How overdue the rule is relative to its cooldown (higher fires first)
    pub overdue: f64,
}

/// Finds every rule in `store` that `pos` satisfies.
pub fn match_detection<'a>(
    frame: &FrameView<'a>,
    pos: usize,
    store: &'a RuleStore,
    now: Duration,
) -> Vec<MatchCandidate<'a>> {
    let Some(detection) = frame.detections().get(pos) else {
        return Vec::new();
    };
    if detection.corrected_text.is_empty() {
        return Vec::new();
    }

    store
        .rules()
        .iter()
        .filter_map(|rule| match check_rule(frame, pos, rule) {
            Ok(price) => Some(MatchCandidate {
                rule,
                detection,
                price,
                overdue: store.overdue_ratio(rule, now),
            }),
            Err(Miss::NoTrigger) => None,
            Err(Miss::Parse(e)) => {
                debug!("Rule '{}' skipped: {}", rule.id(), e);
                None
            }
        })
        .collect()
}

/// Matches every detection of the frame against every rule.
pub fn match_frame<'a>(
    frame: &FrameView<'a>,
    store: &'a RuleStore,
    now: Duration,
) -> Vec<MatchCandidate<'a>> {
    (0..frame.len())
        .flat_map(|pos| match_detection(frame, pos, store, now))
        .collect()
}

enum Miss {
    NoTrigger,
    Parse(EngineError),
}

/// Evaluates all conditions of `rule` for `pos`, returning the price on success.
fn check_rule(frame: &FrameView<'_>, pos: usize, rule: &Rule) -> Result<Option<u64>, Miss> {
    let detection = &frame.detections()[pos];
    let text = detection.corrected_text.as_str();

    if !rule.triggers_on(text) {
        return Err(Miss::NoTrigger);
    }

    let priced = frame.price_for(pos);

    if let Some(max_cost) = rule.max_cost() {
        match priced {
            Some((price, _)) if price as f64 <= max_cost => {}
            Some((price, _)) => {
                return Err(Miss::Parse(EngineError::ParseMiss {
                    field: "price",
                    text: format!("{} exceeds max cost {}", price, max_cost),
                }));
            }
            None => {
                return Err(Miss::Parse(EngineError::ParseMiss {
                    field: "price",
                    text: text.to_string(),
                }));
            }
        }
    }

    if let Some(min_profit) = rule.min_profit() {
        let source = priced.map(|(_, source)| source);
        match frame.profit_for(pos, source) {
            Some(profit) if profit as f64 >= min_profit => {}
            Some(profit) => {
                return Err(Miss::Parse(EngineError::ParseMiss {
                    field: "profit",
                    text: format!("{} below min profit {}", profit, min_profit),
                }));
            }
            None => {
                return Err(Miss::Parse(EngineError::ParseMiss {
                    field: "profit",
                    text: text.to_string(),
                }));
            }
        }
    }

    if let Some(attribute) = rule.target_attribute() {
        if !frame.has_attribute(pos, attribute) {
            return Err(Miss::Parse(EngineError::ParseMiss {
                field: "attribute",
                text: attribute.to_string(),
            }));
        }
    }

    Ok(priced.map(|(price, _)| price))
}
