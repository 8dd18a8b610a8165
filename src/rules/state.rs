//! Per-rule cooldown state machine.
//!
//! A rule is either Idle (may fire) or Cooling (fired less than its cooldown
//! ago). The only memory is the last firing time.

use std::fmt;
use std::time::Duration;

/// Current cooldown status of one rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleStatus {
    /// Never fired, or the cooldown has elapsed
    Idle,
    /// Fired recently; eligible again after `remaining`
    Cooling { remaining: Duration },
}

impl RuleStatus {
    /// Derives the status from the last firing time.
    pub fn at(last_fired: Option<Duration>, cooldown: Duration, now: Duration) -> Self {
        match last_fired {
            Some(last) if !is_eligible(Some(last), cooldown, now) => RuleStatus::Cooling {
                remaining: last.saturating_add(cooldown).saturating_sub(now),
            },
            _ => RuleStatus::Idle,
        }
    }
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleStatus::Idle => write!(f, "Idle"),
            RuleStatus::Cooling { remaining } => {
                write!(f, "Cooling ({:.1}s left)", remaining.as_secs_f32())
            }
        }
    }
}

/// A rule may fire if it never fired or `now - last_fired >= cooldown`.
///
/// A timestamp from the future (`now < last_fired`) counts as zero elapsed.
pub fn is_eligible(last_fired: Option<Duration>, cooldown: Duration, now: Duration) -> bool {
    match last_fired {
        None => true,
        Some(last) => now.saturating_sub(last) >= cooldown,
    }
}

/// How overdue a rule is relative to its own cooldown.
///
/// `elapsed / cooldown`; a rule that never fired, or has no cooldown, is
/// infinitely overdue.
pub fn overdue_ratio(last_fired: Option<Duration>, cooldown: Duration, now: Duration) -> f64 {
    match last_fired {
        None => f64::INFINITY,
        Some(_) if cooldown.is_zero() => f64::INFINITY,
        Some(last) => now.saturating_sub(last).as_secs_f64() / cooldown.as_secs_f64(),
    }
}
