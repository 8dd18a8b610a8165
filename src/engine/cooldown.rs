//! Cooldown gating of resolved matches.

use std::time::Duration;

use crate::rules::{Rule, RuleStore};

/// Read-only eligibility check against a rule store.
///
/// The gate is consulted after priority ranking so a cooling top pick falls
/// through to the next-ranked candidate.
#[derive(Clone, Copy, Debug)]
pub struct CooldownGate<'a> {
    store: &'a RuleStore,
}

impl<'a> CooldownGate<'a> {
    pub fn new(store: &'a RuleStore) -> Self {
        Self { store }
    }

    pub fn is_eligible(&self, rule: &Rule, now: Duration) -> bool {
        self.store.is_eligible(rule, now)
    }
}
