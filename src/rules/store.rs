//! Ordered rule set plus per-rule cooldown state.
//!
//! The store is owned by one engine instance. Rule definitions are replaced
//! wholesale from the configuration; cooldown timestamps survive edits and are
//! discarded only when a rule disappears.

use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, warn};

use super::rule::{Rule, RuleConfig};
use super::state::{self, RuleStatus};
use crate::text::{DictionaryNormalizer, Normalize};

#[derive(Debug, Default)]
pub struct RuleStore {
    /// Configuration the current rules were compiled from
    source: Vec<RuleConfig>,
    rules: Vec<Rule>,
    last_fired: HashMap<String, Duration>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store compiled with the built-in dictionary.
    pub fn from_configs(configs: &[RuleConfig]) -> Self {
        let mut store = Self::new();
        store.sync(configs, &DictionaryNormalizer::new());
        store
    }

    /// Replaces the rule set with `configs`, normalizing keywords and
    /// attributes with `normalizer`.
    ///
    /// Returns false when `configs` equals the current definition and nothing
    /// was recompiled. Duplicate ids keep their first definition.
    pub fn sync(&mut self, configs: &[RuleConfig], normalizer: &dyn Normalize) -> bool {
        if self.source.as_slice() == configs {
            return false;
        }
        self.compile_all(configs, normalizer);
        true
    }

    /// Recompiles the current definition, e.g. after the normalizer changed.
    pub fn recompile(&mut self, normalizer: &dyn Normalize) {
        let configs = std::mem::take(&mut self.source);
        self.compile_all(&configs, normalizer);
    }

    fn compile_all(&mut self, configs: &[RuleConfig], normalizer: &dyn Normalize) {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut rules = Vec::with_capacity(configs.len());
        for config in configs {
            if !seen.insert(config.id.as_str()) {
                warn!("Duplicate rule id '{}' ignored", config.id);
                continue;
            }
            rules.push(Rule::compile(config, rules.len(), normalizer));
        }

        let before = self.last_fired.len();
        self.last_fired.retain(|id, _| seen.contains(id.as_str()));
        let dropped = before - self.last_fired.len();
        if dropped > 0 {
            debug!("Discarded cooldown state of {} deleted rule(s)", dropped);
        }

        debug!("Rule set updated: {} rule(s)", rules.len());
        self.rules = rules;
        self.source = configs.to_vec();
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn last_fired(&self, id: &str) -> Option<Duration> {
        self.last_fired.get(id).copied()
    }

    /// Records that rule `id` fired at `now`. Unknown ids are ignored.
    pub fn record_firing(&mut self, id: &str, now: Duration) {
        if self.get(id).is_some() {
            self.last_fired.insert(id.to_string(), now);
        } else {
            warn!("Firing recorded for unknown rule '{}'", id);
        }
    }

    pub fn is_eligible(&self, rule: &Rule, now: Duration) -> bool {
        state::is_eligible(self.last_fired(rule.id()), rule.cooldown(), now)
    }

    pub fn overdue_ratio(&self, rule: &Rule, now: Duration) -> f64 {
        state::overdue_ratio(self.last_fired(rule.id()), rule.cooldown(), now)
    }

    /// Cooldown status of rule `id`, or `None` if there is no such rule.
    pub fn status(&self, id: &str, now: Duration) -> Option<RuleStatus> {
        let rule = self.get(id)?;
        Some(RuleStatus::at(self.last_fired(id), rule.cooldown(), now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configs() -> Vec<RuleConfig> {
        vec![
            RuleConfig::new("a").keyword("alpha").cooldown_secs(2.0),
            RuleConfig::new("b").keyword("beta"),
        ]
    }

    #[test]
    fn test_sync_preserves_order() {
        let store = RuleStore::from_configs(&configs());
        let ids: Vec<&str> = store.rules().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(store.rules()[1].order(), 1);
    }

    #[test]
    fn test_sync_unchanged_is_noop() {
        let mut store = RuleStore::from_configs(&configs());
        assert!(!store.sync(&configs(), &DictionaryNormalizer::new()));
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let mut list = configs();
        list.push(RuleConfig::new("a").keyword("other"));
        let store = RuleStore::from_configs(&list);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a").unwrap().trigger_terms(), &["alpha"]);
    }

    #[test]
    fn test_edit_keeps_cooldown_and_delete_drops_it() {
        let mut store = RuleStore::from_configs(&configs());
        store.record_firing("a", Duration::from_secs(1));
        store.record_firing("b", Duration::from_secs(1));

        // Edit "a", delete "b"
        let edited = vec![RuleConfig::new("a").keyword("alpha2").cooldown_secs(2.0)];
        assert!(store.sync(&edited, &DictionaryNormalizer::new()));
        assert_eq!(store.last_fired("a"), Some(Duration::from_secs(1)));
        assert_eq!(store.last_fired("b"), None);

        // Re-adding "b" starts fresh
        store.sync(&configs(), &DictionaryNormalizer::new());
        assert_eq!(store.status("b", Duration::from_secs(1)), Some(RuleStatus::Idle));
    }

    #[test]
    fn test_recompile_keeps_definition_and_cooldowns() {
        let mut store = RuleStore::from_configs(&configs());
        store.record_firing("a", Duration::from_secs(1));

        let normalizer = DictionaryNormalizer::with_extra_words(["alphas"]);
        store.recompile(&normalizer);

        assert_eq!(store.len(), 2);
        assert_eq!(store.last_fired("a"), Some(Duration::from_secs(1)));
        assert!(!store.sync(&configs(), &normalizer));
    }

    #[test]
    fn test_record_firing_ignores_unknown_rule() {
        let mut store = RuleStore::from_configs(&configs());
        store.record_firing("ghost", Duration::ZERO);
        assert_eq!(store.last_fired("ghost"), None);
    }

    #[test]
    fn test_status_and_eligibility() {
        let mut store = RuleStore::from_configs(&configs());
        store.record_firing("a", Duration::ZERO);
        let rule = store.get("a").unwrap().clone();

        assert!(!store.is_eligible(&rule, Duration::from_secs(1)));
        assert!(store.is_eligible(&rule, Duration::from_secs(2)));
        assert_eq!(store.overdue_ratio(&rule, Duration::from_secs(4)), 2.0);
        assert_eq!(
            store.status("a", Duration::from_secs(1)),
            Some(RuleStatus::Cooling {
                remaining: Duration::from_secs(1)
            })
        );
        assert_eq!(store.status("missing", Duration::ZERO), None);
    }

    #[test]
    fn test_separate_stores_do_not_share_state() {
        let mut first = RuleStore::from_configs(&configs());
        let second = RuleStore::from_configs(&configs());
        first.record_firing("a", Duration::ZERO);
        assert_eq!(second.last_fired("a"), None);
    }
}
