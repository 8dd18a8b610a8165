//! User-authored rules and their compiled, match-ready form.

use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::rarity::Rarity;
use crate::text::Normalize;

/// Trigger term that matches any non-empty detection.
pub const MATCH_ANYTHING: &str = "*";

fn default_cooldown() -> f64 {
    1.0
}

/// A rule as written in the configuration file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub id: String,
    /// Free keywords; a bare string is accepted as a single keyword
    #[serde(default, alias = "trigger_text", deserialize_with = "one_or_many")]
    pub keywords: Vec<String>,
    /// Minimum rarity tier; every tier at or above it becomes a trigger term
    #[serde(default)]
    pub min_rarity: Option<Rarity>,
    /// Upper bound on the parsed price
    #[serde(default, alias = "max_value")]
    pub max_cost: Option<f64>,
    /// Lower bound on the profit figure read from the detection's cluster
    #[serde(default, alias = "min_value")]
    pub min_profit: Option<f64>,
    /// Text that must appear in the detection's cluster
    #[serde(default)]
    pub target_attribute: Option<String>,
    /// Minimum seconds between firings
    #[serde(default = "default_cooldown", alias = "cooldown")]
    pub cooldown_secs: f64,
}

impl RuleConfig {
    /// A rule with no conditions and the default cooldown.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            keywords: Vec::new(),
            min_rarity: None,
            max_cost: None,
            min_profit: None,
            target_attribute: None,
            cooldown_secs: default_cooldown(),
        }
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    pub fn min_rarity(mut self, rarity: Rarity) -> Self {
        self.min_rarity = Some(rarity);
        self
    }

    pub fn max_cost(mut self, max_cost: f64) -> Self {
        self.max_cost = Some(max_cost);
        self
    }

    pub fn min_profit(mut self, min_profit: f64) -> Self {
        self.min_profit = Some(min_profit);
        self
    }

    pub fn target_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.target_attribute = Some(attribute.into());
        self
    }

    pub fn cooldown_secs(mut self, secs: f64) -> Self {
        self.cooldown_secs = secs;
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

/// A rule compiled for matching.
///
/// Keywords and the attribute are normalized the same way detection text is,
/// the rarity cascade is already expanded and the trigger set is never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    id: String,
    order: usize,
    trigger_terms: Vec<String>,
    max_cost: Option<f64>,
    min_profit: Option<f64>,
    target_attribute: Option<String>,
    cooldown: Duration,
}

impl Rule {
    /// Compiles `config`. `order` is the rule's position in the configured list.
    pub fn compile(config: &RuleConfig, order: usize, normalizer: &dyn Normalize) -> Self {
        let mut trigger_terms: Vec<String> = Vec::new();
        let mut push_term = |term: String| {
            if !term.is_empty() && !trigger_terms.contains(&term) {
                trigger_terms.push(term);
            }
        };

        for keyword in &config.keywords {
            push_term(normalizer.normalize(keyword));
        }
        if let Some(min) = config.min_rarity {
            for tier in min.cascade() {
                push_term(tier.term());
            }
        }

        if trigger_terms.is_empty() {
            if config.keywords.is_empty() {
                debug!("Rule '{}' has no keyword or rarity, matching anything", config.id);
            } else {
                warn!(
                    "Rule '{}' has only blank keywords, matching anything instead",
                    config.id
                );
            }
            trigger_terms.push(MATCH_ANYTHING.to_string());
        }

        let cooldown = if config.cooldown_secs.is_finite() && config.cooldown_secs >= 0.0 {
            Duration::try_from_secs_f64(config.cooldown_secs).unwrap_or_else(|_| {
                warn!(
                    "Rule '{}' has out-of-range cooldown {}, clamping",
                    config.id, config.cooldown_secs
                );
                Duration::MAX
            })
        } else {
            warn!(
                "Rule '{}' has invalid cooldown {}, using 0",
                config.id, config.cooldown_secs
            );
            Duration::ZERO
        };

        let target_attribute = config
            .target_attribute
            .as_deref()
            .map(|attr| normalizer.normalize(attr))
            .filter(|attr| !attr.is_empty());

        Self {
            id: config.id.clone(),
            order,
            trigger_terms,
            max_cost: config.max_cost,
            min_profit: config.min_profit,
            target_attribute,
            cooldown,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn trigger_terms(&self) -> &[String] {
        &self.trigger_terms
    }

    pub fn max_cost(&self) -> Option<f64> {
        self.max_cost
    }

    pub fn min_profit(&self) -> Option<f64> {
        self.min_profit
    }

    pub fn target_attribute(&self) -> Option<&str> {
        self.target_attribute.as_deref()
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn matches_anything(&self) -> bool {
        self.trigger_terms.iter().any(|t| t == MATCH_ANYTHING)
    }

    /// True when a trigger term occurs in `text` (already normalized).
    pub fn triggers_on(&self, text: &str) -> bool {
        self.matches_anything() || self.trigger_terms.iter().any(|t| text.contains(t.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::DictionaryNormalizer;

    fn compile(config: &RuleConfig, order: usize) -> Rule {
        Rule::compile(config, order, &DictionaryNormalizer::new())
    }

    #[test]
    fn test_compile_expands_rarity_cascade() {
        let rule = compile(
            &RuleConfig::new("epic+").keyword("Slime").min_rarity(Rarity::Epic),
            0,
        );
        assert_eq!(
            rule.trigger_terms(),
            &["slime", "epic", "legendary", "mythic", "brainrot god", "secret"]
        );
        assert!(!rule.matches_anything());
    }

    #[test]
    fn test_compile_substitutes_sentinel() {
        let rule = compile(&RuleConfig::new("any"), 3);
        assert_eq!(rule.trigger_terms(), &[MATCH_ANYTHING]);
        assert!(rule.matches_anything());
        assert!(rule.triggers_on("whatever"));
        assert_eq!(rule.order(), 3);
    }

    #[test]
    fn test_compile_blank_keywords_become_sentinel() {
        let rule = compile(&RuleConfig::new("blank").keyword("  ").keyword(""), 0);
        assert!(rule.matches_anything());
    }

    #[test]
    fn test_compile_deduplicates_terms() {
        let rule = compile(
            &RuleConfig::new("dup")
                .keyword("Secret")
                .keyword("secret")
                .min_rarity(Rarity::Secret),
            0,
        );
        assert_eq!(rule.trigger_terms(), &["secret"]);
    }

    #[test]
    fn test_compile_clamps_invalid_cooldown() {
        let rule = compile(&RuleConfig::new("neg").cooldown_secs(-3.0), 0);
        assert_eq!(rule.cooldown(), Duration::ZERO);

        let rule = compile(&RuleConfig::new("nan").cooldown_secs(f64::NAN), 0);
        assert_eq!(rule.cooldown(), Duration::ZERO);

        let rule = compile(&RuleConfig::new("two").cooldown_secs(2.0), 0);
        assert_eq!(rule.cooldown(), Duration::from_secs(2));
    }

    #[test]
    fn test_compile_rejects_out_of_range_cooldown() {
        let rule = compile(&RuleConfig::new("huge").cooldown_secs(1e20), 0);
        assert_eq!(rule.cooldown(), Duration::MAX);

        let rule = compile(&RuleConfig::new("inf").cooldown_secs(f64::INFINITY), 0);
        assert_eq!(rule.cooldown(), Duration::ZERO);
    }

    #[test]
    fn test_compile_keeps_decimal_cooldown_exact() {
        let rule = compile(&RuleConfig::new("odd").cooldown_secs(2.2), 0);
        assert_eq!(rule.cooldown(), Duration::from_millis(2200));

        let rule = compile(&RuleConfig::new("tenth").cooldown_secs(0.1), 0);
        assert_eq!(rule.cooldown(), Duration::from_millis(100));
    }

    #[test]
    fn test_keywords_use_detection_normalization() {
        let rule = compile(&RuleConfig::new("gold").keyword("Gold").target_attribute("GOLD"), 0);
        assert_eq!(rule.trigger_terms(), &["gold"]);
        assert_eq!(rule.target_attribute(), Some("gold"));

        // Misspelled keywords are corrected like detection text
        let rule = compile(&RuleConfig::new("typo").keyword("Legendry"), 0);
        assert_eq!(rule.trigger_terms(), &["legendary"]);
    }

    #[test]
    fn test_triggers_on_substring() {
        let rule = compile(&RuleConfig::new("k").keyword("Brainrot  God"), 0);
        assert!(rule.triggers_on("secret brainrot god item"));
        assert!(!rule.triggers_on("brainrot"));
    }

    #[test]
    fn test_target_attribute_is_lowercased() {
        let rule = compile(&RuleConfig::new("a").target_attribute(" Rainbow "), 0);
        assert_eq!(rule.target_attribute(), Some("rainbow"));

        let rule = compile(&RuleConfig::new("b").target_attribute("   "), 0);
        assert_eq!(rule.target_attribute(), None);
    }

    #[test]
    fn test_deserialize_legacy_field_names() {
        let json = r#"{
            "id": "slime",
            "trigger_text": "Slime",
            "max_value": 500,
            "cooldown": 2.5
        }"#;
        let config: RuleConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.keywords, vec!["Slime".to_string()]);
        assert_eq!(config.max_cost, Some(500.0));
        assert_eq!(config.cooldown_secs, 2.5);
        assert_eq!(config.min_rarity, None);
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: RuleConfig =
            serde_json::from_str(r#"{"id":"x","min_rarity":"Brainrot God"}"#).unwrap();
        assert!(config.keywords.is_empty());
        assert_eq!(config.min_rarity, Some(Rarity::BrainrotGod));
        assert_eq!(config.cooldown_secs, 1.0);
    }
}
