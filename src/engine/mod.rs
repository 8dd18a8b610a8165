//! Per-frame decision pipeline.
//!
//! This module provides:
//! - `Engine`: normalize a detection batch, match it against the rule set,
//!   rank the candidates, gate them on cooldown and dispatch at most one action
//! - Priority ranking and cooldown gating
//! - `ActionCommand` dispatch and the `ActionSink` delivery boundary
//! - The engine error taxonomy

pub mod cooldown;
pub mod dispatch;
pub mod error;
pub mod priority;

pub use cooldown::CooldownGate;
pub use dispatch::{ActionCommand, ActionDispatcher, ActionSink, ChannelSink, Decision};
pub use error::EngineError;

use std::time::Duration;
use tracing::debug;

use crate::automation::config::EngineConfig;
use crate::detection::{ClusterGeometry, CoordinateMapper, Detection, FrameView, NormalizedDetection};
use crate::rules::{RuleConfig, RuleStore, match_frame};
use crate::text::{DictionaryNormalizer, Normalize, PriceParser};

/// Rule engine for one detection stream.
///
/// Owns the rule set and its cooldown state; separate instances never share
/// state. Evaluation takes `&mut self`, so the cooldown check and the firing
/// record of one frame cannot interleave with another frame.
pub struct Engine<N: Normalize = DictionaryNormalizer> {
    normalizer: N,
    prices: PriceParser,
    mapper: CoordinateMapper,
    geometry: ClusterGeometry,
    min_confidence: f32,
    store: RuleStore,
    dispatcher: ActionDispatcher,
}

impl Engine {
    /// Creates an engine with the dictionary normalizer built from `config`.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_normalizer(
            config,
            DictionaryNormalizer::with_extra_words(&config.extra_vocabulary),
        )
    }

    /// Applies `config`, rebuilding the dictionary if its vocabulary changed.
    pub fn reconfigure(&mut self, config: &EngineConfig) {
        let rebuilt = DictionaryNormalizer::with_extra_words(&config.extra_vocabulary);
        if rebuilt.vocabulary() != self.normalizer.vocabulary() {
            debug!("Dictionary rebuilt: {} word(s)", rebuilt.vocabulary().len());
            self.normalizer = rebuilt;
            self.store.recompile(&self.normalizer);
        }
        self.apply_config(config);
    }
}

impl<N: Normalize> Engine<N> {
    /// Creates an engine with a custom correction strategy.
    pub fn with_normalizer(config: &EngineConfig, normalizer: N) -> Self {
        let mut engine = Self {
            normalizer,
            prices: PriceParser::new(config.max_plausible_price),
            mapper: CoordinateMapper::new(config.region_offset),
            geometry: config.geometry(),
            min_confidence: config.min_confidence,
            store: RuleStore::new(),
            dispatcher: ActionDispatcher::new(config.hold_duration_secs, config.action_key.clone()),
        };
        engine.store.sync(&config.rules, &engine.normalizer);
        engine
    }

    /// Applies every setting of `config` except the normalizer.
    ///
    /// Rule edits take effect on the next evaluated frame.
    pub fn apply_config(&mut self, config: &EngineConfig) {
        self.prices = PriceParser::new(config.max_plausible_price);
        self.mapper = CoordinateMapper::new(config.region_offset);
        self.geometry = config.geometry();
        self.min_confidence = config.min_confidence;
        self.dispatcher = ActionDispatcher::new(config.hold_duration_secs, config.action_key.clone());
        self.sync_rules(&config.rules);
    }

    /// Replaces the rule set. Returns false when nothing changed.
    pub fn sync_rules(&mut self, rules: &[RuleConfig]) -> bool {
        self.store.sync(rules, &self.normalizer)
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    /// Drops malformed detections and derives the matcher's view of the rest.
    pub fn normalize_batch(&self, detections: &[Detection]) -> Vec<NormalizedDetection> {
        detections
            .iter()
            .enumerate()
            .filter_map(|(index, detection)| {
                if let Err(e) = detection.validate(self.min_confidence) {
                    debug!("Dropped detection {}: {}", index, e);
                    return None;
                }

                let corrected_text = self.normalizer.normalize(&detection.text);
                if corrected_text.is_empty() {
                    debug!("Dropped detection {}: nothing left after normalization", index);
                    return None;
                }

                Some(NormalizedDetection {
                    index,
                    parsed_price: self.prices.parse(&corrected_text),
                    corrected_text,
                    full_frame_box: self.mapper.to_full_frame(detection.bbox),
                    confidence: detection.confidence,
                })
            })
            .collect()
    }

    /// Evaluates one frame and dispatches at most one action.
    ///
    /// `now` is the engine clock (elapsed time since the stream started).
    pub fn evaluate(&mut self, detections: &[Detection], now: Duration) -> Option<ActionCommand> {
        if self.store.is_empty() {
            return None;
        }

        let normalized = self.normalize_batch(detections);
        if normalized.is_empty() {
            return None;
        }

        let decision = {
            let view = FrameView::new(&normalized, self.geometry);
            let candidates = match_frame(&view, &self.store, now);
            let gate = CooldownGate::new(&self.store);
            priority::resolve_eligible(candidates, |c| gate.is_eligible(c.rule, now))
                .map(|winner| Decision::from(&winner))
        }?;

        Some(self.dispatcher.dispatch(decision, &mut self.store, now))
    }
}
