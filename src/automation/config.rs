//! Configuration types for the engine.
//!
//! Loads settings from config.json at startup. Provides the region offset,
//! cluster tolerances, the global action settings and the ordered rule list.
//! A running engine picks up edits through [`SharedConfig`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

use crate::detection::{ClusterGeometry, RegionOffset};
use crate::engine::error::EngineError;
use crate::rules::RuleConfig;
use crate::text::price::DEFAULT_MAX_PLAUSIBLE_PRICE;

/// Complete engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Where the recognized region sits inside the full captured frame
    pub region_offset: RegionOffset,
    /// Seconds to hold the action key, copied into every command
    #[serde(alias = "hold_duration")]
    pub hold_duration_secs: f32,
    /// Key the input-simulation side should press
    #[serde(alias = "global_action_key")]
    pub action_key: String,
    /// Detections below this recognition confidence are dropped (0.0-1.0)
    pub min_confidence: f32,
    /// Max vertical centre distance between fragments of one item card
    pub cluster_tolerance_px: f32,
    /// Max vertical centre distance between fragments on one row
    pub row_tolerance_px: f32,
    /// Max horizontal centre distance between fragments on one row
    pub max_row_gap_px: f32,
    /// Parsed prices above this are treated as OCR garbage
    pub max_plausible_price: u64,
    /// Replay pacing for the command-line runner
    pub frames_per_second: u32,
    /// Optional CSV ledger of every firing
    pub ledger_path: Option<PathBuf>,
    /// Additional words for the OCR correction dictionary
    pub extra_vocabulary: Vec<String>,
    /// Ordered rule list; earlier rules win ties
    pub rules: Vec<RuleConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let geometry = ClusterGeometry::default();
        Self {
            region_offset: RegionOffset::default(),
            hold_duration_secs: 1.2,
            action_key: "e".to_string(),
            min_confidence: 0.0,
            cluster_tolerance_px: geometry.cluster_tolerance_px,
            row_tolerance_px: geometry.row_tolerance_px,
            max_row_gap_px: geometry.max_row_gap_px,
            max_plausible_price: DEFAULT_MAX_PLAUSIBLE_PRICE,
            frames_per_second: 45,
            ledger_path: None,
            extra_vocabulary: Vec::new(),
            rules: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn geometry(&self) -> ClusterGeometry {
        ClusterGeometry {
            cluster_tolerance_px: self.cluster_tolerance_px,
            row_tolerance_px: self.row_tolerance_px,
            max_row_gap_px: self.max_row_gap_px,
        }
    }

    /// Checks values serde cannot constrain.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.hold_duration_secs.is_finite() || self.hold_duration_secs <= 0.0 {
            return Err(EngineError::Config(format!(
                "hold_duration_secs must be positive, got {}",
                self.hold_duration_secs
            )));
        }
        if self.frames_per_second == 0 {
            return Err(EngineError::Config(
                "frames_per_second must be at least 1".to_string(),
            ));
        }
        let tolerances = [
            ("cluster_tolerance_px", self.cluster_tolerance_px),
            ("row_tolerance_px", self.row_tolerance_px),
            ("max_row_gap_px", self.max_row_gap_px),
        ];
        for (name, value) in tolerances {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if self.action_key.trim().is_empty() {
            return Err(EngineError::Config("action_key must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Returns the default config location: config.json next to the executable.
pub fn default_config_path() -> PathBuf {
    crate::paths::get_exe_dir().join("config.json")
}

/// Loads and validates configuration from `path`.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: EngineConfig = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from `path` or returns defaults.
pub fn load_config_or_default(path: &Path) -> EngineConfig {
    info!("Looking for config at: {}", path.display());

    if !path.exists() {
        info!("{} not found. Using default config.", path.display());
        return EngineConfig::default();
    }

    match load_config(path) {
        Ok(config) => {
            info!(
                "Config loaded from {} ({} rule(s))",
                path.display(),
                config.rules.len()
            );
            config
        }
        Err(e) => {
            warn!("{:#}. Using defaults.", e);
            EngineConfig::default()
        }
    }
}

/// Configuration shared between the configuration side and a running worker.
///
/// Every replacement bumps a generation counter so the worker only reapplies
/// settings that actually changed.
#[derive(Debug)]
pub struct SharedConfig {
    inner: RwLock<(u64, Arc<EngineConfig>)>,
}

impl SharedConfig {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            inner: RwLock::new((1, Arc::new(config))),
        }
    }

    /// Current generation and configuration.
    pub fn snapshot(&self) -> (u64, Arc<EngineConfig>) {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        (guard.0, Arc::clone(&guard.1))
    }

    /// Returns the configuration if it changed since `seen`, updating `seen`.
    pub fn changed_since(&self, seen: &mut u64) -> Option<Arc<EngineConfig>> {
        let (generation, config) = self.snapshot();
        if generation == *seen {
            return None;
        }
        *seen = generation;
        Some(config)
    }

    pub fn replace(&self, config: EngineConfig) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.0 += 1;
        guard.1 = Arc::new(config);
    }

    /// Replaces only the rule list.
    pub fn replace_rules(&self, rules: Vec<RuleConfig>) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut config = (*guard.1).clone();
        config.rules = rules;
        guard.0 += 1;
        guard.1 = Arc::new(config);
    }
}
