//! Engine configuration
//!
//! The scoring constants are hand-tuned and kept as named, overridable values
//! instead of literals scattered through the algorithms.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a layered resolution:
//! 1. Explicit path (CLI `--config`), then the `FINA_CONFIG` environment variable
//! 2. Override in data dir (~/.local/share/fina/config/engine.toml)
//! 3. Embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::keywords::{KeywordRule, KeywordRuleTable};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/engine.toml");

/// Environment variable pointing at a config file
pub const CONFIG_ENV: &str = "FINA_CONFIG";

/// Suggestion scoring constants
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationTuning {
    pub keyword_confidence: u8,
    pub fallback_confidence: u8,
    pub exact_match_score: f64,
    pub word_overlap_weight: f64,
    pub amount_proximity_band: f64,
    pub amount_proximity_bonus: f64,
    pub min_match_score: f64,
    pub max_suggestions: usize,
}

impl Default for ClassificationTuning {
    fn default() -> Self {
        Self {
            keyword_confidence: 70,
            fallback_confidence: 50,
            exact_match_score: 100.0,
            word_overlap_weight: 80.0,
            amount_proximity_band: 0.3,
            amount_proximity_bonus: 20.0,
            min_match_score: 30.0,
            max_suggestions: 3,
        }
    }
}

/// Confidence accumulation constants for the history learner
#[derive(Debug, Clone, PartialEq)]
pub struct LearningTuning {
    pub manual_initial_confidence: i64,
    pub confirmed_initial_confidence: i64,
    pub confirmation_step: i64,
    pub max_confidence: i64,
    pub max_attempts: u32,
}

impl Default for LearningTuning {
    fn default() -> Self {
        Self {
            manual_initial_confidence: 50,
            confirmed_initial_confidence: 60,
            confirmation_step: 10,
            max_confidence: 100,
            max_attempts: 3,
        }
    }
}

/// Anomaly detection parameters (can also be overridden per call)
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AnomalyOptions {
    /// Flag when amount > average × threshold
    pub threshold: f64,
    /// Fewer trailing observations than this never flag
    pub min_samples: usize,
    /// How many months before the checked month to scan
    pub lookback_months: u32,
}

impl Default for AnomalyOptions {
    fn default() -> Self {
        Self {
            threshold: 2.0,
            min_samples: 3,
            lookback_months: 6,
        }
    }
}

/// Recommendation rule parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationTuning {
    /// Months before the current one used as the baseline
    pub window_months: u32,
    /// Warn when current spend > baseline mean × multiplier
    pub overspend_multiplier: f64,
    /// Horizon of the forecast used for the negative-balance warning
    pub forecast_months: u32,
}

impl Default for RecommendationTuning {
    fn default() -> Self {
        Self {
            window_months: 3,
            overspend_multiplier: 2.0,
            forecast_months: 3,
        }
    }
}

/// Classification stats parameters
#[derive(Debug, Clone, PartialEq)]
pub struct StatsTuning {
    pub high_confidence_threshold: i64,
    pub top_categories: usize,
}

impl Default for StatsTuning {
    fn default() -> Self {
        Self {
            high_confidence_threshold: 80,
            top_categories: 5,
        }
    }
}

/// Full engine configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    pub classification: ClassificationTuning,
    pub learning: LearningTuning,
    pub anomaly: AnomalyOptions,
    pub recommendations: RecommendationTuning,
    pub stats: StatsTuning,
    /// Replaces the built-in keyword table when set
    pub keywords: Option<Vec<KeywordRule>>,
}

impl EngineConfig {
    /// Load configuration using the layered resolution
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let candidates = [
            explicit.map(Path::to_path_buf),
            env_path,
            default_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            if path.exists() {
                debug!(path = %path.display(), "Loading engine config");
                return Self::from_file(&path);
            }
        }

        parse_config(DEFAULT_CONFIG)
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        parse_config(&content)
    }

    /// Parse configuration from TOML text (missing keys keep defaults)
    pub fn from_toml(content: &str) -> Result<Self> {
        parse_config(content)
    }

    /// The keyword table this config selects
    pub fn keyword_table(&self) -> KeywordRuleTable {
        match &self.keywords {
            Some(rules) => KeywordRuleTable::new(rules.clone()),
            None => KeywordRuleTable::builtin(),
        }
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("fina").join("config").join("engine.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    classification: Option<RawClassification>,
    learning: Option<RawLearning>,
    anomaly: Option<RawAnomaly>,
    recommendations: Option<RawRecommendations>,
    stats: Option<RawStats>,
    keywords: Option<Vec<KeywordRule>>,
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    keyword_confidence: Option<u8>,
    fallback_confidence: Option<u8>,
    exact_match_score: Option<f64>,
    word_overlap_weight: Option<f64>,
    amount_proximity_band: Option<f64>,
    amount_proximity_bonus: Option<f64>,
    min_match_score: Option<f64>,
    max_suggestions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawLearning {
    manual_initial_confidence: Option<i64>,
    confirmed_initial_confidence: Option<i64>,
    confirmation_step: Option<i64>,
    max_confidence: Option<i64>,
    max_attempts: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawAnomaly {
    threshold: Option<f64>,
    min_samples: Option<usize>,
    lookback_months: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawRecommendations {
    window_months: Option<u32>,
    overspend_multiplier: Option<f64>,
    forecast_months: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawStats {
    high_confidence_threshold: Option<i64>,
    top_categories: Option<usize>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<EngineConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = EngineConfig::default();

    if let Some(c) = raw.classification {
        let t = &mut config.classification;
        if let Some(v) = c.keyword_confidence {
            t.keyword_confidence = v.min(100);
        }
        if let Some(v) = c.fallback_confidence {
            t.fallback_confidence = v.min(100);
        }
        if let Some(v) = c.exact_match_score {
            t.exact_match_score = v;
        }
        if let Some(v) = c.word_overlap_weight {
            t.word_overlap_weight = v;
        }
        if let Some(v) = c.amount_proximity_band {
            t.amount_proximity_band = v;
        }
        if let Some(v) = c.amount_proximity_bonus {
            t.amount_proximity_bonus = v;
        }
        if let Some(v) = c.min_match_score {
            t.min_match_score = v;
        }
        if let Some(v) = c.max_suggestions {
            t.max_suggestions = v;
        }
    }

    if let Some(l) = raw.learning {
        let t = &mut config.learning;
        if let Some(v) = l.manual_initial_confidence {
            t.manual_initial_confidence = v;
        }
        if let Some(v) = l.confirmed_initial_confidence {
            t.confirmed_initial_confidence = v;
        }
        if let Some(v) = l.confirmation_step {
            t.confirmation_step = v.max(0);
        }
        if let Some(v) = l.max_confidence {
            t.max_confidence = v;
        }
        if let Some(v) = l.max_attempts {
            t.max_attempts = v.max(1);
        }
    }

    if let Some(a) = raw.anomaly {
        if let Some(v) = a.threshold {
            config.anomaly.threshold = v;
        }
        if let Some(v) = a.min_samples {
            config.anomaly.min_samples = v;
        }
        if let Some(v) = a.lookback_months {
            config.anomaly.lookback_months = v;
        }
    }

    if let Some(r) = raw.recommendations {
        if let Some(v) = r.window_months {
            config.recommendations.window_months = v;
        }
        if let Some(v) = r.overspend_multiplier {
            config.recommendations.overspend_multiplier = v;
        }
        if let Some(v) = r.forecast_months {
            config.recommendations.forecast_months = v;
        }
    }

    if let Some(s) = raw.stats {
        if let Some(v) = s.high_confidence_threshold {
            config.stats.high_confidence_threshold = v;
        }
        if let Some(v) = s.top_categories {
            config.stats.top_categories = v;
        }
    }

    config.keywords = raw.keywords;

    Ok(config)
}
