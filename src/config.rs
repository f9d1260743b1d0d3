//! Scoring configuration.
//!
//! Weights, saturation points and category cut-offs are product decisions,
//! so they live in an optional JSON file rather than in the scorer. Every
//! field falls back to the documented default.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::RiskCategory;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Width of the band just below each category cut-off that still counts
/// as the higher category: `[cutoff - 1e-9, cutoff)` maps up, so with the
/// default 0.70 cut-off both 0.6999999999999999 (float noise from summing
/// weights) and 0.6999999995 are High. Below the band the lower category
/// applies as usual.
pub const BOUNDARY_EPSILON: f64 = 1e-9;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read scoring config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scoring config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("factor weights must sum to 1.0, got {0:.6}")]
    WeightSum(f64),

    #[error("factor weight for {0} must be non-negative")]
    NegativeWeight(&'static str),

    #[error("saturation value for {0} must be positive")]
    Saturation(&'static str),

    #[error("thresholds must satisfy 0 < medium < high <= 1 (medium={medium}, high={high})")]
    Thresholds { medium: f64, high: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorWeights {
    pub recency: f64,
    pub frequency: f64,
    pub monetary: f64,
    pub engagement: f64,
    pub support_issues: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            recency: 0.40,
            frequency: 0.25,
            monetary: 0.20,
            engagement: 0.10,
            support_issues: 0.05,
        }
    }
}

impl FactorWeights {
    pub fn total(&self) -> f64 {
        self.recency + self.frequency + self.monetary + self.engagement + self.support_issues
    }
}

/// Input values at which a sub-score reaches its extreme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Saturation {
    pub recency_days: f64,
    pub transaction_count: f64,
    pub total_spent: f64,
    pub support_tickets: f64,
    pub engagement_max: f64,
}

impl Default for Saturation {
    fn default() -> Self {
        Self {
            recency_days: 180.0,
            transaction_count: 20.0,
            total_spent: 500.0,
            support_tickets: 6.0,
            engagement_max: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub high: f64,
    pub medium: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high: 0.70,
            medium: 0.40,
        }
    }
}

impl RiskThresholds {
    /// Buckets a probability. A value exactly on a cut-off belongs to the
    /// higher category.
    pub fn category_for(&self, probability: f64) -> RiskCategory {
        if probability >= self.high - BOUNDARY_EPSILON {
            RiskCategory::High
        } else if probability >= self.medium - BOUNDARY_EPSILON {
            RiskCategory::Medium
        } else {
            RiskCategory::Low
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: FactorWeights,
    pub saturation: Saturation,
    pub thresholds: RiskThresholds,
}

impl ScoringConfig {
    /// Reads and validates a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: ScoringConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "scoring config loaded");
        Ok(config)
    }

    /// Loads `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("recency", self.weights.recency),
            ("frequency", self.weights.frequency),
            ("monetary", self.weights.monetary),
            ("engagement", self.weights.engagement),
            ("support_issues", self.weights.support_issues),
        ];
        for (name, weight) in weights {
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(ConfigError::NegativeWeight(name));
            }
        }

        let total = self.weights.total();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum(total));
        }

        let saturation = [
            ("recency_days", self.saturation.recency_days),
            ("transaction_count", self.saturation.transaction_count),
            ("total_spent", self.saturation.total_spent),
            ("support_tickets", self.saturation.support_tickets),
            ("engagement_max", self.saturation.engagement_max),
        ];
        for (name, value) in saturation {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Saturation(name));
            }
        }

        let RiskThresholds { high, medium } = self.thresholds;
        if !(medium > 0.0 && medium < high && high <= 1.0) {
            return Err(ConfigError::Thresholds { medium, high });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_are_valid() {
        let config = ScoringConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.weights.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn boundary_values_take_the_higher_category() {
        let thresholds = RiskThresholds::default();
        assert_eq!(thresholds.category_for(0.70), RiskCategory::High);
        assert_eq!(thresholds.category_for(0.40), RiskCategory::Medium);
        assert_eq!(thresholds.category_for(0.6999999999999999), RiskCategory::High);
        assert_eq!(thresholds.category_for(0.69), RiskCategory::Medium);
    }

    #[test]
    fn band_below_each_cutoff_maps_up() {
        let thresholds = RiskThresholds::default();
        assert_eq!(thresholds.category_for(0.6999999995), RiskCategory::High);
        assert_eq!(thresholds.category_for(0.699999998), RiskCategory::Medium);
        assert_eq!(thresholds.category_for(0.3999999995), RiskCategory::Medium);
        assert_eq!(thresholds.category_for(0.399999998), RiskCategory::Low);
        assert_eq!(thresholds.category_for(0.39), RiskCategory::Low);
        assert_eq!(thresholds.category_for(0.0), RiskCategory::Low);
        assert_eq!(thresholds.category_for(1.0), RiskCategory::High);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"saturation": {{"recency_days": 90}}}}"#).unwrap();

        let config = ScoringConfig::load(file.path()).unwrap();
        assert_eq!(config.saturation.recency_days, 90.0);
        assert_eq!(config.saturation.transaction_count, 20.0);
        assert_eq!(config.weights, FactorWeights::default());
    }

    #[test]
    fn rejects_weights_that_do_not_sum_to_one() {
        let mut config = ScoringConfig::default();
        config.weights.recency = 0.5;
        assert!(matches!(config.validate(), Err(ConfigError::WeightSum(_))));
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let mut config = ScoringConfig::default();
        config.thresholds = RiskThresholds {
            high: 0.3,
            medium: 0.5,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Thresholds { .. })
        ));
    }

    #[test]
    fn rejects_zero_saturation() {
        let mut config = ScoringConfig::default();
        config.saturation.total_spent = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Saturation("total_spent"))
        ));
    }

    #[test]
    fn reports_malformed_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        assert!(matches!(
            ScoringConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
