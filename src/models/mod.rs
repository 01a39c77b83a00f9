pub mod token;

pub use token::RawTokenFeatures;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// RiskLevel
// ---------------------------------------------------------------------------

/// Discrete risk bands derived from the 0-100 safety score.
///
/// Two threshold tables are in production: the ensemble engine uses a 5-band
/// table with an "EXTREME LOW" band above 95, the basic/fallback path uses
/// the older 4-band table. Both are preserved as observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "EXTREME LOW")]
    ExtremeLow,
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "EXTREME")]
    Extreme,
}

impl RiskLevel {
    /// 5-band table used by the ensemble inference engine.
    pub fn from_score_banded(score: u8) -> Self {
        match score {
            95..=100 => RiskLevel::ExtremeLow,
            90..=94 => RiskLevel::Low,
            70..=89 => RiskLevel::Medium,
            40..=69 => RiskLevel::High,
            _ => RiskLevel::Extreme,
        }
    }

    /// 4-band table used by the basic predictor and the rule fallback.
    pub fn from_score_basic(score: u8) -> Self {
        match score {
            90..=100 => RiskLevel::Low,
            70..=89 => RiskLevel::Medium,
            40..=69 => RiskLevel::High,
            _ => RiskLevel::Extreme,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::ExtremeLow => "EXTREME LOW",
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Extreme => "EXTREME",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PredictionResult
// ---------------------------------------------------------------------------

/// Full inference output. Constructed once per call, never mutated after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Safety score, 0-100, higher = safer.
    pub score: u8,
    pub level: RiskLevel,
    /// Raw model probability of being a rug, 0-1.
    pub rug_probability: f64,
    /// Data-quality confidence in the prediction, 0-1.
    pub confidence: f64,
    /// Which tier produced the probability.
    pub model_used: String,
    /// Up to five templated risk-factor strings, in rule order.
    pub risk_factors: Vec<String>,
}

/// Compact output shape of the basic predictor CLI, kept camelCase for the
/// bot integration that consumes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicPrediction {
    pub score: u8,
    pub level: RiskLevel,
    pub rug_probability: f64,
    pub risk_factors: Vec<String>,
}

// ---------------------------------------------------------------------------
// Artifact metadata
// ---------------------------------------------------------------------------

/// Metadata record written alongside a trained ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleMetadata {
    pub timestamp: DateTime<Utc>,
    pub samples: usize,
    pub features: Vec<String>,
    /// Per-fold F1 for each base-learner kind, keyed by kind name.
    pub fold_scores: BTreeMap<String, Vec<f64>>,
    pub final_f1: f64,
    pub final_accuracy: f64,
    pub final_auc: f64,
    /// Meta-learner coefficients, one per base-learner kind in kind order.
    pub ensemble_weights: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banded_table_boundaries() {
        assert_eq!(RiskLevel::from_score_banded(95), RiskLevel::ExtremeLow);
        assert_eq!(RiskLevel::from_score_banded(94), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score_banded(90), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score_banded(89), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score_banded(70), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score_banded(69), RiskLevel::High);
        assert_eq!(RiskLevel::from_score_banded(40), RiskLevel::High);
        assert_eq!(RiskLevel::from_score_banded(39), RiskLevel::Extreme);
        assert_eq!(RiskLevel::from_score_banded(0), RiskLevel::Extreme);
    }

    #[test]
    fn test_basic_table_boundaries() {
        assert_eq!(RiskLevel::from_score_basic(100), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score_basic(95), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score_basic(90), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score_basic(89), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score_basic(70), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score_basic(40), RiskLevel::High);
        assert_eq!(RiskLevel::from_score_basic(39), RiskLevel::Extreme);
    }

    #[test]
    fn test_risk_level_serde_rename() {
        let json = serde_json::to_string(&RiskLevel::ExtremeLow).unwrap();
        assert_eq!(json, "\"EXTREME LOW\"");
        let back: RiskLevel = serde_json::from_str("\"HIGH\"").unwrap();
        assert_eq!(back, RiskLevel::High);
    }

    #[test]
    fn test_basic_prediction_camel_case() {
        let pred = BasicPrediction {
            score: 80,
            level: RiskLevel::Medium,
            rug_probability: 0.2,
            risk_factors: vec![],
        };
        let json = serde_json::to_string(&pred).unwrap();
        assert!(json.contains("rugProbability"));
        assert!(json.contains("riskFactors"));
    }
}
