pub mod gbdt;
pub mod logistic;
pub mod mlp;

pub use gbdt::{GbdtClassifier, GbdtConfig};
pub use logistic::{LogisticClassifier, LogisticConfig};
pub use mlp::{MlpClassifier, MlpConfig};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Capability contract every learning algorithm is invoked through:
/// "trainable probabilistic classifier". The orchestrator and the inference
/// engine never look inside an implementation.
pub trait ProbabilisticClassifier {
    /// Train on feature rows and binary labels (1 = rug, 0 = safe).
    fn fit(&mut self, x: &[Vec<f64>], y: &[u8]) -> anyhow::Result<()>;

    /// Probability of the positive (rug) class for one feature row.
    fn predict_probability(&self, row: &[f64]) -> f64;
}

// ---------------------------------------------------------------------------
// Base-learner kinds
// ---------------------------------------------------------------------------

/// The base-learner types in the stacking ensemble. Enum order is the
/// meta-feature column order and is part of the persisted model contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseLearnerKind {
    Gbdt,
    Logistic,
    Mlp,
}

impl BaseLearnerKind {
    pub const ALL: [BaseLearnerKind; 3] = [
        BaseLearnerKind::Gbdt,
        BaseLearnerKind::Logistic,
        BaseLearnerKind::Mlp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BaseLearnerKind::Gbdt => "gbdt",
            BaseLearnerKind::Logistic => "logistic",
            BaseLearnerKind::Mlp => "mlp",
        }
    }

    /// Meta-feature column index for this kind.
    pub fn column(&self) -> usize {
        Self::ALL.iter().position(|k| k == self).unwrap_or(0)
    }

    /// Fresh untrained model of this kind, seeded for reproducibility.
    pub fn new_model(&self, seed: u64) -> TrainedModel {
        match self {
            BaseLearnerKind::Gbdt => {
                TrainedModel::Gbdt(GbdtClassifier::new(GbdtConfig::default()))
            }
            BaseLearnerKind::Logistic => {
                TrainedModel::Logistic(LogisticClassifier::new(LogisticConfig::default()))
            }
            BaseLearnerKind::Mlp => {
                TrainedModel::Mlp(MlpClassifier::new(MlpConfig::default(), seed))
            }
        }
    }
}

impl fmt::Display for BaseLearnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TrainedModel — serializable wrapper over the concrete adapters
// ---------------------------------------------------------------------------

/// A trained (or trainable) model instance. Tagged so fold-model files stay
/// readable across kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainedModel {
    Gbdt(GbdtClassifier),
    Logistic(LogisticClassifier),
    Mlp(MlpClassifier),
}

impl ProbabilisticClassifier for TrainedModel {
    fn fit(&mut self, x: &[Vec<f64>], y: &[u8]) -> anyhow::Result<()> {
        match self {
            TrainedModel::Gbdt(m) => m.fit(x, y),
            TrainedModel::Logistic(m) => m.fit(x, y),
            TrainedModel::Mlp(m) => m.fit(x, y),
        }
    }

    fn predict_probability(&self, row: &[f64]) -> f64 {
        match self {
            TrainedModel::Gbdt(m) => m.predict_probability(row),
            TrainedModel::Logistic(m) => m.predict_probability(row),
            TrainedModel::Mlp(m) => m.predict_probability(row),
        }
    }
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
