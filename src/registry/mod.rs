use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::errors::AppError;
use crate::learners::{BaseLearnerKind, TrainedModel};

// Artifact file names shared between the trainer (writer) and the registry
// (reader).
pub const FOLD_MODELS_FILE: &str = "fold_models.json";
pub const META_LEARNER_FILE: &str = "meta_learner.json";
pub const ENSEMBLE_METADATA_FILE: &str = "ensemble_metadata.json";
pub const INTERPRETABLE_MODEL_FILE: &str = "interpretable_model.json";
pub const BASELINE_MODEL_FILE: &str = "baseline_model.json";
pub const CHECKPOINT_DIR: &str = "checkpoints";

/// Persisted shape of the stacked ensemble's level-0 models: per-fold
/// instances grouped by base-learner kind. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleArtifact {
    pub fold_models: BTreeMap<String, Vec<TrainedModel>>,
}

/// Fully loaded stacked ensemble: per-kind fold models in kind order, plus
/// the meta-learner.
#[derive(Debug, Clone)]
pub struct StackedEnsemble {
    /// Indexed by `BaseLearnerKind::column()`.
    pub fold_models: Vec<Vec<TrainedModel>>,
    pub meta_learner: TrainedModel,
}

/// Highest-capability prediction path the registry could load.
#[derive(Debug, Clone)]
pub enum LoadedTier {
    /// Full stacking ensemble: fold-averaged base models + meta-learner.
    Stacked(StackedEnsemble),
    /// Single interpretable logistic model.
    Interpretable(TrainedModel),
    /// Single gradient-boosted baseline.
    Baseline(TrainedModel),
    /// Nothing usable on disk; inference runs the rule-based fallback.
    None,
}

/// Immutable view of the trained artifacts on disk.
///
/// Probes run once, in descending capability order; each probe's failure is
/// logged and the next tier is tried ("first success wins"). The registry is
/// constructed explicitly and injected into the inference engine, never read
/// from global state.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    tier: LoadedTier,
}

impl ModelRegistry {
    /// Probe `models_dir` for artifacts, best tier first.
    pub fn load(models_dir: &Path) -> Self {
        let probes: [(&str, fn(&Path) -> Result<LoadedTier, AppError>); 3] = [
            ("stacked_ensemble", probe_stacked),
            ("interpretable_logistic", probe_interpretable),
            ("gbdt_baseline", probe_baseline),
        ];

        for (name, probe) in probes {
            match probe(models_dir) {
                Ok(tier) => {
                    tracing::info!(tier = name, "model registry loaded");
                    return Self { tier };
                }
                Err(e) => {
                    tracing::debug!(tier = name, error = %e, "tier probe failed, falling through");
                }
            }
        }

        tracing::warn!(
            dir = %models_dir.display(),
            "no trained artifacts found, inference will use rule-based fallback"
        );
        Self { tier: LoadedTier::None }
    }

    /// Registry with no artifacts; inference degrades to the rule fallback.
    pub fn empty() -> Self {
        Self { tier: LoadedTier::None }
    }

    /// Registry wrapping an already-loaded tier; used by tests and by the
    /// trainer to self-check a freshly written artifact.
    pub fn with_tier(tier: LoadedTier) -> Self {
        Self { tier }
    }

    pub fn tier(&self) -> &LoadedTier {
        &self.tier
    }

    pub fn tier_name(&self) -> &'static str {
        match self.tier {
            LoadedTier::Stacked(_) => "stacked_ensemble",
            LoadedTier::Interpretable(_) => "interpretable_logistic",
            LoadedTier::Baseline(_) => "gbdt_baseline",
            LoadedTier::None => "none",
        }
    }
}

// ---------------------------------------------------------------------------
// Tier probes
// ---------------------------------------------------------------------------

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let file = File::open(path).map_err(|e| AppError::ArtifactProbe {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| AppError::ArtifactProbe {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn probe_stacked(dir: &Path) -> Result<LoadedTier, AppError> {
    let artifact: EnsembleArtifact = read_json(&dir.join(FOLD_MODELS_FILE))?;
    let meta_learner: TrainedModel = read_json(&dir.join(META_LEARNER_FILE))?;

    let mut fold_models = Vec::with_capacity(BaseLearnerKind::ALL.len());
    for kind in BaseLearnerKind::ALL {
        let models = artifact
            .fold_models
            .get(kind.as_str())
            .filter(|m| !m.is_empty())
            .ok_or_else(|| AppError::ArtifactProbe {
                path: dir.join(FOLD_MODELS_FILE),
                reason: format!("no fold models for base learner '{kind}'"),
            })?;
        fold_models.push(models.clone());
    }

    Ok(LoadedTier::Stacked(StackedEnsemble {
        fold_models,
        meta_learner,
    }))
}

fn probe_interpretable(dir: &Path) -> Result<LoadedTier, AppError> {
    Ok(LoadedTier::Interpretable(read_json(
        &dir.join(INTERPRETABLE_MODEL_FILE),
    )?))
}

fn probe_baseline(dir: &Path) -> Result<LoadedTier, AppError> {
    Ok(LoadedTier::Baseline(read_json(&dir.join(BASELINE_MODEL_FILE))?))
}

pub fn checkpoint_path(models_dir: &Path, fold: usize) -> PathBuf {
    models_dir.join(CHECKPOINT_DIR).join(format!("fold_{fold}.json"))
}
