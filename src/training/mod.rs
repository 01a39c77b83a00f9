pub mod folds;
pub mod metrics;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dataset::TrainingDataset;
use crate::errors::AppError;
use crate::features::FEATURE_NAMES;
use crate::learners::{
    BaseLearnerKind, GbdtClassifier, GbdtConfig, LogisticClassifier, LogisticConfig,
    ProbabilisticClassifier, TrainedModel,
};
use crate::models::EnsembleMetadata;
use crate::registry::{
    self, EnsembleArtifact, BASELINE_MODEL_FILE, CHECKPOINT_DIR, ENSEMBLE_METADATA_FILE,
    FOLD_MODELS_FILE, INTERPRETABLE_MODEL_FILE, META_LEARNER_FILE,
};

use folds::{stratified_kfold, Fold};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub folds: usize,
    pub seed: u64,
    pub models_dir: PathBuf,
}

// ---------------------------------------------------------------------------
// Fold checkpoints
// ---------------------------------------------------------------------------

/// Everything one completed fold produced. Written atomically after the fold
/// finishes; an interrupted fold leaves no file and is retrained from
/// scratch, never resumed from partial state.
#[derive(Debug, Serialize, Deserialize)]
pub struct FoldCheckpoint {
    /// Dataset fingerprint the fold was trained against.
    pub fingerprint: String,
    pub fold: usize,
    /// Held-out row indices this fold scored.
    pub validation: Vec<usize>,
    /// One trained model per base-learner kind, in kind order.
    pub models: Vec<TrainedModel>,
    /// Out-of-fold probabilities per kind, aligned with `validation`.
    pub oof: Vec<Vec<f64>>,
    /// Held-out F1 per kind.
    pub fold_f1: Vec<f64>,
}

fn try_load_checkpoint(
    path: &Path,
    fingerprint: &str,
    fold: usize,
    validation: &[usize],
) -> Option<FoldCheckpoint> {
    let file = std::fs::File::open(path).ok()?;
    let cp: FoldCheckpoint = serde_json::from_reader(std::io::BufReader::new(file)).ok()?;
    let kinds = BaseLearnerKind::ALL.len();
    let valid = cp.fingerprint == fingerprint
        && cp.fold == fold
        && cp.validation == validation
        && cp.models.len() == kinds
        && cp.fold_f1.len() == kinds
        && cp.oof.len() == kinds
        && cp.oof.iter().all(|o| o.len() == validation.len());
    if !valid {
        tracing::warn!(fold, "stale fold checkpoint ignored, retraining from scratch");
        return None;
    }
    Some(cp)
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    let file = std::fs::File::create(&tmp)?;
    serde_json::to_writer(std::io::BufWriter::new(file), value)
        .map_err(|e| AppError::Internal(e.into()))?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Stacked-generalization trainer
// ---------------------------------------------------------------------------

/// Offline stacking trainer: stratified k-fold out-of-fold predictions feed
/// a logistic meta-learner, so the combiner never trains on a prediction made
/// by a model that saw the same row.
pub struct StackedTrainer {
    config: TrainerConfig,
}

impl StackedTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn train(&self, dataset: &TrainingDataset) -> Result<EnsembleMetadata, AppError> {
        if dataset.is_empty() {
            return Err(AppError::Data("training dataset is empty".into()));
        }
        let rows = dataset.rows();
        let labels = dataset.labels();
        let fingerprint = dataset.fingerprint();
        let n = rows.len();
        let kinds = BaseLearnerKind::ALL.len();

        tracing::info!(
            samples = n,
            positives = dataset.positives(),
            folds = self.config.folds,
            "starting stacked ensemble training"
        );

        let fold_plan = stratified_kfold(&labels, self.config.folds, self.config.seed);

        // Folds are independent and write disjoint validation row ranges, so
        // they run data-parallel with no coordination.
        let outcomes: Vec<FoldCheckpoint> = fold_plan
            .par_iter()
            .enumerate()
            .map(|(i, fold)| self.run_fold(i, fold, &rows, &labels, &fingerprint))
            .collect::<Result<_, _>>()?;

        // Assemble the meta-feature matrix: one column per kind, each row
        // filled exactly once by the fold that held it out.
        let mut meta = vec![vec![0.0; kinds]; n];
        let mut filled = vec![0usize; n];
        for cp in &outcomes {
            for (pos, &row_idx) in cp.validation.iter().enumerate() {
                filled[row_idx] += 1;
                for k in 0..kinds {
                    meta[row_idx][k] = cp.oof[k][pos];
                }
            }
        }
        if filled.iter().any(|&c| c != 1) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "out-of-fold invariant violated: some rows scored {} times",
                filled.iter().copied().max().unwrap_or(0)
            )));
        }

        // Level 1: logistic combiner over the out-of-fold matrix.
        let mut meta_learner = LogisticClassifier::new(LogisticConfig::default());
        meta_learner
            .fit(&meta, &labels)
            .map_err(|e| AppError::Internal(e.context("meta-learner training failed")))?;
        let ensemble_weights = meta_learner.coefficients().to_vec();

        let final_probs: Vec<f64> = meta
            .iter()
            .map(|row| meta_learner.predict_probability(row))
            .collect();
        let final_f1 = metrics::f1_score(&labels, &final_probs);
        let final_accuracy = metrics::accuracy(&labels, &final_probs);
        let final_auc = metrics::roc_auc(&labels, &final_probs);

        let mut fold_scores: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for kind in BaseLearnerKind::ALL {
            fold_scores.insert(
                kind.as_str().to_string(),
                outcomes.iter().map(|cp| cp.fold_f1[kind.column()]).collect(),
            );
        }

        // Persist the artifact bundle.
        let mut fold_models: BTreeMap<String, Vec<TrainedModel>> = BTreeMap::new();
        for kind in BaseLearnerKind::ALL {
            fold_models.insert(kind.as_str().to_string(), Vec::new());
        }
        for cp in outcomes {
            for (kind, model) in BaseLearnerKind::ALL.iter().zip(cp.models) {
                if let Some(models) = fold_models.get_mut(kind.as_str()) {
                    models.push(model);
                }
            }
        }

        let metadata = EnsembleMetadata {
            timestamp: Utc::now(),
            samples: n,
            features: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            fold_scores,
            final_f1,
            final_accuracy,
            final_auc,
            ensemble_weights,
        };

        let dir = &self.config.models_dir;
        write_json_atomic(&dir.join(FOLD_MODELS_FILE), &EnsembleArtifact { fold_models })?;
        write_json_atomic(&dir.join(META_LEARNER_FILE), &TrainedModel::Logistic(meta_learner))?;
        write_json_atomic(&dir.join(ENSEMBLE_METADATA_FILE), &metadata)?;

        // Checkpoints are crash-recovery state only; drop them on success.
        let _ = std::fs::remove_dir_all(dir.join(CHECKPOINT_DIR));

        tracing::info!(
            final_f1,
            final_accuracy,
            final_auc,
            "stacked ensemble training complete"
        );
        Ok(metadata)
    }

    fn run_fold(
        &self,
        fold_idx: usize,
        fold: &Fold,
        rows: &[Vec<f64>],
        labels: &[u8],
        fingerprint: &str,
    ) -> Result<FoldCheckpoint, AppError> {
        let cp_path = registry::checkpoint_path(&self.config.models_dir, fold_idx);
        if let Some(cp) = try_load_checkpoint(&cp_path, fingerprint, fold_idx, &fold.validation) {
            tracing::info!(fold = fold_idx, "reusing completed fold checkpoint");
            return Ok(cp);
        }

        let train_x: Vec<Vec<f64>> = fold.train.iter().map(|&i| rows[i].clone()).collect();
        let train_y: Vec<u8> = fold.train.iter().map(|&i| labels[i]).collect();
        let val_y: Vec<u8> = fold.validation.iter().map(|&i| labels[i]).collect();

        let mut models = Vec::with_capacity(BaseLearnerKind::ALL.len());
        let mut oof = Vec::with_capacity(BaseLearnerKind::ALL.len());
        let mut fold_f1 = Vec::with_capacity(BaseLearnerKind::ALL.len());

        for kind in BaseLearnerKind::ALL {
            let seed = self
                .config
                .seed
                .wrapping_add((fold_idx * BaseLearnerKind::ALL.len() + kind.column()) as u64);
            let mut model = kind.new_model(seed);

            // A failed base learner aborts the run: writing a zero row here
            // would silently bias the combiner.
            model.fit(&train_x, &train_y).map_err(|e| AppError::FoldTraining {
                fold: fold_idx,
                learner: kind.as_str(),
                reason: e.to_string(),
            })?;

            let preds: Vec<f64> = fold
                .validation
                .iter()
                .map(|&i| model.predict_probability(&rows[i]))
                .collect();
            let f1 = metrics::f1_score(&val_y, &preds);
            tracing::info!(fold = fold_idx, learner = %kind, f1, "fold learner trained");

            models.push(model);
            oof.push(preds);
            fold_f1.push(f1);
        }

        let cp = FoldCheckpoint {
            fingerprint: fingerprint.to_string(),
            fold: fold_idx,
            validation: fold.validation.clone(),
            models,
            oof,
            fold_f1,
        };
        write_json_atomic(&cp_path, &cp)?;
        Ok(cp)
    }
}

// ---------------------------------------------------------------------------
// Single-model tiers (interpretable / baseline)
// ---------------------------------------------------------------------------

/// Metadata sidecar for the single-model tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleModelMetadata {
    pub timestamp: chrono::DateTime<Utc>,
    pub samples: usize,
    pub features: Vec<String>,
    pub final_f1: f64,
    pub final_accuracy: f64,
    pub final_auc: f64,
}

/// Train the tier-2 interpretable logistic model on the full dataset.
pub fn train_interpretable(
    dataset: &TrainingDataset,
    models_dir: &Path,
) -> Result<SingleModelMetadata, AppError> {
    let model = TrainedModel::Logistic(LogisticClassifier::new(LogisticConfig::default()));
    train_single_tier(dataset, model, models_dir, INTERPRETABLE_MODEL_FILE)
}

/// Train the tier-3 gradient-boosted baseline on the full dataset.
pub fn train_baseline(
    dataset: &TrainingDataset,
    models_dir: &Path,
) -> Result<SingleModelMetadata, AppError> {
    let model = TrainedModel::Gbdt(GbdtClassifier::new(GbdtConfig::default()));
    train_single_tier(dataset, model, models_dir, BASELINE_MODEL_FILE)
}

fn train_single_tier(
    dataset: &TrainingDataset,
    mut model: TrainedModel,
    models_dir: &Path,
    file: &str,
) -> Result<SingleModelMetadata, AppError> {
    if dataset.is_empty() {
        return Err(AppError::Data("training dataset is empty".into()));
    }
    let rows = dataset.rows();
    let labels = dataset.labels();

    model
        .fit(&rows, &labels)
        .map_err(|e| AppError::Internal(e.context("single-model training failed")))?;

    let probs: Vec<f64> = rows.iter().map(|r| model.predict_probability(r)).collect();
    let metadata = SingleModelMetadata {
        timestamp: Utc::now(),
        samples: rows.len(),
        features: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        final_f1: metrics::f1_score(&labels, &probs),
        final_accuracy: metrics::accuracy(&labels, &probs),
        final_auc: metrics::roc_auc(&labels, &probs),
    };

    write_json_atomic(&models_dir.join(file), &model)?;
    let sidecar = format!("{}_metadata.json", file.trim_end_matches(".json"));
    write_json_atomic(&models_dir.join(sidecar), &metadata)?;

    tracing::info!(file, f1 = metadata.final_f1, "single-model tier trained");
    Ok(metadata)
}
