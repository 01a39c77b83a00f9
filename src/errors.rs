use std::path::PathBuf;

/// Error taxonomy for the scoring engine.
///
/// Probe failures are recovered inside the registry (next tier is tried) and
/// never surface to inference callers; a public prediction call either returns
/// a complete result or a structured error.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No training CSVs found, or none carried a usable label column. Fatal
    /// for training runs.
    #[error("Training data error: {0}")]
    Data(String),

    /// A single tier's artifact was missing or unreadable. Handled locally by
    /// falling through to the next tier.
    #[error("Artifact probe failed for {path}: {reason}")]
    ArtifactProbe { path: PathBuf, reason: String },

    /// Malformed prediction input (bad CLI JSON). Reported to the caller with
    /// a non-zero exit status.
    #[error("Invalid prediction input: {0}")]
    PredictionInput(String),

    /// A base learner failed mid-fold. Aborts the whole training run rather
    /// than writing a degenerate meta-feature row.
    #[error("Training failed in fold {fold} for learner {learner}: {reason}")]
    FoldTraining {
        fold: usize,
        learner: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::PredictionInput(e.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(e: csv::Error) -> Self {
        AppError::Data(e.to_string())
    }
}
