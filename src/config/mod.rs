use std::env;
use std::path::PathBuf;

const DEFAULT_MODELS_DIR: &str = "ml/models";
const DEFAULT_DATA_DIR: &str = "ml/data";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding trained artifacts (fold models, meta-learner,
    /// single-model tiers, metadata).
    pub models_dir: PathBuf,
    /// Directory scanned for labeled training CSVs.
    pub data_dir: PathBuf,
    /// Stratified cross-validation fold count.
    pub folds: usize,
    /// RNG seed for fold shuffling and weight initialization.
    pub seed: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            models_dir: env::var("RUGSENSE_MODELS_DIR")
                .unwrap_or_else(|_| DEFAULT_MODELS_DIR.into())
                .into(),
            data_dir: env::var("RUGSENSE_DATA_DIR")
                .unwrap_or_else(|_| DEFAULT_DATA_DIR.into())
                .into(),
            folds: env::var("RUGSENSE_FOLDS")
                .unwrap_or_else(|_| "5".into())
                .parse()
                .unwrap_or(5),
            seed: env::var("RUGSENSE_SEED")
                .unwrap_or_else(|_| "42".into())
                .parse()
                .unwrap_or(42),
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            models_dir: DEFAULT_MODELS_DIR.into(),
            data_dir: DEFAULT_DATA_DIR.into(),
            folds: 5,
            seed: 42,
        }
    }
}
