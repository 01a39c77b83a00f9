use clap::{Parser, Subcommand, ValueEnum};

use rugsense::config::AppConfig;
use rugsense::dataset;
use rugsense::errors::AppError;
use rugsense::inference::InferenceEngine;
use rugsense::models::RawTokenFeatures;
use rugsense::registry::{
    ModelRegistry, BASELINE_MODEL_FILE, ENSEMBLE_METADATA_FILE, FOLD_MODELS_FILE,
    INTERPRETABLE_MODEL_FILE, META_LEARNER_FILE,
};
use rugsense::training::{self, StackedTrainer, TrainerConfig};

#[derive(Parser)]
#[command(name = "rugsense", about = "Solana rug-pull risk scoring engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score one token from a JSON object of raw metrics
    Predict {
        /// Raw token metrics as a JSON object
        #[arg(long)]
        features: String,
        /// Emit the legacy compact shape (4-band risk table, camelCase keys)
        #[arg(long)]
        basic: bool,
    },
    /// Train model artifacts from the labeled CSVs in the data directory
    Train {
        #[arg(long, value_enum, default_value_t = Tier::Ensemble)]
        tier: Tier,
    },
    /// Report which artifacts and training data are present
    Verify,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Tier {
    /// Stacked ensemble: k-fold base models + logistic meta-learner
    Ensemble,
    /// Single full-dataset logistic model (tier 2)
    Interpretable,
    /// Single full-dataset gradient-boosted model (tier 3)
    Baseline,
}

fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Command::Predict { features, basic } => run_predict(&config, &features, basic),
        Command::Train { tier } => run_train(&config, tier),
        Command::Verify => run_verify(&config),
    };
    std::process::exit(code);
}

fn run_predict(config: &AppConfig, features_json: &str, basic: bool) -> i32 {
    match predict(config, features_json, basic) {
        Ok(json) => {
            println!("{json}");
            0
        }
        Err(e) => {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
            1
        }
    }
}

fn predict(config: &AppConfig, features_json: &str, basic: bool) -> Result<String, AppError> {
    let raw: RawTokenFeatures = serde_json::from_str(features_json)?;
    let registry = ModelRegistry::load(&config.models_dir);
    let engine = InferenceEngine::new(registry);

    let json = if basic {
        serde_json::to_string(&engine.predict_basic(&raw))
    } else {
        serde_json::to_string(&engine.predict(&raw))
    }
    .map_err(|e| AppError::Internal(e.into()))?;
    Ok(json)
}

fn run_train(config: &AppConfig, tier: Tier) -> i32 {
    let dataset = match dataset::load_training_data(&config.data_dir) {
        Ok(ds) => ds,
        Err(e) => {
            tracing::error!(error = %e, "failed to load training data");
            return 1;
        }
    };

    let outcome = match tier {
        Tier::Ensemble => {
            let trainer = StackedTrainer::new(TrainerConfig {
                folds: config.folds,
                seed: config.seed,
                models_dir: config.models_dir.clone(),
            });
            trainer
                .train(&dataset)
                .and_then(|m| serde_json::to_string_pretty(&m).map_err(|e| AppError::Internal(e.into())))
        }
        Tier::Interpretable => training::train_interpretable(&dataset, &config.models_dir)
            .and_then(|m| serde_json::to_string_pretty(&m).map_err(|e| AppError::Internal(e.into()))),
        Tier::Baseline => training::train_baseline(&dataset, &config.models_dir)
            .and_then(|m| serde_json::to_string_pretty(&m).map_err(|e| AppError::Internal(e.into()))),
    };

    match outcome {
        Ok(summary) => {
            println!("{summary}");
            0
        }
        Err(e) => {
            tracing::error!(error = %e, "training failed");
            1
        }
    }
}

fn run_verify(config: &AppConfig) -> i32 {
    let artifacts = [
        ("stacked ensemble fold models", FOLD_MODELS_FILE),
        ("stacked ensemble meta-learner", META_LEARNER_FILE),
        ("ensemble metadata", ENSEMBLE_METADATA_FILE),
        ("interpretable model", INTERPRETABLE_MODEL_FILE),
        ("baseline model", BASELINE_MODEL_FILE),
    ];
    for (label, file) in artifacts {
        let path = config.models_dir.join(file);
        let mark = if path.exists() { "ok" } else { "missing" };
        println!("{mark:>8}  {label} ({})", path.display());
    }

    let csv_count = std::fs::read_dir(&config.data_dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "csv"))
                .count()
        })
        .unwrap_or(0);
    println!("{csv_count:>8}  training CSV files in {}", config.data_dir.display());

    let registry = ModelRegistry::load(&config.models_dir);
    println!("{:>8}  active prediction tier", registry.tier_name());
    0
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &std::path::Path) -> AppConfig {
        AppConfig {
            models_dir: dir.to_path_buf(),
            data_dir: dir.to_path_buf(),
            folds: 5,
            seed: 42,
        }
    }

    #[test]
    fn test_malformed_features_json_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = predict(&test_config(dir.path()), "{not json", false).unwrap_err();
        assert!(matches!(err, AppError::PredictionInput(_)));
        assert!(err.to_string().starts_with("Invalid prediction input"));
    }

    #[test]
    fn test_wrong_field_type_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = predict(&test_config(dir.path()), r#"{"buy_tax": "lots"}"#, true).unwrap_err();
        assert!(matches!(err, AppError::PredictionInput(_)));
    }

    #[test]
    fn test_empty_object_predicts_via_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let json = predict(&test_config(dir.path()), "{}", false).unwrap();
        assert!(json.contains("rule_fallback"));
    }
}
