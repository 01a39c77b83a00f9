use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::errors::AppError;
use crate::features::{self, FeatureVector, FEATURE_NAMES};
use crate::models::RawTokenFeatures;

/// One engineered vector with its binary label (1 = rug, 0 = safe).
#[derive(Debug, Clone)]
pub struct LabeledSample {
    pub features: FeatureVector,
    pub label: u8,
}

/// Ordered training set, de-duplicated by token mint when present.
#[derive(Debug, Clone, Default)]
pub struct TrainingDataset {
    pub samples: Vec<LabeledSample>,
}

impl TrainingDataset {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn positives(&self) -> usize {
        self.samples.iter().filter(|s| s.label == 1).count()
    }

    /// Feature rows in learner input shape.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.samples.iter().map(|s| s.features.to_vec()).collect()
    }

    pub fn labels(&self) -> Vec<u8> {
        self.samples.iter().map(|s| s.label).collect()
    }

    /// Content fingerprint used to validate fold checkpoints. Covers sample
    /// count, label sequence, and the feature definition set, so a changed
    /// dataset or feature list invalidates stale checkpoints.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update((self.len() as u64).to_le_bytes());
        for s in &self.samples {
            hasher.update([s.label]);
            for v in s.features {
                hasher.update(v.to_le_bytes());
            }
        }
        for name in FEATURE_NAMES {
            hasher.update(name.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

// ---------------------------------------------------------------------------
// CSV boundary
// ---------------------------------------------------------------------------

/// Row shape of the labeled CSV exports. Numeric metrics deserialize to
/// `Option<f64>` (empty cells become `None`); boolean-ish columns arrive as
/// free-form strings from various exporters and are parsed leniently.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    mint: Option<String>,
    #[serde(default)]
    label: Option<f64>,
    #[serde(default)]
    is_rug: Option<f64>,

    #[serde(default)]
    mint_authority: Option<String>,
    #[serde(default)]
    freeze_authority: Option<String>,
    #[serde(default)]
    lp_burned: Option<f64>,
    #[serde(default)]
    total_supply: Option<f64>,
    #[serde(default)]
    honeypot: Option<String>,
    #[serde(default)]
    buy_tax: Option<f64>,
    #[serde(default)]
    sell_tax: Option<f64>,
    #[serde(default)]
    holders: Option<f64>,
    #[serde(default)]
    holders_after_filter: Option<f64>,
    #[serde(default)]
    top10_pct: Option<f64>,
    #[serde(default)]
    sniper_wallets_pct: Option<f64>,
    #[serde(default)]
    dev_bought_pct: Option<f64>,
    #[serde(default)]
    jito_bundle_clusters: Option<f64>,
    #[serde(default)]
    market_cap: Option<f64>,
    #[serde(default)]
    liquidity: Option<f64>,
    #[serde(default)]
    slippage_10k: Option<f64>,
    #[serde(default)]
    vol_5m: Option<f64>,
    #[serde(default)]
    vol_1m: Option<f64>,
    #[serde(default)]
    price_change_5m: Option<f64>,
    #[serde(default)]
    kde_floor: Option<f64>,
    #[serde(default)]
    avg_buy_price: Option<f64>,
    #[serde(default)]
    hours_post_migration: Option<f64>,
    #[serde(default)]
    jito_bundle: Option<String>,
    #[serde(default)]
    gnn_cluster_prob: Option<f64>,
}

impl CsvRow {
    fn label(&self) -> Option<u8> {
        self.label
            .or(self.is_rug)
            .map(|v| if v != 0.0 { 1 } else { 0 })
    }

    fn into_raw(self) -> RawTokenFeatures {
        RawTokenFeatures {
            mint_authority: non_empty(self.mint_authority),
            freeze_authority: non_empty(self.freeze_authority),
            lp_burned: self.lp_burned,
            total_supply: self.total_supply,
            honeypot: parse_flag(&self.honeypot),
            buy_tax: self.buy_tax,
            sell_tax: self.sell_tax,
            holders: self.holders,
            holders_after_filter: self.holders_after_filter,
            top10_pct: self.top10_pct,
            sniper_wallets_pct: self.sniper_wallets_pct,
            dev_bought_pct: self.dev_bought_pct,
            jito_bundle_clusters: self.jito_bundle_clusters,
            market_cap: self.market_cap,
            liquidity: self.liquidity,
            slippage_10k: self.slippage_10k,
            vol_5m: self.vol_5m,
            vol_1m: self.vol_1m,
            price_change_5m: self.price_change_5m,
            kde_floor: self.kde_floor,
            avg_buy_price: self.avg_buy_price,
            hours_post_migration: self.hours_post_migration,
            jito_bundle: parse_flag(&self.jito_bundle),
            gnn_cluster_prob: self.gnn_cluster_prob,
        }
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

/// Lenient boolean parsing: pandas exports write `True`/`False`, other
/// sources write `1`/`0` or `1.0`/`0.0`.
fn parse_flag(s: &Option<String>) -> Option<bool> {
    let v = s.as_deref()?.trim();
    if v.is_empty() {
        return None;
    }
    match v.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" => Some(true),
        "false" | "f" | "no" => Some(false),
        other => other.parse::<f64>().ok().map(|n| n != 0.0),
    }
}

/// Load every labeled CSV under `data_dir` into one de-duplicated dataset.
///
/// Fatal errors: no CSV files at all, or none carrying a `label`/`is_rug`
/// column. Rows without a label value are skipped with a warning.
pub fn load_training_data(data_dir: &Path) -> Result<TrainingDataset, AppError> {
    let mut csv_paths: Vec<_> = std::fs::read_dir(data_dir)
        .map_err(|e| AppError::Data(format!("cannot read {}: {e}", data_dir.display())))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    csv_paths.sort();

    if csv_paths.is_empty() {
        return Err(AppError::Data(format!(
            "no training CSV files found in {}",
            data_dir.display()
        )));
    }

    let mut samples = Vec::new();
    let mut seen_mints: HashSet<String> = HashSet::new();
    let mut any_label_column = false;
    let mut skipped = 0usize;

    for path in &csv_paths {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| AppError::Data(format!("cannot open {}: {e}", path.display())))?;

        let has_label_column = reader
            .headers()?
            .iter()
            .any(|h| h == "label" || h == "is_rug");
        any_label_column |= has_label_column;
        if !has_label_column {
            tracing::warn!(file = %path.display(), "CSV has no label/is_rug column, skipping");
            continue;
        }

        let mut loaded = 0usize;
        for record in reader.deserialize::<CsvRow>() {
            let row = record?;
            let Some(label) = row.label() else {
                skipped += 1;
                continue;
            };
            if let Some(mint) = row.mint.as_deref().filter(|m| !m.is_empty()) {
                if !seen_mints.insert(mint.to_string()) {
                    continue;
                }
            }
            let raw = row.into_raw();
            samples.push(LabeledSample {
                features: features::engineer(&raw),
                label,
            });
            loaded += 1;
        }
        tracing::info!(file = %path.display(), rows = loaded, "loaded training CSV");
    }

    if !any_label_column {
        return Err(AppError::Data(
            "no label column found; need 'label' or 'is_rug'".into(),
        ));
    }
    if samples.is_empty() {
        return Err(AppError::Data("training CSVs contained no labeled rows".into()));
    }
    if skipped > 0 {
        tracing::warn!(skipped, "rows without label values were skipped");
    }

    Ok(TrainingDataset { samples })
}
