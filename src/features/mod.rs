use crate::models::RawTokenFeatures;

/// Number of engineered features. Training metadata and every persisted model
/// assume this dimensionality.
pub const FEATURE_COUNT: usize = 20;

/// Engineered feature names, in vector order. The order is part of the model
/// contract: training and serving both go through [`engineer`], so a change
/// here invalidates persisted artifacts.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "mint_revoked",
    "freeze_revoked",
    "lp_burned_pct",
    "honeypot",
    "tax_buy",
    "tax_sell",
    "real_holders",
    "top10_concentration",
    "sniper_pct",
    "dev_buy_pct",
    "bundled_clusters",
    "mc_to_liq_ratio",
    "slippage_10k",
    "volume_velocity_5m",
    "price_change_5m",
    "buy_density_kde_peak",
    "avg_buy_price",
    "hours_since_migration",
    "jito_bundle_detected",
    "cluster_risk_score",
];

pub type FeatureVector = [f64; FEATURE_COUNT];

/// Transform raw token metrics into the fixed-order model input vector.
///
/// Stateless and side-effect-free; the training pipeline maps it over the
/// dataset and the inference engine calls it per sample, so the two call
/// sites cannot drift. Ratio denominators add 1 to avoid division by zero;
/// any NaN or infinite value is sanitized to 0.
pub fn engineer(raw: &RawTokenFeatures) -> FeatureVector {
    let lp_burned = raw.lp_burned.unwrap_or(0.0);
    let total_supply = raw.total_supply.unwrap_or(1.0);
    let market_cap = raw.market_cap.unwrap_or(0.0);
    let liquidity = raw.liquidity.unwrap_or(1.0);
    let vol_5m = raw.vol_5m.unwrap_or(0.0);
    let vol_1m = raw.vol_1m.unwrap_or(1.0);

    let mut v: FeatureVector = [
        bool_flag(raw.mint_revoked()),
        bool_flag(raw.freeze_revoked()),
        lp_burned / (total_supply + 1.0),
        bool_flag(raw.honeypot()),
        raw.buy_tax(),
        raw.sell_tax(),
        raw.real_holders(),
        raw.top10_pct(),
        raw.sniper_wallets_pct.unwrap_or(0.0),
        raw.dev_bought_pct.unwrap_or(0.0),
        raw.jito_bundle_clusters.unwrap_or(0.0),
        market_cap / (liquidity + 1.0),
        raw.slippage_10k.unwrap_or(0.0),
        vol_5m / (vol_1m + 1.0),
        raw.price_change_5m.unwrap_or(0.0),
        raw.kde_floor.unwrap_or(0.0),
        raw.avg_buy_price.unwrap_or(0.0),
        raw.hours_post_migration.unwrap_or(0.0),
        bool_flag(raw.jito_bundle.unwrap_or(false)),
        raw.gnn_cluster_prob.unwrap_or(0.0),
    ];

    for x in v.iter_mut() {
        if !x.is_finite() {
            *x = 0.0;
        }
    }
    v
}

fn bool_flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}
