pub mod fallback;

use crate::features;
use crate::learners::{BaseLearnerKind, ProbabilisticClassifier};
use crate::models::{BasicPrediction, PredictionResult, RawTokenFeatures, RiskLevel};
use crate::registry::{LoadedTier, ModelRegistry, StackedEnsemble};

/// Hours-post-migration floor below which a token is considered too young to
/// score confidently (~3 minutes).
const MIN_OBSERVATION_HOURS: f64 = 0.05;

/// Synchronous, stateless scoring over an injected registry. Loaded artifacts
/// are read-only shared state, so concurrent calls need no coordination.
pub struct InferenceEngine {
    registry: ModelRegistry,
}

impl InferenceEngine {
    pub fn new(registry: ModelRegistry) -> Self {
        Self { registry }
    }

    /// Full prediction: probability from the best loaded tier (or the rule
    /// fallback), safety score, banded risk level, confidence, risk factors.
    /// Never fails; every input produces a complete result.
    pub fn predict(&self, raw: &RawTokenFeatures) -> PredictionResult {
        let vector = features::engineer(raw);

        let (score, level, rug_probability, model_used) = match self.registry.tier() {
            LoadedTier::Stacked(ensemble) => {
                let p = stacked_probability(ensemble, &vector);
                let score = safety_score(p);
                (score, RiskLevel::from_score_banded(score), p, "stacked_ensemble")
            }
            LoadedTier::Interpretable(model) => {
                let p = model.predict_probability(&vector);
                let score = safety_score(p);
                (score, RiskLevel::from_score_banded(score), p, "interpretable_logistic")
            }
            LoadedTier::Baseline(model) => {
                let p = model.predict_probability(&vector);
                let score = safety_score(p);
                (score, RiskLevel::from_score_banded(score), p, "gbdt_baseline")
            }
            LoadedTier::None => {
                let (score, level, p) = fallback::score(raw);
                (score, level, p, "rule_fallback")
            }
        };

        PredictionResult {
            score,
            level,
            rug_probability,
            confidence: confidence(raw, rug_probability),
            model_used: model_used.to_string(),
            risk_factors: risk_factors(raw),
        }
    }

    /// Legacy compact prediction consumed by the bot integration: same
    /// probability source, but the older 4-band table and no confidence.
    pub fn predict_basic(&self, raw: &RawTokenFeatures) -> BasicPrediction {
        let (score, level, rug_probability) = match self.registry.tier() {
            LoadedTier::None => fallback::score(raw),
            tier => {
                let vector = features::engineer(raw);
                let p = match tier {
                    LoadedTier::Stacked(ensemble) => stacked_probability(ensemble, &vector),
                    LoadedTier::Interpretable(model) | LoadedTier::Baseline(model) => {
                        model.predict_probability(&vector)
                    }
                    LoadedTier::None => unreachable!(),
                };
                let score = safety_score(p);
                (score, RiskLevel::from_score_basic(score), p)
            }
        };

        BasicPrediction {
            score,
            level,
            rug_probability,
            risk_factors: basic_risk_factors(raw),
        }
    }

    pub fn model_used(&self) -> &'static str {
        self.registry.tier_name()
    }
}

/// Bagged stacking prediction: average each kind's probability across its
/// per-fold instances, then combine the per-kind averages with the
/// meta-learner.
fn stacked_probability(ensemble: &StackedEnsemble, vector: &features::FeatureVector) -> f64 {
    let mut meta_row = vec![0.0; BaseLearnerKind::ALL.len()];
    for kind in BaseLearnerKind::ALL {
        let models = &ensemble.fold_models[kind.column()];
        let sum: f64 = models.iter().map(|m| m.predict_probability(vector)).sum();
        meta_row[kind.column()] = sum / models.len() as f64;
    }
    ensemble.meta_learner.predict_probability(&meta_row)
}

/// Safety score: invert the rug probability onto 0-100.
fn safety_score(rug_probability: f64) -> u8 {
    ((1.0 - rug_probability) * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Data-quality confidence ladder. Zero holder/liquidity readings count as
/// "unknown" rather than literal zeros; very young tokens get a haircut;
/// extreme probabilities earn a capped boost.
fn confidence(raw: &RawTokenFeatures, rug_probability: f64) -> f64 {
    let mut c = 1.0f64;
    if raw.holders.unwrap_or(0.0) == 0.0 {
        c *= 0.8;
    }
    if raw.liquidity.unwrap_or(0.0) == 0.0 {
        c *= 0.8;
    }
    if raw.hours_post_migration.unwrap_or(0.0) < MIN_OBSERVATION_HOURS {
        c *= 0.9;
    }
    if rug_probability > 0.9 || rug_probability < 0.1 {
        c = (c * 1.1).min(1.0);
    }
    (c * 1000.0).round() / 1000.0
}

/// Fixed, ordered rule predicates; each hit contributes one templated string
/// carrying the offending value. Truncated to the first five in rule order.
fn risk_factors(raw: &RawTokenFeatures) -> Vec<String> {
    let mut risks = Vec::new();

    if !raw.mint_revoked() {
        risks.push("Mint authority not revoked".to_string());
    }
    if !raw.freeze_revoked() {
        risks.push("Freeze authority not revoked".to_string());
    }
    if raw.honeypot() {
        risks.push("Honeypot detected".to_string());
    }
    if raw.buy_tax() > 5.0 || raw.sell_tax() > 5.0 {
        risks.push(format!("High taxes: {}%/{}%", raw.buy_tax(), raw.sell_tax()));
    }
    if raw.top10_pct() > 50.0 {
        risks.push(format!(
            "High concentration: Top 10 hold {:.1}%",
            raw.top10_pct()
        ));
    }
    let clusters = raw.jito_bundle_clusters.unwrap_or(0.0);
    if clusters > 3.0 {
        risks.push(format!("Multiple Jito bundles: {}", clusters as u64));
    }
    let dev_buy = raw.dev_bought_pct.unwrap_or(0.0);
    if dev_buy > 10.0 {
        risks.push(format!("High dev buy: {dev_buy:.1}%"));
    }
    if clusters > 5.0 {
        risks.push(format!("Wallet clusters detected: {}", clusters as u64));
    }

    risks.truncate(5);
    risks
}

/// Risk-factor list of the legacy compact predictor. The bot integration
/// string-matches these, so they diverge from the rich list: taxes are
/// reported separately and a sub-50% LP burn gets its own entry.
fn basic_risk_factors(raw: &RawTokenFeatures) -> Vec<String> {
    let mut risks = Vec::new();

    if !raw.mint_revoked() {
        risks.push("Mint authority not revoked".to_string());
    }
    if !raw.freeze_revoked() {
        risks.push("Freeze authority not revoked".to_string());
    }
    if raw.honeypot() {
        risks.push("Honeypot detected".to_string());
    }
    if raw.buy_tax() > 5.0 {
        risks.push(format!("High buy tax: {}%", raw.buy_tax()));
    }
    if raw.sell_tax() > 5.0 {
        risks.push(format!("High sell tax: {}%", raw.sell_tax()));
    }
    if raw.top10_pct() > 50.0 {
        risks.push(format!(
            "High concentration: Top 10 hold {:.1}%",
            raw.top10_pct()
        ));
    }
    let clusters = raw.jito_bundle_clusters.unwrap_or(0.0);
    if clusters > 3.0 {
        risks.push(format!("Multiple Jito bundles detected: {}", clusters as u64));
    }
    if raw.lp_burned.unwrap_or(0.0) < raw.total_supply.unwrap_or(1.0) * 0.5 {
        risks.push("Low LP burn percentage".to_string());
    }

    risks.truncate(5);
    risks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learners::{LogisticClassifier, LogisticConfig, TrainedModel};
    use crate::registry::StackedEnsemble;

    fn clean_token() -> RawTokenFeatures {
        serde_json::from_str(
            r#"{
                "mint_authority": null,
                "freeze_authority": null,
                "lp_burned": 900000000.0,
                "total_supply": 1000000000.0,
                "honeypot": false,
                "buy_tax": 0.0,
                "sell_tax": 0.0,
                "holders": 3847.0,
                "top10_pct": 15.0,
                "liquidity": 94000.0,
                "hours_post_migration": 0.15
            }"#,
        )
        .unwrap()
    }

    fn rugged_token() -> RawTokenFeatures {
        serde_json::from_str(
            r#"{
                "mint_authority": "mint111",
                "freeze_authority": "freeze111",
                "honeypot": true,
                "buy_tax": 12.0,
                "sell_tax": 20.0,
                "top10_pct": 85.0,
                "jito_bundle_clusters": 7.0,
                "dev_bought_pct": 25.0,
                "holders": 12.0,
                "liquidity": 500.0,
                "hours_post_migration": 0.01
            }"#,
        )
        .unwrap()
    }

    fn trained_logistic(seed_bias: f64) -> TrainedModel {
        // Probability tracks the honeypot column (index 3) of the vector.
        let mut m = LogisticClassifier::new(LogisticConfig::default());
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..20 {
            let mut row = vec![0.0; crate::features::FEATURE_COUNT];
            let rug = i % 2 == 0;
            row[3] = if rug { 1.0 } else { 0.0 };
            row[7] = if rug { 80.0 + seed_bias } else { 10.0 };
            x.push(row);
            y.push(rug as u8);
        }
        m.fit(&x, &y).unwrap();
        TrainedModel::Logistic(m)
    }

    fn stacked_registry() -> ModelRegistry {
        let fold_models = vec![
            vec![trained_logistic(0.0), trained_logistic(1.0)],
            vec![trained_logistic(2.0), trained_logistic(3.0)],
            vec![trained_logistic(4.0), trained_logistic(5.0)],
        ];
        // Meta learner over three probability columns.
        let mut meta = LogisticClassifier::new(LogisticConfig::default());
        let x = vec![
            vec![0.9, 0.9, 0.9],
            vec![0.1, 0.1, 0.1],
            vec![0.8, 0.85, 0.9],
            vec![0.2, 0.15, 0.1],
        ];
        meta.fit(&x, &[1, 0, 1, 0]).unwrap();
        ModelRegistry::with_tier(LoadedTier::Stacked(StackedEnsemble {
            fold_models,
            meta_learner: TrainedModel::Logistic(meta),
        }))
    }

    #[test]
    fn test_empty_registry_still_returns_complete_result() {
        let engine = InferenceEngine::new(ModelRegistry::empty());
        let result = engine.predict(&clean_token());
        assert_eq!(result.model_used, "rule_fallback");
        assert_eq!(result.score, 100);
        assert_eq!(result.level, RiskLevel::Low);
        assert!(result.risk_factors.is_empty());
    }

    #[test]
    fn test_score_probability_relationship() {
        let engine = InferenceEngine::new(stacked_registry());
        for raw in [clean_token(), rugged_token(), RawTokenFeatures::default()] {
            let r = engine.predict(&raw);
            assert!(r.score <= 100);
            assert!((0.0..=1.0).contains(&r.rug_probability));
            assert_eq!(
                r.score,
                ((1.0 - r.rug_probability) * 100.0).round().clamp(0.0, 100.0) as u8
            );
            assert!((0.0..=1.0).contains(&r.confidence));
        }
    }

    #[test]
    fn test_stacked_separates_clean_from_rugged() {
        let engine = InferenceEngine::new(stacked_registry());
        let clean = engine.predict(&clean_token());
        let rugged = engine.predict(&rugged_token());
        assert_eq!(clean.model_used, "stacked_ensemble");
        assert!(rugged.rug_probability > clean.rug_probability);
    }

    #[test]
    fn test_confidence_unknown_holders_and_liquidity() {
        // holders=0 and liquidity=0 -> 1.0 * 0.8 * 0.8 = 0.64, no extreme
        // boost because the fallback probability here is 0.4.
        let mut raw = clean_token();
        raw.mint_authority = Some("m".into());
        raw.freeze_authority = Some("f".into());
        raw.holders = Some(0.0);
        raw.liquidity = Some(0.0);
        let engine = InferenceEngine::new(ModelRegistry::empty());
        let result = engine.predict(&raw);
        assert!((result.rug_probability - 0.4).abs() < 1e-12);
        assert_eq!(result.confidence, 0.64);
    }

    #[test]
    fn test_confidence_extreme_probability_boost_is_capped() {
        let engine = InferenceEngine::new(ModelRegistry::empty());
        // Clean token: probability 0.0 (extreme), full data -> 1.0 * 1.1 capped.
        let result = engine.predict(&clean_token());
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_young_token_confidence_haircut() {
        let mut raw = clean_token();
        raw.mint_authority = Some("m".into());
        raw.freeze_authority = Some("f".into());
        raw.hours_post_migration = Some(0.01);
        let engine = InferenceEngine::new(ModelRegistry::empty());
        let result = engine.predict(&raw);
        assert_eq!(result.confidence, 0.9);
    }

    #[test]
    fn test_risk_factors_capped_at_five_in_rule_order() {
        let factors = risk_factors(&rugged_token());
        assert_eq!(factors.len(), 5);
        assert_eq!(factors[0], "Mint authority not revoked");
        assert_eq!(factors[1], "Freeze authority not revoked");
        assert_eq!(factors[2], "Honeypot detected");
        assert!(factors[3].starts_with("High taxes"));
        assert!(factors[4].starts_with("High concentration"));
    }

    #[test]
    fn test_basic_path_uses_four_band_table() {
        // Probability "0.07 rug" -> score 93: LOW in the 4-band table,
        // but only the banded table has EXTREME LOW.
        let mut raw = clean_token();
        raw.lp_burned = Some(0.0); // fallback deducts 10 -> score 90
        let engine = InferenceEngine::new(ModelRegistry::empty());
        let basic = engine.predict_basic(&raw);
        assert_eq!(basic.score, 90);
        assert_eq!(basic.level, RiskLevel::Low);

        let rich = engine.predict(&raw);
        assert_eq!(rich.level, RiskLevel::Low); // 4-band via fallback path too
    }

    #[test]
    fn test_basic_risk_factors_use_legacy_templates() {
        let factors = basic_risk_factors(&rugged_token());
        // Taxes split into two entries, so the cap is hit before the
        // concentration rule fires.
        assert_eq!(
            factors,
            vec![
                "Mint authority not revoked",
                "Freeze authority not revoked",
                "Honeypot detected",
                "High buy tax: 12%",
                "High sell tax: 20%",
            ]
        );

        let mut raw = clean_token();
        raw.lp_burned = Some(400_000_000.0);
        let factors = basic_risk_factors(&raw);
        assert_eq!(factors, vec!["Low LP burn percentage"]);
        // The rich list has no LP-burn predicate at all.
        assert!(risk_factors(&raw).is_empty());
    }

    #[test]
    fn test_single_model_tier_reports_its_name() {
        let registry = ModelRegistry::with_tier(LoadedTier::Baseline(trained_logistic(0.0)));
        let engine = InferenceEngine::new(registry);
        let result = engine.predict(&clean_token());
        assert_eq!(result.model_used, "gbdt_baseline");
    }
}
