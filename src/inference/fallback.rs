use crate::models::{RawTokenFeatures, RiskLevel};

/// Rule-based scoring used when no trained artifact is available.
///
/// Starts at 100 and deducts fixed points per red flag, in this exact order;
/// the deduction table is part of the product contract and mirrors the chain
/// checks traders run by hand.
pub fn score(raw: &RawTokenFeatures) -> (u8, RiskLevel, f64) {
    let mut score: i32 = 100;

    if !raw.mint_revoked() {
        score -= 20;
    }
    if !raw.freeze_revoked() {
        score -= 20;
    }
    if raw.honeypot() {
        score -= 30;
    }
    if raw.buy_tax() > 5.0 || raw.sell_tax() > 5.0 {
        score -= 15;
    }
    if raw.top10_pct() > 50.0 {
        score -= 10;
    }
    let lp_burned = raw.lp_burned.unwrap_or(0.0);
    let total_supply = raw.total_supply.unwrap_or(1.0);
    if lp_burned < total_supply * 0.9 {
        score -= 10;
    }

    let score = score.clamp(0, 100) as u8;
    let rug_probability = 1.0 - score as f64 / 100.0;
    (score, RiskLevel::from_score_basic(score), rug_probability)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_token() -> RawTokenFeatures {
        serde_json::from_str(
            r#"{
                "mint_authority": null,
                "freeze_authority": null,
                "honeypot": false,
                "buy_tax": 0.0,
                "sell_tax": 0.0,
                "top10_pct": 15.0,
                "lp_burned": 900000000.0,
                "total_supply": 1000000000.0
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_clean_token_scores_100_low() {
        let (score, level, prob) = score(&clean_token());
        assert_eq!(score, 100);
        assert_eq!(level, RiskLevel::Low);
        assert_eq!(prob, 0.0);
    }

    #[test]
    fn test_live_authorities_score_60_high() {
        let mut raw = clean_token();
        raw.mint_authority = Some("Gh9Z...mint".into());
        raw.freeze_authority = Some("Gh9Z...freeze".into());
        let (score_, level, prob) = score(&raw);
        assert_eq!(score_, 60);
        assert_eq!(level, RiskLevel::High);
        assert!((prob - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_all_red_flags_clamp_to_zero() {
        let raw: RawTokenFeatures = serde_json::from_str(
            r#"{
                "mint_authority": "a",
                "freeze_authority": "b",
                "honeypot": true,
                "buy_tax": 12.0,
                "sell_tax": 15.0,
                "top10_pct": 88.0,
                "lp_burned": 0.0,
                "total_supply": 1000000000.0
            }"#,
        )
        .unwrap();
        let (score_, level, prob) = score(&raw);
        // 100 - 20 - 20 - 30 - 15 - 10 - 10 = -5, clamped.
        assert_eq!(score_, 0);
        assert_eq!(level, RiskLevel::Extreme);
        assert_eq!(prob, 1.0);
    }

    #[test]
    fn test_lp_burn_at_90_percent_is_not_flagged() {
        // Exactly 0.9 x total supply sits on the boundary and passes.
        let (score_, _, _) = score(&clean_token());
        assert_eq!(score_, 100);

        let mut raw = clean_token();
        raw.lp_burned = Some(899_999_999.0);
        let (score_, _, _) = score(&raw);
        assert_eq!(score_, 90);
    }

    #[test]
    fn test_empty_input_defaults() {
        // No fields: authorities default to revoked, lp_burned 0 < 0.9.
        let (score_, level, _) = score(&RawTokenFeatures::default());
        assert_eq!(score_, 90);
        assert_eq!(level, RiskLevel::Low);
    }
}
