use serde::{Deserialize, Serialize};

/// Raw on-chain/market metrics for one token, as supplied by the collector
/// or the CLI. Every field is optional; defaults are applied in exactly one
/// place per consumer (the feature transform, the confidence ladder, the
/// fallback scorer) and documented here.
///
/// Authority fields carry the authority's address when it is still live;
/// `None` means revoked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTokenFeatures {
    /// Mint authority address; `None` = revoked.
    pub mint_authority: Option<String>,
    /// Freeze authority address; `None` = revoked.
    pub freeze_authority: Option<String>,
    /// LP tokens burned, in raw units. Default 0.
    pub lp_burned: Option<f64>,
    /// Total token supply. Default 1 (ratio denominators add 1 on top).
    pub total_supply: Option<f64>,
    /// Honeypot flag from the simulation check. Default false.
    pub honeypot: Option<bool>,
    /// Buy tax percentage. Default 0.
    pub buy_tax: Option<f64>,
    /// Sell tax percentage. Default 0.
    pub sell_tax: Option<f64>,
    /// Raw holder count. Default 0; 0 is treated as "unknown" downstream.
    pub holders: Option<f64>,
    /// Holder count after sybil filtering; falls back to `holders`.
    pub holders_after_filter: Option<f64>,
    /// Percentage of supply held by the top 10 wallets. Default 0.
    pub top10_pct: Option<f64>,
    /// Percentage of sniper wallets among early buyers. Default 0.
    pub sniper_wallets_pct: Option<f64>,
    /// Percentage of supply bought by the deployer. Default 0.
    pub dev_bought_pct: Option<f64>,
    /// Count of detected Jito bundle clusters. Default 0.
    pub jito_bundle_clusters: Option<f64>,
    /// Market cap in USD. Default 0.
    pub market_cap: Option<f64>,
    /// Pool liquidity in USD. Default 1 for ratios, 0 for the "unknown"
    /// confidence check.
    pub liquidity: Option<f64>,
    /// Price impact of a 10k swap, percent. Default 0.
    pub slippage_10k: Option<f64>,
    /// 5-minute volume. Default 0.
    pub vol_5m: Option<f64>,
    /// 1-minute volume. Default 1 (velocity denominator adds 1 on top).
    pub vol_1m: Option<f64>,
    /// 5-minute price change, percent. Default 0.
    pub price_change_5m: Option<f64>,
    /// KDE buy-density floor estimate. Default 0.
    pub kde_floor: Option<f64>,
    /// Average buy price. Default 0.
    pub avg_buy_price: Option<f64>,
    /// Hours since the token migrated to the DEX. Default 0.
    pub hours_post_migration: Option<f64>,
    /// Whether launch buys arrived in a Jito bundle. Default false.
    pub jito_bundle: Option<bool>,
    /// Wallet-cluster risk probability from the graph model. Default 0.
    pub gnn_cluster_prob: Option<f64>,
}

impl RawTokenFeatures {
    pub fn mint_revoked(&self) -> bool {
        self.mint_authority.is_none()
    }

    pub fn freeze_revoked(&self) -> bool {
        self.freeze_authority.is_none()
    }

    pub fn honeypot(&self) -> bool {
        self.honeypot.unwrap_or(false)
    }

    pub fn buy_tax(&self) -> f64 {
        self.buy_tax.unwrap_or(0.0)
    }

    pub fn sell_tax(&self) -> f64 {
        self.sell_tax.unwrap_or(0.0)
    }

    pub fn top10_pct(&self) -> f64 {
        self.top10_pct.unwrap_or(0.0)
    }

    /// Sybil-filtered holder count, falling back to the raw count.
    pub fn real_holders(&self) -> f64 {
        self.holders_after_filter
            .or(self.holders)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_deserialize_to_defaults() {
        let raw: RawTokenFeatures = serde_json::from_str("{}").unwrap();
        assert!(raw.mint_revoked());
        assert!(raw.freeze_revoked());
        assert!(!raw.honeypot());
        assert_eq!(raw.real_holders(), 0.0);
    }

    #[test]
    fn test_null_authority_means_revoked() {
        let raw: RawTokenFeatures =
            serde_json::from_str(r#"{"mint_authority": null, "freeze_authority": "abc"}"#)
                .unwrap();
        assert!(raw.mint_revoked());
        assert!(!raw.freeze_revoked());
    }

    #[test]
    fn test_filtered_holders_fallback() {
        let raw: RawTokenFeatures =
            serde_json::from_str(r#"{"holders": 500}"#).unwrap();
        assert_eq!(raw.real_holders(), 500.0);

        let raw: RawTokenFeatures =
            serde_json::from_str(r#"{"holders": 500, "holders_after_filter": 320}"#).unwrap();
        assert_eq!(raw.real_holders(), 320.0);
    }
}
