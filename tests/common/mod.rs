#![allow(dead_code)]

use std::io::Write;
use std::path::Path;

use rugsense::models::RawTokenFeatures;

/// Write a labeled training CSV with `n` alternating rug/safe rows that are
/// cleanly separable on authorities, honeypot, LP burn and concentration.
pub fn write_training_csv(dir: &Path, n: usize) {
    let mut out = String::from(
        "mint,label,mint_authority,freeze_authority,lp_burned,total_supply,\
         honeypot,buy_tax,sell_tax,holders,top10_pct,market_cap,liquidity,\
         vol_5m,vol_1m,hours_post_migration,jito_bundle_clusters,dev_bought_pct\n",
    );
    for i in 0..n {
        let rug = i % 2 == 0;
        let jitter = (i % 7) as f64;
        if rug {
            out.push_str(&format!(
                "rug{i},1,authmint{i},authfreeze{i},0,1000000000,True,12,15,\
                 {holders},{top10},5000,800,100,10,0.02,6,25\n",
                holders = 20.0 + jitter,
                top10 = 80.0 + jitter,
            ));
        } else {
            out.push_str(&format!(
                "safe{i},0,,,900000000,1000000000,False,0,0,\
                 {holders},{top10},180000,95000,500000,100000,4.5,0,0\n",
                holders = 2000.0 + jitter * 10.0,
                top10 = 10.0 + jitter,
            ));
        }
    }
    let mut file = std::fs::File::create(dir.join("training_data.csv")).unwrap();
    file.write_all(out.as_bytes()).unwrap();
}

pub fn clean_token() -> RawTokenFeatures {
    serde_json::from_str(
        r#"{
            "mint_authority": null,
            "freeze_authority": null,
            "lp_burned": 900000000.0,
            "total_supply": 1000000000.0,
            "honeypot": false,
            "buy_tax": 0.0,
            "sell_tax": 0.0,
            "holders": 2030.0,
            "top10_pct": 12.0,
            "market_cap": 180000.0,
            "liquidity": 95000.0,
            "vol_5m": 500000.0,
            "vol_1m": 100000.0,
            "hours_post_migration": 4.5
        }"#,
    )
    .unwrap()
}

pub fn rug_token() -> RawTokenFeatures {
    serde_json::from_str(
        r#"{
            "mint_authority": "authmint0",
            "freeze_authority": "authfreeze0",
            "lp_burned": 0.0,
            "total_supply": 1000000000.0,
            "honeypot": true,
            "buy_tax": 12.0,
            "sell_tax": 15.0,
            "holders": 22.0,
            "top10_pct": 83.0,
            "market_cap": 5000.0,
            "liquidity": 800.0,
            "vol_5m": 100.0,
            "vol_1m": 10.0,
            "hours_post_migration": 0.02,
            "jito_bundle_clusters": 6.0,
            "dev_bought_pct": 25.0
        }"#,
    )
    .unwrap()
}
