use std::{collections::HashMap, env, time::Duration};

use anyhow::{Context, Result};

pub const DEFAULT_BUDA_API_BASE: &str = "https://www.buda.com/api/v2";
const DEFAULT_BUDA_TIMEOUT_SECS: u64 = 5;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub buda_api_base: String,
    pub buda_timeout: Duration,
    pub frontend_origins: Vec<String>,
    /// Fixed `market_id -> price` table. When non-empty it replaces the live
    /// exchange.
    pub static_prices: HashMap<String, f64>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let buda_api_base = env::var("BUDA_API_BASE")
            .ok()
            .map(|base| base.trim().trim_end_matches('/').to_string())
            .filter(|base| !base.is_empty())
            .unwrap_or_else(|| DEFAULT_BUDA_API_BASE.to_string());

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a valid u16")?,
            buda_api_base,
            buda_timeout: parse_duration_seconds("BUDA_TIMEOUT_SECS", DEFAULT_BUDA_TIMEOUT_SECS),
            frontend_origins: parse_origins(),
            static_prices: env::var("STATIC_PRICES")
                .map(|raw| parse_static_prices(&raw))
                .unwrap_or_default(),
        })
    }
}

fn parse_origins() -> Vec<String> {
    if let Ok(list) = env::var("FRONTEND_ORIGINS") {
        split_origins(&list)
    } else if let Ok(origin) = env::var("FRONTEND_ORIGIN") {
        split_origins(&origin)
    } else {
        vec!["http://localhost:3000".to_string()]
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|item| {
            let trimmed = item.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

fn parse_duration_seconds(key: &str, default: u64) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default))
}

/// `BTC-CLP=50000000,ETH-CLP=3000000`. Malformed or non-positive entries are
/// dropped.
pub fn parse_static_prices(raw: &str) -> HashMap<String, f64> {
    raw.split(',')
        .filter_map(|item| {
            let (market_id, value) = item.split_once('=')?;
            let price = value.trim().parse::<f64>().ok()?;
            let market_id = market_id.trim().to_uppercase();
            if market_id.is_empty() || !price.is_finite() || price <= 0.0 {
                return None;
            }
            Some((market_id, price))
        })
        .collect()
}
