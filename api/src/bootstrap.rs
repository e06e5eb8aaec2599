use std::sync::Arc;

use anyhow::Result;
use domain::PriceSnapshot;
use market_data::{MarketDataSource, StaticMarketData};

use crate::{config::AppConfig, services::BudaClient, state::AppState};

pub fn build_state(config: &AppConfig) -> Result<AppState> {
    let market_data: Arc<dyn MarketDataSource> = if config.static_prices.is_empty() {
        tracing::info!(
            api_base = %config.buda_api_base,
            timeout_secs = config.buda_timeout.as_secs(),
            "using buda market data"
        );
        Arc::new(BudaClient::new(
            config.buda_api_base.clone(),
            config.buda_timeout,
        )?)
    } else {
        tracing::info!(
            markets = config.static_prices.len(),
            "using static market data"
        );
        Arc::new(StaticMarketData::new(PriceSnapshot::new(
            config.static_prices.clone(),
        )))
    };

    Ok(AppState::new(config.clone(), market_data))
}
