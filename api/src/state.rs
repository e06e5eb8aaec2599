use std::sync::Arc;

use market_data::MarketDataSource;
use valuation_engine::PortfolioValuation;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub market_data: Arc<dyn MarketDataSource>,
    pub valuation: Arc<PortfolioValuation>,
}

impl AppState {
    pub fn new(config: AppConfig, market_data: Arc<dyn MarketDataSource>) -> Self {
        let valuation = Arc::new(PortfolioValuation::new(market_data.clone()));
        Self {
            config,
            market_data,
            valuation,
        }
    }
}

#[allow(dead_code)]
fn _assert_state_bounds() {
    fn assert_bounds<T: Clone + Send + Sync + 'static>() {}
    assert_bounds::<AppState>();
}
