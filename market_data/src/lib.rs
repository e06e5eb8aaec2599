use async_trait::async_trait;
use domain::PriceSnapshot;
use thiserror::Error;

/// Any failure talking to the exchange: transport, status or payload.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("error en API de Buda: {message}")]
pub struct MarketDataError {
    message: String,
}

impl MarketDataError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type MarketDataResult<T> = Result<T, MarketDataError>;

#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Current last price of every market the exchange lists.
    async fn fetch_prices(&self) -> MarketDataResult<PriceSnapshot>;
}

/// Serves the same snapshot on every call. Used for offline runs and tests.
#[derive(Clone, Default)]
pub struct StaticMarketData {
    snapshot: PriceSnapshot,
}

impl StaticMarketData {
    pub fn new(snapshot: PriceSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(market_id, price)| (market_id.into(), price))
                .collect(),
        )
    }
}

#[async_trait]
impl MarketDataSource for StaticMarketData {
    async fn fetch_prices(&self) -> MarketDataResult<PriceSnapshot> {
        Ok(self.snapshot.clone())
    }
}
