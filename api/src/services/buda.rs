use std::time::Duration;

use async_trait::async_trait;
use domain::PriceSnapshot;
use market_data::{MarketDataError, MarketDataResult, MarketDataSource};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct TickersResponse {
    tickers: Vec<Ticker>,
}

#[derive(Debug, Deserialize)]
struct Ticker {
    market_id: String,
    last_price: Vec<Value>,
}

/// Public ticker list of the Buda exchange. One GET per snapshot, no retries.
#[derive(Clone)]
pub struct BudaClient {
    client: Client,
    api_base: String,
}

impl BudaClient {
    /// `timeout` bounds both the connect and the whole response.
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> MarketDataResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|err| MarketDataError::new(err.to_string()))?;
        let api_base: String = api_base.into();
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_tickers(&self) -> Result<TickersResponse, reqwest::Error> {
        let url = format!("{}/tickers", self.api_base);
        debug!(%url, "requesting tickers");
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<TickersResponse>()
            .await
    }
}

#[async_trait]
impl MarketDataSource for BudaClient {
    async fn fetch_prices(&self) -> MarketDataResult<PriceSnapshot> {
        let body = self.fetch_tickers().await.map_err(|err| {
            warn!(%err, "buda tickers request failed");
            MarketDataError::new(err.to_string())
        })?;

        let snapshot = body
            .tickers
            .into_iter()
            .map(|ticker| {
                let price = last_price(&ticker)?;
                Ok((ticker.market_id, price))
            })
            .collect::<MarketDataResult<PriceSnapshot>>()
            .inspect_err(|err| warn!(%err, "buda tickers payload rejected"))?;

        debug!(markets = snapshot.len(), "tickers loaded");
        Ok(snapshot)
    }
}

fn last_price(ticker: &Ticker) -> MarketDataResult<f64> {
    let price = match ticker.last_price.first() {
        Some(Value::String(raw)) => raw.trim().parse::<f64>().ok(),
        Some(Value::Number(number)) => number.as_f64(),
        _ => None,
    };
    price.filter(|p| p.is_finite()).ok_or_else(|| {
        MarketDataError::new(format!(
            "last_price inválido para el mercado '{}'",
            ticker.market_id
        ))
    })
}
