use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// One validated portfolio entry. `symbol` is kept as the caller wrote it.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub symbol: String,
    pub amount: f64,
}

/// Validated holdings in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Portfolio {
    pub holdings: Vec<Holding>,
}

impl Portfolio {
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }
}

/// Last traded price per market id (`"BTC-CLP"`), fetched fresh per request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSnapshot {
    prices: HashMap<String, f64>,
}

impl PriceSnapshot {
    pub fn new(prices: HashMap<String, f64>) -> Self {
        Self { prices }
    }

    pub fn price(&self, market_id: &str) -> Option<f64> {
        self.prices.get(market_id).copied()
    }

    pub fn market_ids(&self) -> impl Iterator<Item = &str> {
        self.prices.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.prices.iter().map(|(id, price)| (id.as_str(), *price))
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl FromIterator<(String, f64)> for PriceSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct ValuationLine {
    pub symbol: String,
    pub amount: f64,
    pub price: f64,
    pub value: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct ValuationResult {
    pub total: f64,
    pub fiat_currency: String,
    pub details: Vec<ValuationLine>,
}

/// Body of `POST /api/v1/portfolios/value`.
///
/// Amounts stay loosely typed here; the engine rejects anything that is not a
/// positive number before pricing.
#[derive(Debug, Serialize, Deserialize, Clone, Default, ToSchema)]
pub struct ValuationRequest {
    #[serde(default)]
    #[schema(value_type = Object)]
    pub portfolio: Option<Map<String, Value>>,
    #[serde(default)]
    pub fiat_currency: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
