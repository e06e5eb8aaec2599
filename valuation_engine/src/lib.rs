use std::{collections::HashSet, sync::Arc};

use domain::{Holding, Portfolio, PriceSnapshot, ValuationLine, ValuationResult};
use market_data::{MarketDataError, MarketDataSource};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValuationError {
    #[error("{0}")]
    Validation(String),
    #[error("mercado '{0}' no disponible en Buda")]
    MarketNotFound(String),
    #[error(transparent)]
    MarketData(#[from] MarketDataError),
}

pub type ValuationOutcome<T> = Result<T, ValuationError>;

/// Validate -> fetch snapshot -> check fiat -> price every line -> total.
/// The first failing stage ends the request.
#[derive(Clone)]
pub struct PortfolioValuation {
    source: Arc<dyn MarketDataSource>,
}

impl PortfolioValuation {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self { source }
    }

    pub async fn value(
        &self,
        portfolio: &Map<String, Value>,
        fiat_currency: Option<&str>,
    ) -> ValuationOutcome<ValuationResult> {
        let fiat = normalize_fiat(fiat_currency)?;
        let portfolio = parse_portfolio(portfolio)?;
        let snapshot = self.source.fetch_prices().await?;
        let result = compute_valuation(&portfolio, &fiat, &snapshot)?;
        info!(
            fiat = %result.fiat_currency,
            lines = result.details.len(),
            total = result.total,
            "portfolio valued"
        );
        Ok(result)
    }
}

pub fn normalize_fiat(fiat_currency: Option<&str>) -> ValuationOutcome<String> {
    let fiat = fiat_currency.unwrap_or_default().trim().to_uppercase();
    if fiat.is_empty() {
        return Err(ValuationError::Validation(
            "fiat_currency es requerido".to_string(),
        ));
    }
    Ok(fiat)
}

/// Turns the loosely typed request map into holdings, reporting the first bad
/// entry in input order. Amounts must be JSON numbers, finite and above zero.
pub fn parse_portfolio(raw: &Map<String, Value>) -> ValuationOutcome<Portfolio> {
    if raw.is_empty() {
        return Err(ValuationError::Validation(
            "portfolio es requerido".to_string(),
        ));
    }

    let mut holdings = Vec::with_capacity(raw.len());
    for (symbol, amount) in raw {
        if symbol.trim().is_empty() {
            return Err(ValuationError::Validation(
                "símbolo en portfolio no puede estar vacío".to_string(),
            ));
        }
        let amount = amount
            .as_f64()
            .filter(|value| value.is_finite() && *value > 0.0)
            .ok_or_else(|| {
                ValuationError::Validation(format!(
                    "cantidad de '{symbol}' en portfolio debe ser mayor a 0"
                ))
            })?;
        holdings.push(Holding {
            symbol: symbol.clone(),
            amount,
        });
    }

    Ok(Portfolio { holdings })
}

/// Fiat codes quoted by at least one market: the segment after the last `-`.
pub fn available_fiats(snapshot: &PriceSnapshot) -> HashSet<&str> {
    snapshot
        .market_ids()
        .filter_map(|market_id| market_id.rsplit('-').next())
        .collect()
}

pub fn market_id(symbol: &str, fiat: &str) -> String {
    format!("{}-{}", symbol.trim().to_uppercase(), fiat)
}

/// Prices an already validated portfolio against `snapshot`. `fiat` must be
/// normalized.
pub fn compute_valuation(
    portfolio: &Portfolio,
    fiat: &str,
    snapshot: &PriceSnapshot,
) -> ValuationOutcome<ValuationResult> {
    if !available_fiats(snapshot).contains(fiat) {
        return Err(ValuationError::Validation(format!(
            "fiat '{fiat}' no disponible en Buda"
        )));
    }

    let mut details = Vec::with_capacity(portfolio.len());
    for holding in &portfolio.holdings {
        let symbol = holding.symbol.trim().to_uppercase();
        let market = market_id(&symbol, fiat);
        let price = snapshot
            .price(&market)
            .ok_or(ValuationError::MarketNotFound(market))?;
        details.push(ValuationLine {
            symbol,
            amount: holding.amount,
            price,
            value: holding.amount * price,
        });
    }

    let total = details.iter().map(|line| line.value).sum();
    Ok(ValuationResult {
        total,
        fiat_currency: fiat.to_string(),
        details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use market_data::{MarketDataResult, StaticMarketData};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn portfolio(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn clp_source() -> Arc<StaticMarketData> {
        Arc::new(StaticMarketData::from_pairs([
            ("BTC-CLP", 50_000_000.0),
            ("ETH-CLP", 3_000_000.0),
            ("BTC-USDC", 60_000.0),
        ]))
    }

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketDataSource for CountingSource {
        async fn fetch_prices(&self) -> MarketDataResult<PriceSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(MarketDataError::new("timeout"))
        }
    }

    #[tokio::test]
    async fn values_btc_and_eth_in_clp() {
        let engine = PortfolioValuation::new(clp_source());
        let result = engine
            .value(&portfolio(json!({"BTC": 0.5, "ETH": 2.0})), Some("CLP"))
            .await
            .expect("valuation");

        assert_eq!(result.fiat_currency, "CLP");
        assert_eq!(result.total, 31_000_000.0);
        assert_eq!(
            result.details,
            vec![
                ValuationLine {
                    symbol: "BTC".to_string(),
                    amount: 0.5,
                    price: 50_000_000.0,
                    value: 25_000_000.0,
                },
                ValuationLine {
                    symbol: "ETH".to_string(),
                    amount: 2.0,
                    price: 3_000_000.0,
                    value: 6_000_000.0,
                },
            ]
        );
    }

    #[tokio::test]
    async fn normalizes_symbol_and_fiat() {
        let engine = PortfolioValuation::new(clp_source());
        let result = engine
            .value(&portfolio(json!({" btc ": 1})), Some(" clp "))
            .await
            .expect("valuation");
        assert_eq!(result.fiat_currency, "CLP");
        assert_eq!(result.details[0].symbol, "BTC");
        assert_eq!(result.total, 50_000_000.0);
    }

    #[tokio::test]
    async fn details_follow_input_order() {
        let engine = PortfolioValuation::new(clp_source());
        let result = engine
            .value(&portfolio(json!({"ETH": 1, "BTC": 1})), Some("CLP"))
            .await
            .expect("valuation");
        let symbols: Vec<_> = result.details.iter().map(|l| l.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ETH", "BTC"]);
    }

    #[tokio::test]
    async fn missing_market_is_reported_by_id() {
        let engine = PortfolioValuation::new(clp_source());
        let err = engine
            .value(&portfolio(json!({"NOCOIN": 1.0})), Some("CLP"))
            .await
            .unwrap_err();
        assert_eq!(err, ValuationError::MarketNotFound("NOCOIN-CLP".to_string()));
        assert_eq!(err.to_string(), "mercado 'NOCOIN-CLP' no disponible en Buda");
    }

    #[tokio::test]
    async fn first_missing_market_wins() {
        let engine = PortfolioValuation::new(clp_source());
        let err = engine
            .value(
                &portfolio(json!({"BTC": 1, "AAA": 1, "ZZZ": 1})),
                Some("CLP"),
            )
            .await
            .unwrap_err();
        assert_eq!(err, ValuationError::MarketNotFound("AAA-CLP".to_string()));
    }

    #[tokio::test]
    async fn unknown_fiat_is_a_validation_error() {
        let engine = PortfolioValuation::new(clp_source());
        let err = engine
            .value(&portfolio(json!({"BTC": 1.0})), Some("usd"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ValuationError::Validation("fiat 'USD' no disponible en Buda".to_string())
        );
    }

    #[tokio::test]
    async fn shape_errors_skip_the_exchange() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let engine = PortfolioValuation::new(source.clone());

        let err = engine
            .value(&portfolio(json!({"BTC": 0})), Some("CLP"))
            .await
            .unwrap_err();
        assert!(matches!(err, ValuationError::Validation(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        let err = engine
            .value(&portfolio(json!({"BTC": 1})), Some("CLP"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "error en API de Buda: timeout");
        assert!(matches!(err, ValuationError::MarketData(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn blank_fiat_is_required() {
        for fiat in [None, Some(""), Some("   ")] {
            assert_eq!(
                normalize_fiat(fiat),
                Err(ValuationError::Validation(
                    "fiat_currency es requerido".to_string()
                ))
            );
        }
    }

    #[test]
    fn empty_portfolio_is_required() {
        let err = parse_portfolio(&Map::new()).unwrap_err();
        assert_eq!(err.to_string(), "portfolio es requerido");
    }

    #[test]
    fn blank_symbol_is_rejected() {
        let err = parse_portfolio(&portfolio(json!({"  ": 1.0}))).unwrap_err();
        assert_eq!(err.to_string(), "símbolo en portfolio no puede estar vacío");
    }

    #[test]
    fn non_positive_or_non_numeric_amounts_are_rejected() {
        for amount in [json!(-1), json!(0), json!(0.0), json!("1.5"), json!(null), json!(true)] {
            let err = parse_portfolio(&portfolio(json!({"BTC": amount}))).unwrap_err();
            assert_eq!(
                err.to_string(),
                "cantidad de 'BTC' en portfolio debe ser mayor a 0"
            );
        }
    }

    #[test]
    fn first_offending_entry_is_reported() {
        let err = parse_portfolio(&portfolio(json!({"BTC": 1, "ETH": -2, "SOL": 0})))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "cantidad de 'ETH' en portfolio debe ser mayor a 0"
        );
    }

    #[test]
    fn fiats_come_from_market_suffixes() {
        let snapshot: PriceSnapshot = [
            ("BTC-CLP".to_string(), 1.0),
            ("ETH-BTC".to_string(), 1.0),
            ("USDC-USDT-COP".to_string(), 1.0),
        ]
        .into_iter()
        .collect();
        let fiats = available_fiats(&snapshot);
        assert_eq!(fiats, HashSet::from(["CLP", "BTC", "COP"]));
    }

    #[test]
    fn total_is_plain_sum_of_line_values() {
        let snapshot: PriceSnapshot = [
            ("BTC-PEN".to_string(), 250_000.5),
            ("ETH-PEN".to_string(), 12_000.25),
        ]
        .into_iter()
        .collect();
        let parsed = parse_portfolio(&portfolio(json!({"BTC": 0.1, "ETH": 3.3}))).expect("valid");
        let result = compute_valuation(&parsed, "PEN", &snapshot).expect("valuation");
        let expected: f64 = result.details.iter().map(|l| l.amount * l.price).sum();
        assert_eq!(result.total, expected);
    }
}
