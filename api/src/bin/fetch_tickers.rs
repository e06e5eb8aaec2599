use api::{bootstrap::build_state, config::AppConfig, telemetry};

/// Prints one price snapshot from the configured source, sorted by market.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing()?;
    let config = AppConfig::from_env()?;
    let state = build_state(&config)?;

    let snapshot = state.market_data.fetch_prices().await?;
    let mut markets: Vec<_> = snapshot.iter().collect();
    markets.sort_by(|a, b| a.0.cmp(b.0));

    for (market_id, price) in markets {
        tracing::info!(%market_id, price, "ticker");
    }
    tracing::info!(markets = snapshot.len(), "snapshot fetched");

    Ok(())
}
