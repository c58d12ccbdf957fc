use alphavantage_client::{FetchClient, OutputSize};
use anyhow::{Context, Result};

use crate::engine::BacktestEngine;
use crate::models::BacktestResult;

/// Fetch the full daily history of `ticker` and replay it.
pub async fn backtest_ticker(
    engine: &BacktestEngine,
    client: &FetchClient,
    ticker: &str,
) -> Result<BacktestResult> {
    let bars = client
        .daily_series(ticker, OutputSize::Full)
        .await
        .with_context(|| format!("daily series for {}", ticker))?;
    tracing::info!("Backtest {}: replaying {} sessions", ticker, bars.len());

    let result = engine
        .run(ticker, &bars)
        .with_context(|| format!("replay of {}", ticker))?;
    Ok(result)
}
