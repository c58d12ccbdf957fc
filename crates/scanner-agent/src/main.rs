use std::sync::Arc;

use alphavantage_client::FetchClient;
use anyhow::{Context, Result};
use market_scanner::{
    load_universe, DriverExit, ScanController, ScanDriver, ScanState, ScanStepExecutor,
    WatchlistStore,
};
use tokio::signal::unix::SignalKind;
use tokio_util::sync::CancellationToken;

mod config;
mod metrics;
mod report;

use config::AgentConfig;
use metrics::AgentMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env, init tracing
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));

    tracing::info!("Starting penny stock scanner agent");

    // 2. Configuration
    let config = AgentConfig::from_env()?;
    tracing::info!("Configuration loaded and validated");
    tracing::info!("  API key: {}", config.client.masked_key());
    tracing::info!(
        "  Rate limit: {} requests/min, cache TTL {}s",
        config.client.requests_per_minute,
        config.client.cache_ttl.as_secs()
    );
    tracing::info!(
        "  Prefilter: price <= ${}, volume > {}",
        config.scan.max_price,
        config.scan.min_volume
    );
    tracing::info!(
        "  Batch size {} every {}s, quorum {}",
        config.scan.batch_size,
        config.scan.step_interval.as_secs(),
        config.scan.vote_quorum
    );

    // 3. Shared components, built once and handed down
    let client = Arc::new(FetchClient::new(&config.client)?);
    let watchlist = WatchlistStore::new();
    let controller = ScanController::new(ScanState::new().shared());

    // 4. Universe
    let universe = match &config.universe_override {
        Some(tickers) => {
            tracing::info!("Using SCAN_UNIVERSE override ({} tickers)", tickers.len());
            tickers.clone()
        }
        None => load_universe(&client, &config.scan.exchange)
            .await
            .context("Failed to load the ticker universe")?,
    };

    let mode = controller
        .start(universe)
        .await
        .context("Failed to start the scan")?;
    tracing::info!("Scan started ({:?})", mode);

    // 5. Driver
    let executor = Arc::new(ScanStepExecutor::new(
        client.clone(),
        config.scan.clone(),
        watchlist.clone(),
    ));
    let cancel = CancellationToken::new();
    let mut driver = ScanDriver::new(executor, controller.state().clone())
        .stop_when_completed()
        .spawn(cancel.clone());

    let mut sigterm = tokio::signal::unix::signal(SignalKind::terminate())?;
    let shutdown = async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("Received SIGINT"),
            _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
        }
    };
    tokio::pin!(shutdown);

    let mut metrics = AgentMetrics::new();
    let scan_start = AgentMetrics::start_timer();

    let exit = tokio::select! {
        exit = &mut driver => exit.context("Scan driver task panicked")?,
        _ = &mut shutdown => {
            tracing::info!("Shutting down, pausing scan");
            controller.pause().await;
            cancel.cancel();
            driver.await.context("Scan driver task panicked")?
        }
    };
    metrics.record_scan_duration(scan_start);

    match exit {
        DriverExit::Completed => {
            let status = controller.status().await;
            tracing::info!(
                "Scan completed: {} tickers, {} candidates",
                status.total,
                status.candidates.len()
            );
        }
        DriverExit::Cancelled => {
            let status = controller.status().await;
            tracing::info!(
                "Scan paused at {}/{} tickers, progress retained",
                status.processed,
                status.total
            );
            metrics.network_calls = client.network_calls();
            metrics.log_metrics();
            return Ok(());
        }
        DriverExit::Failed(e) => {
            tracing::error!("Scan aborted: {}", e);
            let saved = report::publish_saved_candidates(&controller, &watchlist).await;
            tracing::info!("Reporting on {} candidates saved before the failure", saved);
        }
    }

    // 6. Reports over the published watch-list
    let report_start = AgentMetrics::start_timer();
    report::log_reports(&config, &client, &watchlist, &mut metrics).await;
    metrics.record_report_duration(report_start);

    metrics.network_calls = client.network_calls();
    if metrics.backtests_run > 0 {
        tracing::info!(
            "Backtests: {:.0}% succeeded",
            metrics.backtest_success_rate()
        );
    }
    metrics.log_metrics();

    tracing::info!("Scanner agent finished");
    Ok(())
}
