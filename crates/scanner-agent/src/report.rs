//! Post-scan analysis of the published watch-list.

use alphavantage_client::FetchClient;
use backtest_engine::{backtest_ticker, BacktestEngine};
use league_analysis::{macro_climate, run_golden_league, run_quick_league};
use market_scanner::{ScanController, WatchlistStore};
use portfolio_manager::portfolio_risk;

use crate::config::AgentConfig;
use crate::metrics::AgentMetrics;

/// Publish the candidates saved so far, for a scan that stopped before
/// completing. Returns how many were published.
pub async fn publish_saved_candidates(
    controller: &ScanController,
    watchlist: &WatchlistStore,
) -> usize {
    let candidates = controller.status().await.candidates;
    let count = candidates.len();
    watchlist.publish(candidates).await;
    count
}

/// Log the watch-list and the macro climate, then the league reports, the
/// correlation risk of the dream team and backtests of the golden leaders.
pub async fn log_reports(
    config: &AgentConfig,
    client: &FetchClient,
    watchlist: &WatchlistStore,
    metrics: &mut AgentMetrics,
) {
    let candidates = watchlist.get_candidates().await;
    metrics.candidates = candidates.len();
    tracing::info!("Dream team: {} candidates", candidates.len());
    for c in &candidates {
        tracing::info!(
            "  {} @ ${:.4} score {}/{} [{}] volume {:.0}",
            c.ticker,
            c.price,
            c.score,
            c.metadata.max_score,
            c.metadata.signals.join(", "),
            c.metadata.volume
        );
    }

    let climate = macro_climate(client).await;
    tracing::info!("Macro climate: {} ({})", climate.status, climate.summary);

    if candidates.is_empty() {
        tracing::info!("Watch-list is empty, skipping league reports");
        return;
    }

    let tickers = watchlist.tickers().await;

    let quick = run_quick_league(client, &tickers, &config.quick_league).await;
    metrics.quick_opportunities = quick.len();
    tracing::info!("Quick league: {} opportunities", quick.len());
    for opp in &quick {
        tracing::info!(
            "  {} {} entry {:.4} target {:.4} stop {:.4} score {}/3",
            opp.ticker,
            opp.signal,
            opp.plan.entry,
            opp.plan.target,
            opp.plan.stop_loss,
            opp.score
        );
    }

    let golden = run_golden_league(client, &tickers).await;
    metrics.golden_scored = golden.len();
    tracing::info!("Golden league: {} tickers scored", golden.len());
    for score in &golden {
        tracing::info!(
            "  {} composite {:.1} (technical {}, fundamental {}, quant {}, sentinel {})",
            score.ticker,
            score.composite(),
            score.technical,
            score.fundamental,
            score.quant,
            score.sentinel
        );
    }

    let risk = portfolio_risk(client, &tickers).await;
    tracing::info!("Correlation risk: {} ({})", risk.level, risk.summary);
    for warning in &risk.warnings {
        tracing::warn!("  {}", warning);
    }

    let engine = BacktestEngine::new(config.backtest.clone());
    for score in golden.iter().take(config.backtest_top_n) {
        match backtest_ticker(&engine, client, &score.ticker).await {
            Ok(result) => {
                metrics.record_backtest(true);
                tracing::info!(
                    "Backtest {}: {} trades, return {:.2}% vs buy-and-hold {:.2}% (alpha {:.2})",
                    result.ticker,
                    result.total_trades,
                    result.total_return_percent,
                    result.buy_and_hold.pnl_percent,
                    result.alpha()
                );
                tracing::info!(
                    "  win rate {:.1}%, max drawdown {:.2}%",
                    result.win_rate,
                    result.max_drawdown
                );
            }
            Err(e) => {
                metrics.record_backtest(false);
                tracing::warn!("Backtest {} failed: {:#}", score.ticker, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{Candidate, CandidateMetadata};
    use chrono::Utc;

    fn candidate(ticker: &str) -> Candidate {
        Candidate {
            ticker: ticker.to_string(),
            price: 1.8,
            score: 2,
            metadata: CandidateMetadata {
                signals: vec!["momentum".to_string(), "volatility".to_string()],
                max_score: 3,
                change_percent: None,
                volume: 300_000.0,
                qualified_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn test_saved_candidates_reach_the_watchlist() {
        let controller = ScanController::default();
        let watchlist = WatchlistStore::new();
        controller
            .start(vec!["AAA".into(), "BBB".into(), "CCC".into()])
            .await
            .unwrap();
        controller
            .state()
            .write()
            .await
            .save_progress(Some(1), vec![candidate("AAA")], vec![])
            .unwrap();
        assert!(watchlist.is_empty().await);

        let published = publish_saved_candidates(&controller, &watchlist).await;
        assert_eq!(published, 1);
        assert_eq!(watchlist.tickers().await, vec!["AAA".to_string()]);
        // The scan itself is left as it was
        assert!(controller.is_active().await);
        assert!(!controller.is_completed().await);
    }
}
