//! Quick league: short-term pullback setups on watch-list tickers.

use alphavantage_client::{FetchClient, FetchError, OutputSize};
use analysis_core::DailyBar;
use serde::{Deserialize, Serialize};

use crate::indicators::{fibonacci_levels, intraday_gain_pct};

/// Configuration for the quick league
#[derive(Debug, Clone)]
pub struct QuickLeagueConfig {
    /// Sessions searched for the swing high
    pub swing_period: usize,
    pub min_bars: usize,
    pub rsi_overbought: f64,
    pub slow_k_overbought: f64,
    /// Sessions checked for intraday momentum history
    pub history_lookback: usize,
    /// Open-to-high moves of at least 2% needed for the history point
    pub history_min_sessions: u32,
    pub min_reward_risk: f64,
}

impl Default for QuickLeagueConfig {
    fn default() -> Self {
        Self {
            swing_period: 30,
            min_bars: 10,
            rsi_overbought: 75.0,
            slow_k_overbought: 85.0,
            history_lookback: 90,
            history_min_sessions: 5,
            min_reward_risk: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradePlan {
    pub entry: f64,
    pub target: f64,
    pub stop_loss: f64,
}

impl TradePlan {
    /// Reward over risk, `None` unless both are positive
    pub fn reward_risk(&self) -> Option<f64> {
        let risk = self.entry - self.stop_loss;
        let reward = self.target - self.entry;
        if risk <= 0.0 || reward <= 0.0 {
            return None;
        }
        Some(reward / risk)
    }
}

/// Count of sessions whose open-to-high move reached each threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IntradayStats {
    pub above_1_5: u32,
    pub above_2_0: u32,
    pub above_3_0: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickOpportunity {
    pub ticker: String,
    pub signal: String,
    pub plan: TradePlan,
    pub stats: IntradayStats,
    /// 1 for the pullback plus confirmation and history points (max 3)
    pub score: u32,
}

/// Pullback into the 0.382-0.5 retracement band of the latest swing.
///
/// `daily` is newest first. The swing high is the highest high in the last
/// `period` sessions; the swing low is the lowest low from that session
/// backwards.
pub fn fibonacci_pullback(daily: &[DailyBar], period: usize, min_bars: usize) -> Option<TradePlan> {
    let window = &daily[..daily.len().min(period)];
    if window.len() < min_bars.max(1) {
        return None;
    }

    let (high_idx, high) = window
        .iter()
        .enumerate()
        .map(|(i, b)| (i, b.high))
        .fold((0, f64::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });
    let low = window[high_idx..]
        .iter()
        .map(|b| b.low)
        .fold(f64::MAX, f64::min);
    let current = window[0].close;

    if current >= high {
        return None;
    }

    let levels = fibonacci_levels(high, low);
    if current >= levels.level_500 && current <= levels.level_382 {
        Some(TradePlan {
            entry: current,
            target: high,
            stop_loss: levels.level_618,
        })
    } else {
        None
    }
}

/// 1 unless RSI or SlowK say the ticker is overbought. Missing data scores 0.
pub fn confirmation_score(
    rsi: Option<f64>,
    slow_k: Option<f64>,
    config: &QuickLeagueConfig,
) -> u32 {
    match (rsi, slow_k) {
        (Some(rsi), Some(k)) if rsi <= config.rsi_overbought && k <= config.slow_k_overbought => 1,
        _ => 0,
    }
}

/// Intraday momentum history over the most recent `lookback` sessions
pub fn intraday_history(daily: &[DailyBar], config: &QuickLeagueConfig) -> (u32, IntradayStats) {
    let mut stats = IntradayStats::default();
    for gain in daily
        .iter()
        .take(config.history_lookback)
        .filter_map(intraday_gain_pct)
    {
        if gain >= 3.0 {
            stats.above_3_0 += 1;
        }
        if gain >= 2.0 {
            stats.above_2_0 += 1;
        }
        if gain >= 1.5 {
            stats.above_1_5 += 1;
        }
    }
    let score = u32::from(stats.above_2_0 >= config.history_min_sessions);
    (score, stats)
}

/// Score one ticker from already-fetched data
pub fn evaluate(
    ticker: &str,
    daily: &[DailyBar],
    rsi: Option<f64>,
    slow_k: Option<f64>,
    config: &QuickLeagueConfig,
) -> Option<QuickOpportunity> {
    let plan = fibonacci_pullback(daily, config.swing_period, config.min_bars)?;
    let reward_risk = plan.reward_risk()?;
    if reward_risk < config.min_reward_risk {
        return None;
    }

    let (history, stats) = intraday_history(daily, config);
    Some(QuickOpportunity {
        ticker: ticker.to_string(),
        signal: "Fibonacci pullback".to_string(),
        plan,
        stats,
        score: 1 + confirmation_score(rsi, slow_k, config) + history,
    })
}

async fn analyze_ticker(
    client: &FetchClient,
    ticker: &str,
    config: &QuickLeagueConfig,
) -> Result<Option<QuickOpportunity>, FetchError> {
    let (daily, rsi, stoch) = tokio::join!(
        client.daily_series(ticker, OutputSize::Compact),
        client.rsi(ticker, 14),
        client.stoch(ticker),
    );
    let daily = daily?;
    Ok(evaluate(
        ticker,
        &daily,
        rsi.ok().and_then(|s| s.latest()),
        stoch.ok().and_then(|s| s.latest()),
        config,
    ))
}

/// Scan `tickers` for pullback setups. Tickers without a daily series are
/// logged and skipped; missing oscillators only cost the confirmation point.
pub async fn run_quick_league(
    client: &FetchClient,
    tickers: &[String],
    config: &QuickLeagueConfig,
) -> Vec<QuickOpportunity> {
    tracing::info!("Quick league: scanning {} tickers", tickers.len());
    let mut opportunities = Vec::new();

    for ticker in tickers {
        match analyze_ticker(client, ticker, config).await {
            Ok(Some(opportunity)) => opportunities.push(opportunity),
            Ok(None) => {}
            Err(e) => tracing::warn!("Quick league: skipping {}: {}", ticker, e),
        }
    }

    tracing::info!("Quick league: {} opportunities found", opportunities.len());
    opportunities
}
