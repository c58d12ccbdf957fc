use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Configuration for a signal replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub initial_capital: Decimal,
    pub position_size_percent: f64, // 0-100
    pub commission_rate: Option<f64>, // as decimal, e.g. 0.001 = 0.1%
    /// Minimum signal votes to hold a position.
    pub vote_quorum: u32,
    pub sma_period: usize,
    pub atr_period: usize,
    /// Sessions of history required before the first decision.
    /// Defaults to the SMA period when not set.
    #[serde(default)]
    pub warmup: Option<usize>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: Decimal::new(10_000, 0),
            position_size_percent: 100.0,
            commission_rate: None,
            vote_quorum: 2,
            sma_period: 50,
            atr_period: 14,
            warmup: None,
        }
    }
}

impl BacktestConfig {
    pub fn warmup(&self) -> usize {
        self.warmup
            .unwrap_or(self.sma_period)
            .max(self.sma_period)
            .max(self.atr_period + 1)
    }
}

/// A round-trip trade (entry + exit) from the replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestTrade {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub shares: Decimal,
    pub profit_loss: Decimal,
    pub profit_loss_percent: f64,
    pub holding_period_days: i64,
    /// Signals that voted for the entry.
    pub entry_signals: Vec<String>,
    pub exit_reason: String,
}

/// A point on the equity curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: Decimal,
    pub drawdown_percent: f64,
}

/// First close to last close over the whole series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyAndHold {
    pub ticker: String,
    pub trade_count: u32,
    pub initial_price: f64,
    pub final_price: f64,
    pub total_pnl: f64,
    pub pnl_percent: f64,
    /// Number of sessions in the series.
    pub period_days: usize,
}

/// Result of a completed replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: Decimal,
    pub final_capital: Decimal,
    pub total_return: Decimal,
    pub total_return_percent: f64,
    pub total_trades: i32,
    pub winning_trades: i32,
    pub losing_trades: i32,
    pub win_rate: f64, // 0-100 percentage
    pub profit_factor: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown: f64,
    /// Sessions spent holding a position, as a percentage of decision sessions.
    pub exposure_time_percent: f64,
    pub total_commission_paid: Decimal,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<BacktestTrade>,
    pub buy_and_hold: BuyAndHold,
}

impl BacktestResult {
    /// Strategy return minus buy-and-hold return, in percentage points.
    pub fn alpha(&self) -> f64 {
        self.total_return_percent - self.buy_and_hold.pnl_percent
    }
}
