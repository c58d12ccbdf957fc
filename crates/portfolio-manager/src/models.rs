use analysis_core::Candidate;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Active,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    pub ticker: String,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub target_price: Option<Decimal>,
    pub stop_loss_price: Option<Decimal>,
    pub reason: String,
    pub open_date: DateTime<Utc>,
    pub status: PositionStatus,
    pub close_price: Option<Decimal>,
    pub close_date: Option<DateTime<Utc>>,
    /// Realised P&L, rounded to cents
    pub pnl: Option<Decimal>,
    pub pnl_percent: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionInput {
    pub ticker: String,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub reason: String,
    pub target_price: Option<Decimal>,
    pub stop_loss_price: Option<Decimal>,
}

/// Everything a dashboard needs in one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioState {
    pub dream_team: Vec<Candidate>,
    pub open_positions: Vec<Position>,
    pub closed_positions: Vec<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CockpitAnalytics {
    pub total_pnl: Decimal,
    pub win_rate: Decimal, // 0-100 percentage, 1 dp
    pub total_trades: usize,
    /// `None` when there are no losing trades
    pub profit_factor: Option<Decimal>,
    pub avg_profit: Decimal,
    pub avg_loss: Decimal,
}

impl CockpitAnalytics {
    /// Profit factor for display: "∞" with winners only, "N/A" with no trades
    pub fn profit_factor_label(&self) -> String {
        match self.profit_factor {
            Some(pf) => pf.to_string(),
            None if self.total_trades > 0 => "∞".to_string(),
            None => "N/A".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationLevel {
    VeryHigh,
    High,
    Moderate,
    Low,
    Negative,
    NoData,
}

impl std::fmt::Display for CorrelationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CorrelationLevel::VeryHigh => "Very high",
            CorrelationLevel::High => "High",
            CorrelationLevel::Moderate => "Moderate",
            CorrelationLevel::Low => "Low",
            CorrelationLevel::Negative => "Negative (diversifying)",
            CorrelationLevel::NoData => "No data",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairCorrelation {
    pub ticker_a: String,
    pub ticker_b: String,
    pub correlation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    /// Rounded to 2 dp
    pub average_correlation: f64,
    pub level: CorrelationLevel,
    pub summary: String,
    pub warnings: Vec<String>,
    pub pairs: Vec<PairCorrelation>,
}
