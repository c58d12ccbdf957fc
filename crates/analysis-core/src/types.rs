use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One daily OHLCV session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Latest quote snapshot for a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub volume: f64,
    pub change_percent: Option<f64>,
    pub latest_trading_day: Option<NaiveDate>,
}

/// Single dated value of a provider-computed indicator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Indicator values ordered newest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub name: String,
    pub points: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn new(name: impl Into<String>, mut points: Vec<IndicatorPoint>) -> Self {
        points.sort_by(|a, b| b.date.cmp(&a.date));
        Self {
            name: name.into(),
            points,
        }
    }

    /// Most recent value, if any
    pub fn latest(&self) -> Option<f64> {
        self.points.first().map(|p| p.value)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Everything the second-stage qualification signals look at for one ticker.
///
/// `daily` is ordered newest first, matching the provider's own ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalInputs {
    pub daily: Vec<DailyBar>,
    pub sma: IndicatorSeries,
    pub atr: IndicatorSeries,
}

impl SignalInputs {
    /// Close of the most recent session
    pub fn latest_close(&self) -> Option<f64> {
        self.daily.first().map(|b| b.close)
    }
}

/// Extra context recorded alongside a qualified ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMetadata {
    /// Names of the signals that voted for the ticker
    pub signals: Vec<String>,
    /// Number of signals consulted
    pub max_score: u32,
    pub change_percent: Option<f64>,
    pub volume: f64,
    pub qualified_at: DateTime<Utc>,
}

/// A ticker admitted to the watch-list by the scanner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub ticker: String,
    pub price: f64,
    pub score: u32,
    pub metadata: CandidateMetadata,
}

/// Fundamentals subset used by the golden league
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyOverview {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub pe_ratio: Option<f64>,
    pub price_to_book: Option<f64>,
    pub eps: Option<f64>,
    pub beta: Option<f64>,
}

/// Per-article sentiment scores for one ticker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsSentiment {
    pub symbol: String,
    pub scores: Vec<f64>,
}

/// One observation of a macro-economic series (rates, CPI)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomicObservation {
    pub date: NaiveDate,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_indicator_series_orders_newest_first() {
        let series = IndicatorSeries::new(
            "SMA",
            vec![
                IndicatorPoint {
                    date: day(1),
                    value: 1.0,
                },
                IndicatorPoint {
                    date: day(3),
                    value: 3.0,
                },
                IndicatorPoint {
                    date: day(2),
                    value: 2.0,
                },
            ],
        );
        assert_eq!(series.latest(), Some(3.0));
        assert_eq!(series.points.last().unwrap().value, 1.0);
    }

    #[test]
    fn test_empty_series_has_no_latest() {
        let series = IndicatorSeries::new("ATR", vec![]);
        assert!(series.is_empty());
        assert_eq!(series.latest(), None);
    }
}
