use std::collections::BTreeMap;

use alphavantage_client::{FetchClient, OutputSize};
use analysis_core::DailyBar;
use chrono::NaiveDate;

use crate::models::{CorrelationLevel, PairCorrelation, RiskReport};
use crate::shared_math::{recent_closes, returns_correlation, CORRELATION_LOOKBACK};

pub struct CorrelationRisk;

impl CorrelationRisk {
    /// Concentration risk from pairwise return correlations.
    ///
    /// `series` holds one daily series per ticker in any order; empty series
    /// are ignored.
    pub fn analyze(series: &[(String, Vec<DailyBar>)]) -> RiskReport {
        if series.len() < 2 {
            return Self::no_data("At least two holdings are needed for a correlation analysis.");
        }

        let closes: Vec<(&str, BTreeMap<NaiveDate, f64>)> = series
            .iter()
            .filter(|(_, bars)| !bars.is_empty())
            .map(|(ticker, bars)| (ticker.as_str(), recent_closes(bars, CORRELATION_LOOKBACK)))
            .collect();
        if closes.len() < 2 {
            return Self::no_data("Not enough price history for a correlation analysis.");
        }

        let mut pairs = Vec::new();
        let mut warnings = Vec::new();
        for (i, (ticker_a, closes_a)) in closes.iter().enumerate() {
            for (ticker_b, closes_b) in &closes[i + 1..] {
                let correlation = returns_correlation(closes_a, closes_b);
                if correlation > 0.8 {
                    warnings.push(format!(
                        "High correlation ({:.2}) between {} and {}. Concentration risk.",
                        correlation, ticker_a, ticker_b
                    ));
                } else if correlation < -0.6 {
                    warnings.push(format!(
                        "Strong negative correlation ({:.2}) between {} and {}. May provide diversification.",
                        correlation, ticker_a, ticker_b
                    ));
                }
                pairs.push(PairCorrelation {
                    ticker_a: ticker_a.to_string(),
                    ticker_b: ticker_b.to_string(),
                    correlation,
                });
            }
        }

        let average = pairs.iter().map(|p| p.correlation).sum::<f64>() / pairs.len() as f64;
        let level = Self::classify(average);

        let mut summary = format!(
            "Average portfolio correlation: {:.2}. {} correlation level.",
            average, level
        );
        if average > 0.6 {
            summary.push_str(" Diversification recommended.");
        } else if average < -0.4 {
            summary.push_str(" Portfolio is well diversified.");
        }

        tracing::info!("Correlation risk: average {:.2} ({})", average, level);

        RiskReport {
            average_correlation: (average * 100.0).round() / 100.0,
            level,
            summary,
            warnings,
            pairs,
        }
    }

    pub fn classify(average: f64) -> CorrelationLevel {
        if average > 0.7 {
            CorrelationLevel::VeryHigh
        } else if average > 0.5 {
            CorrelationLevel::High
        } else if average > 0.3 {
            CorrelationLevel::Moderate
        } else if average > -0.3 {
            CorrelationLevel::Low
        } else {
            CorrelationLevel::Negative
        }
    }

    fn no_data(summary: &str) -> RiskReport {
        RiskReport {
            average_correlation: 0.0,
            level: CorrelationLevel::NoData,
            summary: summary.to_string(),
            warnings: Vec::new(),
            pairs: Vec::new(),
        }
    }
}

/// Fetch recent daily series for `tickers` and analyse their correlation.
/// Tickers whose series cannot be fetched are left out.
pub async fn portfolio_risk(client: &FetchClient, tickers: &[String]) -> RiskReport {
    if tickers.len() < 2 {
        return CorrelationRisk::analyze(&[]);
    }

    let mut series = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        match client.daily_series(ticker, OutputSize::Compact).await {
            Ok(bars) => series.push((ticker.clone(), bars)),
            Err(e) => tracing::warn!("Risk analysis: skipping {}: {}", ticker, e),
        }
    }
    CorrelationRisk::analyze(&series)
}
