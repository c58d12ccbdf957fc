//! Market climate from the federal funds rate and CPI.

use alphavantage_client::{EconomicSeries, FetchClient};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClimateStatus {
    VeryFavourable,
    Favourable,
    Moderate,
    Caution,
    NoData,
}

impl std::fmt::Display for ClimateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ClimateStatus::VeryFavourable => "Very favourable",
            ClimateStatus::Favourable => "Favourable",
            ClimateStatus::Moderate => "Moderate",
            ClimateStatus::Caution => "Caution",
            ClimateStatus::NoData => "No data",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroClimate {
    pub status: ClimateStatus,
    pub summary: String,
    pub fed_rate: Option<f64>,
    pub cpi: Option<f64>,
}

/// Classify the latest readings. CPI alone never decides the climate.
pub fn assess_climate(fed_rate: Option<f64>, cpi: Option<f64>) -> MacroClimate {
    let (status, summary) = match (fed_rate, cpi) {
        (Some(rate), Some(cpi)) if rate < 2.0 && cpi < 3.0 => (
            ClimateStatus::VeryFavourable,
            "Low rates and contained inflation make for excellent equity conditions.",
        ),
        (Some(rate), Some(cpi)) if rate < 3.5 && cpi < 4.5 => (
            ClimateStatus::Moderate,
            "Macro conditions are stable but call for vigilance around volatility.",
        ),
        (Some(_), Some(_)) => (
            ClimateStatus::Caution,
            "Elevated rates or inflation may put pressure on equities.",
        ),
        (Some(rate), None) if rate < 2.5 => (
            ClimateStatus::Favourable,
            "Low interest rates support the equity market.",
        ),
        _ => (
            ClimateStatus::NoData,
            "Macro data could not be retrieved.",
        ),
    };

    MacroClimate {
        status,
        summary: summary.to_string(),
        fed_rate,
        cpi,
    }
}

/// Fetch both series concurrently and classify them. A failed fetch is
/// treated as a missing reading.
pub async fn macro_climate(client: &FetchClient) -> MacroClimate {
    let (rate, cpi) = tokio::join!(
        client.economic_indicator(EconomicSeries::FederalFundsRate),
        client.economic_indicator(EconomicSeries::Cpi),
    );

    let fed_rate = match rate {
        Ok(observation) => Some(observation.value),
        Err(e) => {
            tracing::warn!("Federal funds rate unavailable: {}", e);
            None
        }
    };
    let cpi = match cpi {
        Ok(observation) => Some(observation.value),
        Err(e) => {
            tracing::warn!("CPI unavailable: {}", e);
            None
        }
    };

    let climate = assess_climate(fed_rate, cpi);
    tracing::info!("Macro climate: {}", climate.status);
    climate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_readings() {
        assert_eq!(assess_climate(Some(1.5), Some(2.5)).status, ClimateStatus::VeryFavourable);
        assert_eq!(assess_climate(Some(3.0), Some(4.0)).status, ClimateStatus::Moderate);
        assert_eq!(assess_climate(Some(1.5), Some(4.0)).status, ClimateStatus::Moderate);
        assert_eq!(assess_climate(Some(5.3), Some(3.1)).status, ClimateStatus::Caution);
        assert_eq!(assess_climate(Some(2.0), Some(5.0)).status, ClimateStatus::Caution);
    }

    #[test]
    fn test_rate_only() {
        assert_eq!(assess_climate(Some(2.0), None).status, ClimateStatus::Favourable);
        assert_eq!(assess_climate(Some(3.0), None).status, ClimateStatus::NoData);
    }

    #[test]
    fn test_no_usable_data() {
        let climate = assess_climate(None, Some(2.0));
        assert_eq!(climate.status, ClimateStatus::NoData);
        assert_eq!(climate.cpi, Some(2.0));
        assert_eq!(assess_climate(None, None).status, ClimateStatus::NoData);
    }
}
