use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },

    #[error("{0} must be greater than zero")]
    MustBePositive(&'static str),
}

/// Configuration for scanning
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Tickers evaluated per step
    pub batch_size: usize,
    /// Prefilter: upper bound of the price band (exclusive of zero)
    pub max_price: f64,
    /// Prefilter: volume must exceed this floor
    pub min_volume: f64,
    /// Votes needed for a ticker to qualify
    pub vote_quorum: u32,
    /// Driver cadence between steps
    pub step_interval: Duration,
    /// Listing filter for the universe loader
    pub exchange: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            max_price: 5.0,
            min_volume: 100_000.0,
            vote_quorum: 2,
            step_interval: Duration::from_secs(5),
            exchange: "NASDAQ".to_string(),
        }
    }
}

impl ScanConfig {
    pub fn from_env() -> Result<Self, ScanConfigError> {
        let defaults = Self::default();
        let config = Self {
            batch_size: env_or("SCAN_BATCH_SIZE", defaults.batch_size)?,
            max_price: env_or("SCAN_MAX_PRICE", defaults.max_price)?,
            min_volume: env_or("SCAN_MIN_VOLUME", defaults.min_volume)?,
            vote_quorum: env_or("SCAN_VOTE_QUORUM", defaults.vote_quorum)?,
            step_interval: Duration::from_secs(env_or("SCAN_STEP_INTERVAL_SECS", 5)?),
            exchange: env::var("SCAN_EXCHANGE").unwrap_or(defaults.exchange),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScanConfigError> {
        if self.batch_size == 0 {
            return Err(ScanConfigError::MustBePositive("SCAN_BATCH_SIZE"));
        }
        if self.max_price <= 0.0 {
            return Err(ScanConfigError::MustBePositive("SCAN_MAX_PRICE"));
        }
        if self.vote_quorum == 0 {
            return Err(ScanConfigError::MustBePositive("SCAN_VOTE_QUORUM"));
        }
        if self.step_interval.is_zero() {
            return Err(ScanConfigError::MustBePositive("SCAN_STEP_INTERVAL_SECS"));
        }
        Ok(())
    }

    /// Cheap first-stage check: `0 < price <= max_price` and `volume > min_volume`
    pub fn passes_prefilter(&self, price: f64, volume: f64) -> bool {
        price > 0.0 && price <= self.max_price && volume > self.min_volume
    }
}

fn env_or<T: FromStr>(var: &str, default: T) -> Result<T, ScanConfigError> {
    match env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|_| ScanConfigError::InvalidValue {
            var: var.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_config_default() {
        let config = ScanConfig::default();
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.vote_quorum, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_prefilter_band() {
        let config = ScanConfig::default();
        assert!(config.passes_prefilter(5.0, 100_001.0));
        assert!(!config.passes_prefilter(5.01, 1_000_000.0));
        assert!(!config.passes_prefilter(0.0, 1_000_000.0));
        assert!(!config.passes_prefilter(1.0, 100_000.0));
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let config = ScanConfig {
            batch_size: 0,
            ..ScanConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ScanConfigError::MustBePositive("SCAN_BATCH_SIZE"))
        );
    }
}
