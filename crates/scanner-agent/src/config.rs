use std::env;

use alphavantage_client::ClientConfig;
use anyhow::{bail, Context, Result};
use backtest_engine::BacktestConfig;
use league_analysis::QuickLeagueConfig;
use market_scanner::{parse_universe, ScanConfig};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub client: ClientConfig,
    pub scan: ScanConfig,
    pub quick_league: QuickLeagueConfig,
    pub backtest: BacktestConfig,

    /// Tickers scanned instead of the exchange listing (`SCAN_UNIVERSE`)
    pub universe_override: Option<Vec<String>>,
    /// Golden-league leaders replayed through the backtester
    pub backtest_top_n: usize,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self> {
        let client = ClientConfig::from_env().context("Invalid Alpha Vantage configuration")?;
        let scan = ScanConfig::from_env().context("Invalid scan configuration")?;

        let backtest = BacktestConfig {
            initial_capital: env::var("BACKTEST_INITIAL_CAPITAL")
                .unwrap_or_else(|_| "10000".to_string())
                .parse::<Decimal>()
                .context("BACKTEST_INITIAL_CAPITAL must be a decimal amount")?,
            commission_rate: match env::var("BACKTEST_COMMISSION_RATE") {
                Ok(raw) => Some(
                    raw.parse::<f64>()
                        .context("BACKTEST_COMMISSION_RATE must be a number")?,
                ),
                Err(_) => None,
            },
            vote_quorum: scan.vote_quorum,
            ..BacktestConfig::default()
        };

        let config = Self {
            client,
            scan,
            quick_league: QuickLeagueConfig::default(),
            backtest,
            universe_override: universe_override(env::var("SCAN_UNIVERSE").ok().as_deref()),
            backtest_top_n: env::var("BACKTEST_TOP_N")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .context("BACKTEST_TOP_N must be a non-negative integer")?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.backtest.initial_capital <= Decimal::ZERO {
            bail!(
                "BACKTEST_INITIAL_CAPITAL must be positive, got {}",
                self.backtest.initial_capital
            );
        }
        if let Some(rate) = self.backtest.commission_rate {
            if !(0.0..1.0).contains(&rate) {
                bail!("BACKTEST_COMMISSION_RATE must be in [0, 1), got {}", rate);
            }
        }
        if matches!(&self.universe_override, Some(universe) if universe.is_empty()) {
            bail!("SCAN_UNIVERSE is set but names no tickers");
        }
        Ok(())
    }
}

/// A blank `SCAN_UNIVERSE` counts as unset
fn universe_override(raw: Option<&str>) -> Option<Vec<String>> {
    raw.filter(|r| !r.trim().is_empty()).map(parse_universe)
}
