//! Second-stage analysis of the published watch-list: the quick league
//! (short-term pullback setups), the golden league (expert scoring) and the
//! macro climate.

pub mod golden_league;
pub mod indicators;
pub mod macro_climate;
pub mod quick_league;


pub use golden_league::{run_golden_league, GoldenScore, TechnicalSignals};
pub use indicators::{atr, fibonacci_levels, sma, FibonacciLevels};
pub use macro_climate::{macro_climate, ClimateStatus, MacroClimate};
pub use quick_league::{run_quick_league, QuickLeagueConfig, QuickOpportunity, TradePlan};
