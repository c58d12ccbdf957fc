//! Historical replay of the scanner's qualification signals, reported
//! against a buy-and-hold baseline.

pub mod engine;
pub mod models;
pub mod runner;

#[cfg(test)]
mod tests;

pub use engine::{buy_and_hold, BacktestEngine};
pub use models::*;
pub use runner::backtest_ticker;
