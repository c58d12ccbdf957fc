use analysis_core::{AnalysisError, DailyBar, QualificationSignal, SignalInputs};
use chrono::{Duration, NaiveDate};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::engine::{buy_and_hold, BacktestEngine};
use crate::models::*;

/// Helper: create a DailyBar with the given OHLC data.
fn bar(date: &str, open: f64, high: f64, low: f64, close: f64) -> DailyBar {
    DailyBar {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open,
        high,
        low,
        close,
        volume: 1_000_000.0,
    }
}

/// Helper: open/close bars on consecutive days starting 2024-01-01.
fn bars_from(prices: &[(f64, f64)]) -> Vec<DailyBar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    prices
        .iter()
        .enumerate()
        .map(|(i, &(open, close))| DailyBar {
            date: start + Duration::days(i as i64),
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume: 1_000_000.0,
        })
        .collect()
}

/// Votes while the close is above a fixed level.
struct CloseAbove(f64);

impl QualificationSignal for CloseAbove {
    fn name(&self) -> &'static str {
        "close_above"
    }

    fn vote(&self, _inputs: &SignalInputs, current_price: f64) -> bool {
        current_price > self.0
    }
}

/// Helper: engine deciding from the first session pair on a single signal.
fn threshold_engine(level: f64, commission_rate: Option<f64>) -> BacktestEngine {
    let config = BacktestConfig {
        initial_capital: Decimal::new(10_000, 0),
        position_size_percent: 100.0,
        commission_rate,
        vote_quorum: 1,
        sma_period: 2,
        atr_period: 1,
        warmup: Some(2),
    };
    BacktestEngine::new(config).with_signals(vec![Box::new(CloseAbove(level))])
}

fn approx(value: Decimal, expected: f64) -> bool {
    (value.to_f64().unwrap() - expected).abs() < 0.01
}

// =============================================================================
// Buy-and-hold baseline
// =============================================================================

#[test]
fn test_buy_and_hold_any_order() {
    let bars = vec![
        bar("2024-01-04", 11.0, 12.0, 10.5, 11.5),
        bar("2024-01-02", 10.0, 10.5, 9.5, 10.0),
        bar("2024-01-03", 10.0, 11.0, 9.8, 10.8),
    ];
    let baseline = buy_and_hold("ABCD", &bars).unwrap();

    assert_eq!(baseline.trade_count, 1);
    assert_eq!(baseline.initial_price, 10.0);
    assert_eq!(baseline.final_price, 11.5);
    assert!((baseline.total_pnl - 1.5).abs() < 1e-9);
    assert!((baseline.pnl_percent - 15.0).abs() < 1e-9);
    assert_eq!(baseline.period_days, 3);
}

#[test]
fn test_insufficient_data() {
    let one = vec![bar("2024-01-02", 10.0, 10.5, 9.5, 10.0)];
    assert!(matches!(
        buy_and_hold("ABCD", &one),
        Err(AnalysisError::InsufficientData(_))
    ));
    assert!(matches!(
        buy_and_hold("ABCD", &[]),
        Err(AnalysisError::InsufficientData(_))
    ));

    let engine = BacktestEngine::new(BacktestConfig::default());
    assert!(matches!(
        engine.run("ABCD", &one),
        Err(AnalysisError::InsufficientData(_))
    ));
}

// =============================================================================
// Next-bar execution: decisions at the close fill at the next OPEN
// =============================================================================

#[test]
fn test_next_bar_execution() {
    let bars = bars_from(&[
        (10.0, 10.0),
        (10.0, 11.0), // quorum met at the close
        (12.0, 12.0), // entry at this open
        (12.0, 10.0), // quorum lost at the close
        (9.0, 9.0),   // exit at this open
    ]);
    let result = threshold_engine(10.5, None).run("ABCD", &bars).unwrap();

    assert_eq!(result.total_trades, 1);
    let trade = &result.trades[0];
    assert_eq!(trade.entry_price, dec!(12));
    assert_eq!(trade.exit_price, dec!(9));
    assert_eq!(trade.entry_date, bars[2].date);
    assert_eq!(trade.exit_date, bars[4].date);
    assert_eq!(trade.holding_period_days, 2);
    assert_eq!(trade.exit_reason, "quorum_lost");
    assert_eq!(trade.entry_signals, vec!["close_above".to_string()]);
    assert!((trade.profit_loss_percent + 25.0).abs() < 1e-9);

    assert!(approx(result.final_capital, 7_500.0));
    assert!((result.total_return_percent + 25.0).abs() < 0.01);
    assert_eq!(result.losing_trades, 1);
    assert_eq!(result.win_rate, 0.0);
    assert_eq!(result.profit_factor, Some(0.0));

    // Baseline is reported regardless of the strategy
    assert!((result.buy_and_hold.pnl_percent + 10.0).abs() < 1e-9);
    assert!((result.alpha() + 15.0).abs() < 0.01);
    assert_eq!(result.equity_curve.len(), bars.len());
}

#[test]
fn test_no_entry_on_last_session() {
    let bars = bars_from(&[(10.0, 10.0), (10.0, 10.0), (10.0, 11.0)]);
    let result = threshold_engine(10.5, None).run("ABCD", &bars).unwrap();

    assert_eq!(result.total_trades, 0);
    assert_eq!(result.final_capital, dec!(10000));
    assert_eq!(result.exposure_time_percent, 0.0);
}

// =============================================================================
// Open positions are closed at the final close
// =============================================================================

#[test]
fn test_end_of_data_close() {
    let bars = bars_from(&[(10.0, 11.0), (11.0, 11.0), (11.0, 12.0), (12.0, 13.0)]);
    let result = threshold_engine(10.5, None).run("ABCD", &bars).unwrap();

    assert_eq!(result.total_trades, 1);
    let trade = &result.trades[0];
    assert_eq!(trade.entry_price, dec!(11));
    assert_eq!(trade.exit_price, dec!(13));
    assert_eq!(trade.exit_reason, "end_of_data");
    assert_eq!(result.winning_trades, 1);
    assert_eq!(result.profit_factor, None);
    assert_eq!(result.win_rate, 100.0);

    // Final equity point reflects the realised capital
    let last = result.equity_curve.last().unwrap();
    assert_eq!(last.equity, result.final_capital);
    assert!(approx(result.final_capital, 10_000.0 * 13.0 / 11.0));
}

// =============================================================================
// Commission on both legs
// =============================================================================

#[test]
fn test_commission_both_legs() {
    let bars = bars_from(&[(10.0, 10.0), (10.0, 11.0), (10.0, 10.5), (11.0, 11.0)]);
    let result = threshold_engine(10.2, Some(0.001)).run("ABCD", &bars).unwrap();

    assert_eq!(result.total_trades, 1);
    let trade = &result.trades[0];
    // 10 000 notional, 10 commission, 999 shares at 10
    assert_eq!(trade.shares, dec!(999));
    // 999 * 11 = 10 989 gross, 10.989 commission
    assert_eq!(trade.profit_loss, dec!(978.011));
    assert_eq!(result.total_commission_paid, dec!(20.989));
    assert_eq!(result.final_capital, dec!(10978.011));
}

// =============================================================================
// Re-entry after the quorum is lost
// =============================================================================

#[test]
fn test_round_trips_and_profit_factor() {
    let bars = bars_from(&[
        (10.0, 10.0),
        (10.0, 11.0), // enter
        (12.0, 13.0), // filled at 12
        (13.0, 10.0), // exit
        (10.0, 11.0), // filled exit at 10, enter again
        (11.0, 14.0), // filled at 11, closed at 14 at the end
    ]);
    let result = threshold_engine(10.5, None).run("ABCD", &bars).unwrap();

    assert_eq!(result.total_trades, 2);
    assert_eq!(result.winning_trades, 1);
    assert_eq!(result.losing_trades, 1);
    assert_eq!(result.win_rate, 50.0);
    assert_eq!(result.trades[0].exit_reason, "quorum_lost");
    assert_eq!(result.trades[1].exit_reason, "end_of_data");

    // loss 2/12 of 10 000, then gain 3/11 of the remainder
    let after_loss = 10_000.0 * 10.0 / 12.0;
    let final_capital = after_loss * 14.0 / 11.0;
    assert!(approx(result.final_capital, final_capital));

    let profit = final_capital - after_loss;
    let loss = 10_000.0 - after_loss;
    assert!((result.profit_factor.unwrap() - profit / loss).abs() < 1e-6);
    assert!(result.max_drawdown > 0.0);
}

// =============================================================================
// Default scanner signals over a trending, volatile series
// =============================================================================

#[test]
fn test_default_signals_replay() {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let bars: Vec<DailyBar> = (0..80)
        .map(|i| {
            let close = 2.0 + 0.01 * i as f64;
            DailyBar {
                date: start + Duration::days(i as i64),
                open: close - 0.005,
                high: close * 1.05,
                low: close * 0.95,
                close,
                volume: 500_000.0,
            }
        })
        .collect();

    let engine = BacktestEngine::new(BacktestConfig::default());
    let result = engine.run("ABCD", &bars).unwrap();

    // Momentum and volatility agree from the first decision onwards
    assert_eq!(result.total_trades, 1);
    let trade = &result.trades[0];
    assert_eq!(trade.entry_date, bars[50].date);
    assert_eq!(
        trade.entry_signals,
        vec!["momentum".to_string(), "volatility".to_string()]
    );
    assert_eq!(trade.exit_reason, "end_of_data");
    assert!(result.total_return_percent > 0.0);
    assert!(result.exposure_time_percent > 90.0);
    assert!(result.sharpe_ratio.is_some());
}

#[test]
fn test_warmup_never_below_indicator_periods() {
    let config = BacktestConfig {
        warmup: Some(5),
        ..BacktestConfig::default()
    };
    assert_eq!(config.warmup(), 50);

    let config = BacktestConfig {
        warmup: Some(70),
        ..BacktestConfig::default()
    };
    assert_eq!(config.warmup(), 70);
}
