use analysis_core::{
    tally_votes, AnalysisError, DailyBar, IndicatorPoint, IndicatorSeries, QualificationSignal,
    SignalInputs,
};
use league_analysis::indicators::{atr, sma};
use market_scanner::default_signals;
use rust_decimal::prelude::*;
use statrs::statistics::Statistics;

use crate::models::*;

/// Sessions handed to the signals at each step, matching a compact daily fetch.
const HISTORY_WINDOW: usize = 100;

/// Replays the scanner's qualification signals over a daily series.
///
/// The decision taken at the close of session i executes at the **open** of
/// session i+1, so no decision sees the price it trades at. A position is held
/// while the vote quorum is met and closed at the next open once it is lost.
pub struct BacktestEngine {
    config: BacktestConfig,
    signals: Vec<Box<dyn QualificationSignal>>,
}

/// An open position being tracked during the replay.
struct OpenPosition {
    entry_date: chrono::NaiveDate,
    entry_price: Decimal,
    shares: Decimal,
    entry_commission: Decimal,
    entry_signals: Vec<String>,
}

enum Pending {
    Enter(Vec<String>),
    Exit,
}

fn to_decimal(value: f64) -> Result<Decimal, AnalysisError> {
    Decimal::from_f64(value)
        .ok_or_else(|| AnalysisError::InvalidData(format!("price {} is not representable", value)))
}

/// Buy at the first close, sell at the last one.
pub fn buy_and_hold(ticker: &str, bars: &[DailyBar]) -> Result<BuyAndHold, AnalysisError> {
    let mut sorted = bars.to_vec();
    sorted.sort_by_key(|b| b.date);

    let (first, last) = match (sorted.first(), sorted.last()) {
        (Some(first), Some(last)) if sorted.len() >= 2 => (first, last),
        _ => {
            return Err(AnalysisError::InsufficientData(format!(
                "{}: need at least 2 sessions, got {}",
                ticker,
                sorted.len()
            )))
        }
    };

    let total_pnl = last.close - first.close;
    let pnl_percent = if first.close > 0.0 {
        total_pnl / first.close * 100.0
    } else {
        0.0
    };

    Ok(BuyAndHold {
        ticker: ticker.to_string(),
        trade_count: 1,
        initial_price: first.close,
        final_price: last.close,
        total_pnl,
        pnl_percent,
        period_days: sorted.len(),
    })
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Self {
        Self {
            config,
            signals: default_signals(),
        }
    }

    pub fn with_signals(mut self, signals: Vec<Box<dyn QualificationSignal>>) -> Self {
        self.signals = signals;
        self
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run the replay. `bars` may be in any order.
    pub fn run(&self, ticker: &str, bars: &[DailyBar]) -> Result<BacktestResult, AnalysisError> {
        let baseline = buy_and_hold(ticker, bars)?;

        let mut bars = bars.to_vec();
        bars.sort_by_key(|b| b.date);
        let n = bars.len();

        let commission_dec = to_decimal(self.config.commission_rate.unwrap_or(0.0))?;
        let size_dec = to_decimal(self.config.position_size_percent.clamp(0.0, 100.0) / 100.0)?;
        let warmup = self.config.warmup();

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let sma_values = sma(&closes, self.config.sma_period);
        let atr_values = atr(&bars, self.config.atr_period);

        let mut cash = self.config.initial_capital;
        let mut position: Option<OpenPosition> = None;
        let mut pending: Option<Pending> = None;
        let mut trades: Vec<BacktestTrade> = Vec::new();
        let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(n);
        let mut total_commission = Decimal::ZERO;
        let mut peak_equity = self.config.initial_capital;
        let mut max_drawdown = 0.0;
        let mut decision_bars: usize = 0;
        let mut exposed_bars: usize = 0;

        for i in 0..n {
            let bar = &bars[i];

            // Execute yesterday's decision at today's open
            match pending.take() {
                Some(Pending::Enter(voters)) if position.is_none() => {
                    let open = to_decimal(bar.open)?;
                    if open > Decimal::ZERO {
                        let notional = cash * size_dec;
                        let commission = notional * commission_dec;
                        let shares = (notional - commission) / open;
                        cash -= notional;
                        total_commission += commission;
                        position = Some(OpenPosition {
                            entry_date: bar.date,
                            entry_price: open,
                            shares,
                            entry_commission: commission,
                            entry_signals: voters,
                        });
                    }
                }
                Some(Pending::Exit) => {
                    if let Some(pos) = position.take() {
                        let open = to_decimal(bar.open)?;
                        let (trade, proceeds, commission) = Self::close_position(
                            pos,
                            ticker,
                            bar.date,
                            open,
                            commission_dec,
                            "quorum_lost",
                        );
                        cash += proceeds;
                        total_commission += commission;
                        trades.push(trade);
                    }
                }
                _ => {}
            }

            if i + 1 >= warmup {
                decision_bars += 1;
                if position.is_some() {
                    exposed_bars += 1;
                }

                let inputs = self.inputs_at(&bars, i, &sma_values, &atr_values);
                let (score, voters) = tally_votes(&self.signals, &inputs, bar.close);
                let qualifies = score >= self.config.vote_quorum;

                if qualifies && position.is_none() && i + 1 < n {
                    tracing::debug!(
                        "{} {}: entry signal ({})",
                        ticker,
                        bar.date,
                        voters.join(", ")
                    );
                    pending = Some(Pending::Enter(voters));
                } else if !qualifies && position.is_some() {
                    tracing::debug!(
                        "{} {}: quorum lost ({}/{})",
                        ticker,
                        bar.date,
                        score,
                        self.signals.len()
                    );
                    pending = Some(Pending::Exit);
                }
            }

            let close = to_decimal(bar.close)?;
            let equity = cash + position.as_ref().map(|p| p.shares * close).unwrap_or_default();
            if equity > peak_equity {
                peak_equity = equity;
            }
            let peak_f64 = peak_equity.to_f64().unwrap_or(1.0);
            let equity_f64 = equity.to_f64().unwrap_or(0.0);
            let drawdown_pct = if peak_f64 > 0.0 {
                (peak_f64 - equity_f64) / peak_f64 * 100.0
            } else {
                0.0
            };
            if drawdown_pct > max_drawdown {
                max_drawdown = drawdown_pct;
            }
            equity_curve.push(EquityPoint {
                date: bar.date,
                equity,
                drawdown_percent: drawdown_pct,
            });
        }

        // Close anything still open at the final close
        if let Some(pos) = position.take() {
            let last = &bars[n - 1];
            let close = to_decimal(last.close)?;
            let (trade, proceeds, commission) =
                Self::close_position(pos, ticker, last.date, close, commission_dec, "end_of_data");
            cash += proceeds;
            total_commission += commission;
            trades.push(trade);
            if let Some(point) = equity_curve.last_mut() {
                point.equity = cash;
            }
        }

        let initial_f64 = self.config.initial_capital.to_f64().unwrap_or(1.0);
        let final_f64 = cash.to_f64().unwrap_or(0.0);
        let total_return_percent = if initial_f64 > 0.0 {
            (final_f64 / initial_f64 - 1.0) * 100.0
        } else {
            0.0
        };

        let winning_trades = trades.iter().filter(|t| t.profit_loss > Decimal::ZERO).count() as i32;
        let losing_trades = trades.iter().filter(|t| t.profit_loss < Decimal::ZERO).count() as i32;
        let total_trades = trades.len() as i32;
        let win_rate = if total_trades > 0 {
            winning_trades as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let gross_profit: Decimal = trades
            .iter()
            .filter(|t| t.profit_loss > Decimal::ZERO)
            .map(|t| t.profit_loss)
            .sum();
        let gross_loss: Decimal = trades
            .iter()
            .filter(|t| t.profit_loss < Decimal::ZERO)
            .map(|t| t.profit_loss.abs())
            .sum();
        let profit_factor = if gross_loss > Decimal::ZERO {
            (gross_profit / gross_loss).to_f64()
        } else {
            None
        };

        let exposure_time_percent = if decision_bars > 0 {
            exposed_bars as f64 / decision_bars as f64 * 100.0
        } else {
            0.0
        };

        tracing::info!(
            "Backtest {}: {} trades, return {:.2}% vs buy-and-hold {:.2}%",
            ticker,
            total_trades,
            total_return_percent,
            baseline.pnl_percent
        );

        Ok(BacktestResult {
            ticker: ticker.to_string(),
            start_date: bars[0].date,
            end_date: bars[n - 1].date,
            initial_capital: self.config.initial_capital,
            final_capital: cash,
            total_return: cash - self.config.initial_capital,
            total_return_percent,
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            profit_factor,
            sharpe_ratio: Self::sharpe_ratio(&equity_curve),
            max_drawdown,
            exposure_time_percent,
            total_commission_paid: total_commission,
            equity_curve,
            trades,
            buy_and_hold: baseline,
        })
    }

    /// What the live scanner would have seen at the close of session `i`.
    fn inputs_at(
        &self,
        bars: &[DailyBar],
        i: usize,
        sma_values: &[f64],
        atr_values: &[f64],
    ) -> SignalInputs {
        let start = (i + 1).saturating_sub(HISTORY_WINDOW);
        let daily: Vec<DailyBar> = bars[start..=i].iter().rev().cloned().collect();
        let date = bars[i].date;

        let point = |value: Option<&f64>| {
            value
                .map(|v| vec![IndicatorPoint { date, value: *v }])
                .unwrap_or_default()
        };
        // sma_values[k] ends at session k + period - 1, atr_values[k] at k + period
        let sma_point = (i + 1)
            .checked_sub(self.config.sma_period)
            .and_then(|k| sma_values.get(k));
        let atr_point = i
            .checked_sub(self.config.atr_period)
            .and_then(|k| atr_values.get(k));

        SignalInputs {
            daily,
            sma: IndicatorSeries::new("SMA", point(sma_point)),
            atr: IndicatorSeries::new("ATR", point(atr_point)),
        }
    }

    fn close_position(
        pos: OpenPosition,
        symbol: &str,
        date: chrono::NaiveDate,
        exit_price: Decimal,
        commission_dec: Decimal,
        reason: &str,
    ) -> (BacktestTrade, Decimal, Decimal) {
        let gross = exit_price * pos.shares;
        let exit_commission = gross * commission_dec;
        let proceeds = gross - exit_commission;
        let cost_basis = pos.entry_price * pos.shares + pos.entry_commission;
        let profit_loss = proceeds - cost_basis;

        let entry_f64 = pos.entry_price.to_f64().unwrap_or(1.0);
        let exit_f64 = exit_price.to_f64().unwrap_or(0.0);
        let profit_loss_percent = if entry_f64 > 0.0 {
            (exit_f64 / entry_f64 - 1.0) * 100.0
        } else {
            0.0
        };

        let trade = BacktestTrade {
            symbol: symbol.to_string(),
            entry_date: pos.entry_date,
            exit_date: date,
            entry_price: pos.entry_price,
            exit_price,
            shares: pos.shares,
            profit_loss,
            profit_loss_percent,
            holding_period_days: (date - pos.entry_date).num_days(),
            entry_signals: pos.entry_signals,
            exit_reason: reason.to_string(),
        };
        (trade, proceeds, exit_commission)
    }

    /// Annualised Sharpe ratio of daily equity returns (2% risk-free)
    fn sharpe_ratio(equity_curve: &[EquityPoint]) -> Option<f64> {
        if equity_curve.len() < 3 {
            return None;
        }
        let returns: Vec<f64> = equity_curve
            .windows(2)
            .map(|w| {
                let e0 = w[0].equity.to_f64().unwrap_or(1.0);
                let e1 = w[1].equity.to_f64().unwrap_or(1.0);
                (e1 / e0) - 1.0
            })
            .collect();

        let mean = returns.iter().mean();
        let std_dev = returns.iter().std_dev();
        let rf_daily = 0.02 / 252.0;

        if std_dev > 0.0 && std_dev.is_finite() {
            Some(((mean - rf_daily) / std_dev) * 252.0_f64.sqrt())
        } else {
            None
        }
    }
}
