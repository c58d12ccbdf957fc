//! Indicator math over daily bars. Inputs are ordered oldest first.

use analysis_core::DailyBar;

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    let mut sum: f64 = data[..period].iter().sum();
    result.push(sum / period as f64);
    for i in period..data.len() {
        sum += data[i] - data[i - period];
        result.push(sum / period as f64);
    }
    result
}

/// Average True Range (Wilder smoothing)
pub fn atr(bars: &[DailyBar], period: usize) -> Vec<f64> {
    if period == 0 || bars.len() < period + 1 {
        return vec![];
    }

    let true_ranges: Vec<f64> = bars
        .windows(2)
        .map(|w| {
            let (prev, bar) = (&w[0], &w[1]);
            let high_low = bar.high - bar.low;
            let high_close = (bar.high - prev.close).abs();
            let low_close = (bar.low - prev.close).abs();
            high_low.max(high_close).max(low_close)
        })
        .collect();

    let mut atr_values = Vec::with_capacity(true_ranges.len() - period + 1);
    let mut atr = true_ranges[..period].iter().sum::<f64>() / period as f64;
    atr_values.push(atr);

    for tr in &true_ranges[period..] {
        atr = (atr * (period - 1) as f64 + tr) / period as f64;
        atr_values.push(atr);
    }

    atr_values
}

/// Highest high minus lowest low over each full `window`
pub fn rolling_range(bars: &[DailyBar], window: usize) -> Vec<f64> {
    if window == 0 || bars.len() < window {
        return vec![];
    }
    bars.windows(window)
        .map(|w| {
            let high = w.iter().map(|b| b.high).fold(f64::MIN, f64::max);
            let low = w.iter().map(|b| b.low).fold(f64::MAX, f64::min);
            high - low
        })
        .collect()
}

/// Retracement levels of a swing from `low` up to `high`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FibonacciLevels {
    pub high: f64,
    pub low: f64,
    pub level_382: f64,
    pub level_500: f64,
    pub level_618: f64,
}

pub fn fibonacci_levels(high: f64, low: f64) -> FibonacciLevels {
    let range = high - low;
    FibonacciLevels {
        high,
        low,
        level_382: high - 0.382 * range,
        level_500: high - 0.500 * range,
        level_618: high - 0.618 * range,
    }
}

/// Percent move from open to high
pub fn intraday_gain_pct(bar: &DailyBar) -> Option<f64> {
    if bar.open == 0.0 {
        return None;
    }
    Some((bar.high / bar.open - 1.0) * 100.0)
}
