//! Pure helpers for the correlation analysis.
//! Stateless functions, no IO.

use std::collections::BTreeMap;

use analysis_core::DailyBar;
use chrono::NaiveDate;

/// Sessions of history considered per ticker.
pub const CORRELATION_LOOKBACK: usize = 100;
/// Overlapping sessions needed before a pair is correlated at all.
pub const MIN_OVERLAP: usize = 5;

/// Pearson correlation of two equally long series; 0.0 when undefined.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }

    let a = &a[..n];
    let b = &b[..n];

    let mean_a: f64 = a.iter().sum::<f64>() / n as f64;
    let mean_b: f64 = b.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;

    for i in 0..n {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        0.0
    } else {
        cov / denom
    }
}

/// Closes of the most recent `lookback` sessions, keyed by date.
pub fn recent_closes(bars: &[DailyBar], lookback: usize) -> BTreeMap<NaiveDate, f64> {
    let mut closes: BTreeMap<NaiveDate, f64> = bars.iter().map(|b| (b.date, b.close)).collect();
    while closes.len() > lookback {
        closes.pop_first();
    }
    closes
}

/// Daily returns of both series over the dates they share.
/// Returns `None` when fewer than `MIN_OVERLAP` dates overlap.
pub fn aligned_returns(
    a: &BTreeMap<NaiveDate, f64>,
    b: &BTreeMap<NaiveDate, f64>,
) -> Option<(Vec<f64>, Vec<f64>)> {
    let merged: Vec<(f64, f64)> = a
        .iter()
        .filter_map(|(date, close_a)| b.get(date).map(|close_b| (*close_a, *close_b)))
        .collect();
    if merged.len() < MIN_OVERLAP {
        return None;
    }

    let (returns_a, returns_b) = merged
        .windows(2)
        .filter(|w| w[0].0 != 0.0 && w[0].1 != 0.0)
        .map(|w| ((w[1].0 - w[0].0) / w[0].0, (w[1].1 - w[0].1) / w[0].1))
        .unzip();
    Some((returns_a, returns_b))
}

/// Correlation of daily returns of two close series; 0.0 with too little overlap.
pub fn returns_correlation(a: &BTreeMap<NaiveDate, f64>, b: &BTreeMap<NaiveDate, f64>) -> f64 {
    match aligned_returns(a, b) {
        Some((returns_a, returns_b)) => pearson_correlation(&returns_a, &returns_b),
        None => 0.0,
    }
}
