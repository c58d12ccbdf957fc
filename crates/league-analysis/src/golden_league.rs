//! Golden league: four independent experts score each watch-list ticker on a
//! 0-100 scale. 50 (60 for news) is the neutral score used when an expert
//! has nothing to go on.

use alphavantage_client::{FetchClient, FetchError, OutputSize};
use analysis_core::{stats, CompanyOverview, DailyBar, NewsSentiment};
use serde::{Deserialize, Serialize};

use crate::indicators::rolling_range;

const NEUTRAL: i32 = 50;
const NEUTRAL_SENTIMENT: u32 = 60;
const RANGE_WINDOW: usize = 14;

fn clamp_score(score: i32) -> u32 {
    score.clamp(0, 100) as u32
}

/// Latest readings fed to the technical expert
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSignals {
    pub rsi: Option<f64>,
    pub macd_hist: Option<f64>,
    pub slow_k: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldenScore {
    pub ticker: String,
    pub technical: u32,
    pub fundamental: u32,
    pub quant: u32,
    pub sentinel: u32,
}

impl GoldenScore {
    /// Equal-weight average of the four experts
    pub fn composite(&self) -> f64 {
        (self.technical + self.fundamental + self.quant + self.sentinel) as f64 / 4.0
    }
}

/// Oversold RSI/SlowK and a positive MACD histogram push the score up.
pub fn technical_score(signals: &TechnicalSignals) -> u32 {
    let mut score = NEUTRAL;

    match signals.rsi {
        Some(rsi) if rsi < 30.0 => score += 25,
        Some(rsi) if rsi > 70.0 => score -= 25,
        _ => {}
    }
    match signals.macd_hist {
        Some(hist) if hist > 0.0 => score += 20,
        Some(hist) if hist < 0.0 => score -= 20,
        _ => {}
    }
    match signals.slow_k {
        Some(k) if k < 20.0 => score += 25,
        Some(k) if k > 80.0 => score -= 25,
        _ => {}
    }

    clamp_score(score)
}

/// Valuation and profitability. A missing EPS counts as unprofitable.
pub fn fundamental_score(overview: Option<&CompanyOverview>) -> u32 {
    let Some(overview) = overview else {
        return NEUTRAL as u32;
    };
    let mut score = NEUTRAL;

    match overview.pe_ratio {
        Some(pe) if pe > 0.0 && pe < 15.0 => score += 20,
        Some(pe) if pe > 40.0 => score -= 15,
        _ => {}
    }
    if matches!(overview.price_to_book, Some(pb) if pb > 0.0 && pb < 3.0) {
        score += 15;
    }
    if matches!(overview.eps, Some(eps) if eps > 0.0) {
        score += 15;
    } else {
        score -= 20;
    }

    clamp_score(score)
}

/// Average 14-session high-low range as a percentage of the average close.
/// `daily` may be in either order.
pub fn average_range_pct(daily: &[DailyBar]) -> Option<f64> {
    let ranges = rolling_range(daily, RANGE_WINDOW);
    let closes: Vec<f64> = daily.iter().map(|b| b.close).collect();
    let mean_close = stats::mean(&closes);
    if ranges.is_empty() || mean_close <= 0.0 {
        return None;
    }
    Some(stats::mean(&ranges) / mean_close * 100.0)
}

/// Rewards energetic price action and moderate beta. Needs both the daily
/// series and the company overview, otherwise neutral.
pub fn quant_score(daily: Option<&[DailyBar]>, overview: Option<&CompanyOverview>) -> u32 {
    let (Some(daily), Some(overview)) = (daily, overview) else {
        return NEUTRAL as u32;
    };
    let mut score = NEUTRAL;

    if matches!(average_range_pct(daily), Some(pct) if pct > 4.0) {
        score += 15;
    }
    match overview.beta {
        Some(beta) if beta > 1.2 && beta < 2.5 => score += 10,
        Some(beta) if beta >= 2.5 => score -= 10,
        _ => {}
    }

    clamp_score(score)
}

/// Average news sentiment mapped onto five bands
pub fn sentinel_score(news: Option<&NewsSentiment>) -> u32 {
    let scores = match news {
        Some(news) if !news.scores.is_empty() => &news.scores,
        _ => return NEUTRAL_SENTIMENT,
    };
    let average = stats::mean(scores);

    if average > 0.35 {
        100
    } else if average > 0.15 {
        80
    } else if average < -0.35 {
        0
    } else if average < -0.15 {
        20
    } else {
        NEUTRAL_SENTIMENT
    }
}

/// Everything the experts read for one ticker
#[derive(Debug, Clone, Default)]
pub struct ExpertInputs {
    pub daily: Vec<DailyBar>,
    pub technical: TechnicalSignals,
    pub overview: Option<CompanyOverview>,
    pub news: Option<NewsSentiment>,
}

pub fn score_ticker(ticker: &str, inputs: &ExpertInputs) -> GoldenScore {
    let daily = (!inputs.daily.is_empty()).then_some(inputs.daily.as_slice());
    GoldenScore {
        ticker: ticker.to_string(),
        technical: technical_score(&inputs.technical),
        fundamental: fundamental_score(inputs.overview.as_ref()),
        quant: quant_score(daily, inputs.overview.as_ref()),
        sentinel: sentinel_score(inputs.news.as_ref()),
    }
}

async fn fetch_inputs(client: &FetchClient, ticker: &str) -> Result<ExpertInputs, FetchError> {
    let (daily, rsi, macd, stoch, overview, news) = tokio::join!(
        client.daily_series(ticker, OutputSize::Compact),
        client.rsi(ticker, 14),
        client.macd(ticker),
        client.stoch(ticker),
        client.company_overview(ticker),
        client.news_sentiment(ticker),
    );

    Ok(ExpertInputs {
        daily: daily?,
        technical: TechnicalSignals {
            rsi: rsi.ok().and_then(|s| s.latest()),
            macd_hist: macd.ok().and_then(|s| s.latest()),
            slow_k: stoch.ok().and_then(|s| s.latest()),
        },
        overview: overview.ok(),
        news: news.ok(),
    })
}

/// Score every ticker, best composite first. Tickers without a daily
/// series are logged and skipped.
pub async fn run_golden_league(client: &FetchClient, tickers: &[String]) -> Vec<GoldenScore> {
    tracing::info!("Golden league: analysing {} tickers", tickers.len());
    let mut results = Vec::with_capacity(tickers.len());

    for ticker in tickers {
        match fetch_inputs(client, ticker).await {
            Ok(inputs) => results.push(score_ticker(ticker, &inputs)),
            Err(e) => tracing::warn!("Golden league: skipping {}: {}", ticker, e),
        }
    }

    results.sort_by(|a, b| b.composite().total_cmp(&a.composite()));
    results
}
