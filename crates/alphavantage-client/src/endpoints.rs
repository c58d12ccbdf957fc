use analysis_core::{
    CompanyOverview, DailyBar, EconomicObservation, IndicatorSeries, NewsSentiment, Quote,
};

use crate::client::FetchClient;
use crate::error::FetchError;
use crate::models::{self, ListingEntry};
use crate::request::{functions, RequestParams};

/// Size of the daily series to request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSize {
    /// Latest 100 sessions
    Compact,
    Full,
}

impl OutputSize {
    fn as_str(&self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

/// Macro series available from the economic indicator operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EconomicSeries {
    FederalFundsRate,
    Cpi,
}

impl EconomicSeries {
    pub fn function(&self) -> &'static str {
        match self {
            EconomicSeries::FederalFundsRate => functions::FEDERAL_FUNDS_RATE,
            EconomicSeries::Cpi => functions::CPI,
        }
    }
}

fn daily_indicator(function: &str, symbol: &str, time_period: u32) -> RequestParams {
    RequestParams::new(function)
        .symbol(symbol)
        .with("interval", "daily")
        .with("time_period", time_period)
        .with("series_type", "close")
}

impl FetchClient {
    pub async fn global_quote(&self, symbol: &str) -> Result<Quote, FetchError> {
        let params = RequestParams::new(functions::GLOBAL_QUOTE).symbol(symbol);
        let payload = self.request(&params).await?;
        models::parse_quote(payload.as_json()?)
    }

    /// Daily OHLCV bars, newest first
    pub async fn daily_series(
        &self,
        symbol: &str,
        size: OutputSize,
    ) -> Result<Vec<DailyBar>, FetchError> {
        let params = RequestParams::new(functions::TIME_SERIES_DAILY)
            .symbol(symbol)
            .with("outputsize", size.as_str());
        let payload = self.request(&params).await?;
        models::parse_daily_series(payload.as_json()?, symbol)
    }

    pub async fn sma(&self, symbol: &str, time_period: u32) -> Result<IndicatorSeries, FetchError> {
        let params = daily_indicator(functions::SMA, symbol, time_period);
        let payload = self.request(&params).await?;
        models::parse_indicator(payload.as_json()?, "SMA", symbol)
    }

    pub async fn atr(&self, symbol: &str, time_period: u32) -> Result<IndicatorSeries, FetchError> {
        let params = RequestParams::new(functions::ATR)
            .symbol(symbol)
            .with("interval", "daily")
            .with("time_period", time_period);
        let payload = self.request(&params).await?;
        models::parse_indicator(payload.as_json()?, "ATR", symbol)
    }

    pub async fn rsi(&self, symbol: &str, time_period: u32) -> Result<IndicatorSeries, FetchError> {
        let params = daily_indicator(functions::RSI, symbol, time_period);
        let payload = self.request(&params).await?;
        models::parse_indicator(payload.as_json()?, "RSI", symbol)
    }

    /// Stochastic oscillator, SlowK line
    pub async fn stoch(&self, symbol: &str) -> Result<IndicatorSeries, FetchError> {
        let params = RequestParams::new(functions::STOCH)
            .symbol(symbol)
            .with("interval", "daily");
        let payload = self.request(&params).await?;
        models::parse_indicator(payload.as_json()?, "SlowK", symbol)
    }

    /// MACD histogram line
    pub async fn macd(&self, symbol: &str) -> Result<IndicatorSeries, FetchError> {
        let params = RequestParams::new(functions::MACD)
            .symbol(symbol)
            .with("interval", "daily")
            .with("series_type", "close");
        let payload = self.request(&params).await?;
        models::parse_indicator(payload.as_json()?, "MACD_Hist", symbol)
    }

    pub async fn company_overview(&self, symbol: &str) -> Result<CompanyOverview, FetchError> {
        let params = RequestParams::new(functions::OVERVIEW).symbol(symbol);
        let payload = self.request(&params).await?;
        models::parse_overview(payload.as_json()?)
    }

    pub async fn news_sentiment(&self, symbol: &str) -> Result<NewsSentiment, FetchError> {
        let params = RequestParams::new(functions::NEWS_SENTIMENT).with("tickers", symbol);
        let payload = self.request(&params).await?;
        models::parse_news_sentiment(payload.as_json()?, symbol)
    }

    /// Latest observation of a macro series
    pub async fn economic_indicator(
        &self,
        series: EconomicSeries,
    ) -> Result<EconomicObservation, FetchError> {
        let params = RequestParams::new(series.function()).with("interval", "monthly");
        let payload = self.request(&params).await?;
        models::parse_latest_observation(payload.as_json()?, series.function())
    }

    /// Every listed security, in file order
    pub async fn listing_status(&self) -> Result<Vec<ListingEntry>, FetchError> {
        let params = RequestParams::new(functions::LISTING_STATUS);
        let payload = self.request(&params).await?;
        models::parse_listing(payload.as_text()?)
    }
}
