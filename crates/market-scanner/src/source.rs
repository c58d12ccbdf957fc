use alphavantage_client::{FetchClient, FetchError, OutputSize};
use analysis_core::{Quote, SignalInputs};
use async_trait::async_trait;

/// Period of the moving average behind the momentum vote
pub const SMA_PERIOD: u32 = 50;
/// Period of the average true range behind the volatility vote
pub const ATR_PERIOD: u32 = 14;

/// Market data the scan executor needs per ticker
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Lightweight quote used by the prefilter
    async fn quote(&self, symbol: &str) -> Result<Quote, FetchError>;

    /// Daily series plus auxiliary indicators for the qualification signals
    async fn signal_inputs(&self, symbol: &str) -> Result<SignalInputs, FetchError>;
}

#[async_trait]
impl MarketDataSource for FetchClient {
    async fn quote(&self, symbol: &str) -> Result<Quote, FetchError> {
        self.global_quote(symbol).await
    }

    async fn signal_inputs(&self, symbol: &str) -> Result<SignalInputs, FetchError> {
        // All three share the rate limiter, so running them together only
        // overlaps their network latency.
        let (daily, sma, atr) = tokio::join!(
            self.daily_series(symbol, OutputSize::Compact),
            self.sma(symbol, SMA_PERIOD),
            self.atr(symbol, ATR_PERIOD),
        );
        Ok(SignalInputs {
            daily: daily?,
            sma: sma?,
            atr: atr?,
        })
    }
}
