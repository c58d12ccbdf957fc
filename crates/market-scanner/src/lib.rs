//! Market Scanner Module
//!
//! Resumable, batch-wise scan of a ticker universe: a cheap price/volume
//! prefilter followed by multi-signal qualification. Qualified tickers are
//! published to the watch-list when the scan completes.

pub mod config;
pub mod controller;
pub mod driver;
pub mod executor;
pub mod listing;
pub mod signals;
pub mod source;
pub mod state;
pub mod watchlist;


pub use config::{ScanConfig, ScanConfigError};
pub use controller::ScanController;
pub use driver::{Clock, DriverExit, ScanDriver, TokioClock};
pub use executor::{ScanError, ScanStepExecutor, StepReport, TickerOutcome};
pub use listing::{filter_listing, load_universe, parse_universe};
pub use signals::{default_signals, LiquiditySignal, MomentumSignal, VolatilitySignal};
pub use source::MarketDataSource;
pub use state::{ScanPhase, ScanState, ScanStateError, ScanStatus, SharedScanState, StartMode};
pub use watchlist::{PriceUpdate, WatchlistStore};
