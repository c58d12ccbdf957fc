mod cache;
mod client;
mod config;
mod endpoints;
mod error;
pub mod models;
mod payload;
mod rate_limiter;
mod request;
mod transport;


pub use cache::ResponseCache;
pub use client::{classify, FetchClient, FetchOutcome};
pub use config::{ClientConfig, RetryPolicy, DEFAULT_BASE_URL};
pub use endpoints::{EconomicSeries, OutputSize};
pub use error::{ClientConfigError, FetchError, FetchErrorKind};
pub use models::ListingEntry;
pub use payload::Payload;
pub use rate_limiter::{RateLimiter, DEFAULT_WINDOW};
pub use request::{functions, RequestParams, ResponseFormat, CREDENTIAL_PARAM};
pub use transport::{HttpTransport, RawResponse, Transport, TransportError};
