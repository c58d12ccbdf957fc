use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::cache::ResponseCache;
use crate::config::{ClientConfig, RetryPolicy};
use crate::error::{ClientConfigError, FetchError};
use crate::payload::Payload;
use crate::rate_limiter::RateLimiter;
use crate::request::{RequestParams, ResponseFormat};
use crate::transport::{HttpTransport, RawResponse, Transport, TransportError};

/// Section of time-series payloads that is present even when no data exists.
const META_SECTION: &str = "Meta Data";

/// Classification of a single network attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(Payload),
    /// HTTP 429 or an in-payload throttle notice
    RateLimited(String),
    NotFound(String),
    Transport(String),
    Http(u16),
    Provider(String),
    Malformed(String),
}

/// Rate-limited, caching, retrying client for the provider's query endpoint.
///
/// Clones share the limiter window, the cache and the call counter.
#[derive(Clone)]
pub struct FetchClient {
    api_key: String,
    transport: Arc<dyn Transport>,
    rate_limiter: RateLimiter,
    cache: ResponseCache,
    retry: RetryPolicy,
    network_calls: Arc<AtomicU64>,
}

impl FetchClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientConfigError> {
        config.validate()?;
        let transport = HttpTransport::new(config.base_url.clone(), config.request_timeout);
        Ok(Self::from_parts(
            config.api_key.clone(),
            Arc::new(transport),
            RateLimiter::per_minute(config.requests_per_minute)?,
            ResponseCache::new(config.cache_ttl),
            config.retry.clone(),
        ))
    }

    pub fn from_parts(
        api_key: impl Into<String>,
        transport: Arc<dyn Transport>,
        rate_limiter: RateLimiter,
        cache: ResponseCache,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            transport,
            rate_limiter,
            cache,
            retry,
            network_calls: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Network round-trips performed so far (cache hits excluded)
    pub fn network_calls(&self) -> u64 {
        self.network_calls.load(Ordering::Relaxed)
    }

    /// `fetch` with the configured attempt count
    pub async fn request(&self, params: &RequestParams) -> Result<Payload, FetchError> {
        self.fetch(params, self.retry.max_retries).await
    }

    /// Fetch `params`, serving from cache when a live entry exists.
    ///
    /// `max_retries` is the total number of network attempts (at least one).
    /// Each attempt takes exactly one rate-limit slot; backoff and cooldown
    /// sleeps do not.
    pub async fn fetch(
        &self,
        params: &RequestParams,
        max_retries: u32,
    ) -> Result<Payload, FetchError> {
        let key = params.cache_key();
        if let Some(payload) = self.cache.get(&key) {
            tracing::debug!("Cache hit for {}", key);
            return Ok(payload);
        }

        let attempts = max_retries.max(1);
        let format = params.response_format();
        let label = params.get("symbol").unwrap_or(params.function()).to_string();
        let query = params.to_query(&self.api_key);

        for attempt in 0..attempts {
            let is_last = attempt + 1 == attempts;

            self.rate_limiter.acquire().await;
            self.network_calls.fetch_add(1, Ordering::Relaxed);
            let result = self.transport.get(&query).await;

            match classify(result, format, &label) {
                FetchOutcome::Success(payload) => {
                    self.cache.put(key, payload.clone());
                    return Ok(payload);
                }
                FetchOutcome::Transport(msg) => {
                    if is_last {
                        tracing::error!(
                            "{} failed after {} attempts: {}",
                            params.function(),
                            attempts,
                            msg
                        );
                        return Err(FetchError::Transport(msg));
                    }
                    let wait = self.retry.backoff_for(attempt);
                    tracing::warn!(
                        "{} transport error ({}), retry {}/{} in {:.1}s",
                        params.function(),
                        msg,
                        attempt + 1,
                        attempts,
                        wait.as_secs_f64()
                    );
                    tokio::time::sleep(wait).await;
                }
                FetchOutcome::RateLimited(note) => {
                    if is_last {
                        break;
                    }
                    tracing::warn!(
                        "{} throttled by provider ({}), cooling down {}s before retry {}/{}",
                        params.function(),
                        note,
                        self.retry.throttle_cooldown.as_secs(),
                        attempt + 1,
                        attempts
                    );
                    tokio::time::sleep(self.retry.throttle_cooldown).await;
                }
                FetchOutcome::NotFound(what) => return Err(FetchError::NotFound(what)),
                FetchOutcome::Http(status) => return Err(FetchError::Http { status }),
                FetchOutcome::Provider(msg) => return Err(FetchError::Provider(msg)),
                FetchOutcome::Malformed(msg) => return Err(FetchError::Malformed(msg)),
            }
        }

        tracing::error!("{} for {}: retries exhausted", params.function(), label);
        Err(FetchError::RetriesExhausted { attempts })
    }
}

/// Map one raw attempt onto a `FetchOutcome`.
///
/// HTTP status is checked first, then in-payload markers. CSV requests pass
/// the body through untouched unless the provider answered with a JSON
/// error document instead.
pub fn classify(
    result: Result<RawResponse, TransportError>,
    format: ResponseFormat,
    label: &str,
) -> FetchOutcome {
    let response = match result {
        Ok(r) => r,
        Err(e) => return FetchOutcome::Transport(e.to_string()),
    };

    if response.status == 429 {
        return FetchOutcome::RateLimited("HTTP 429".to_string());
    }
    if !(200..300).contains(&response.status) {
        return FetchOutcome::Http(response.status);
    }

    let body = response.body.trim_start();
    let looks_like_json = body.starts_with('{');

    if format == ResponseFormat::Csv && !looks_like_json {
        if body.trim().is_empty() {
            return FetchOutcome::NotFound(label.to_string());
        }
        return FetchOutcome::Success(Payload::Text(Arc::from(response.body.as_str())));
    }

    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => return FetchOutcome::Malformed(format!("invalid JSON: {}", e)),
    };

    if let Some(msg) = value.get("Error Message").and_then(Value::as_str) {
        return FetchOutcome::Provider(msg.to_string());
    }
    for marker in ["Note", "Information"] {
        if let Some(note) = value.get(marker).and_then(Value::as_str) {
            return FetchOutcome::RateLimited(note.to_string());
        }
    }

    match &value {
        Value::Object(map) => {
            let has_data = map
                .iter()
                .any(|(k, v)| k != META_SECTION && !is_empty_section(v));
            if !has_data {
                return FetchOutcome::NotFound(label.to_string());
            }
        }
        Value::Array(items) if items.is_empty() => {
            return FetchOutcome::NotFound(label.to_string());
        }
        Value::Array(_) => {}
        _ => return FetchOutcome::Malformed("expected a JSON object".to_string()),
    }

    FetchOutcome::Success(Payload::Json(Arc::new(value)))
}

fn is_empty_section(v: &Value) -> bool {
    match v {
        Value::Object(m) => m.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Null => true,
        _ => false,
    }
}
