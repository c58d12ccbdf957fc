use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ClientConfigError;

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Retry and backoff policy applied by `FetchClient`
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts per fetch, including the first one
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
    /// Fixed pause after the provider reports throttling
    pub throttle_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_millis(500),
            backoff_cap: Duration::from_secs(8),
            throttle_cooldown: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// `base * 2^attempt`, capped
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.backoff_base
            .saturating_mul(factor)
            .min(self.backoff_cap)
    }
}

/// Provider client settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub requests_per_minute: usize,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            requests_per_minute: 75,
            cache_ttl: Duration::from_secs(300),
            request_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_env() -> Result<Self, ClientConfigError> {
        let api_key = env::var("ALPHA_VANTAGE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ClientConfigError::MissingApiKey)?;

        let defaults = RetryPolicy::default();
        let config = Self {
            api_key,
            base_url: env::var("ALPHA_VANTAGE_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            requests_per_minute: env_or("ALPHA_VANTAGE_RATE_LIMIT", 75)?,
            cache_ttl: Duration::from_secs(env_or("FETCH_CACHE_TTL_SECS", 300)?),
            request_timeout: Duration::from_secs(env_or("FETCH_TIMEOUT_SECS", 10)?),
            retry: RetryPolicy {
                max_retries: env_or("FETCH_MAX_RETRIES", defaults.max_retries)?,
                backoff_base: Duration::from_millis(env_or("FETCH_BACKOFF_BASE_MS", 500)?),
                backoff_cap: Duration::from_millis(env_or("FETCH_BACKOFF_CAP_MS", 8000)?),
                throttle_cooldown: Duration::from_secs(env_or(
                    "FETCH_THROTTLE_COOLDOWN_SECS",
                    2,
                )?),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ClientConfigError::MissingApiKey);
        }
        if self.requests_per_minute == 0 {
            return Err(ClientConfigError::ZeroRateLimit);
        }
        Ok(())
    }

    /// First characters of the key, safe for startup logs
    pub fn masked_key(&self) -> String {
        let prefix: String = self.api_key.chars().take(5).collect();
        format!("{}...", prefix)
    }
}

fn env_or<T: FromStr>(var: &str, default: T) -> Result<T, ClientConfigError> {
    match env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|_| ClientConfigError::InvalidValue {
            var: var.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            backoff_base: Duration::from_millis(100),
            backoff_cap: Duration::from_millis(500),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff_for(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(400));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(40), Duration::from_millis(500));
    }

    #[test]
    fn test_validate_rejects_zero_rate_and_blank_key() {
        let mut config = ClientConfig::new("demo");
        assert!(config.validate().is_ok());
        config.requests_per_minute = 0;
        assert_eq!(config.validate(), Err(ClientConfigError::ZeroRateLimit));
        let blank = ClientConfig::new("  ");
        assert_eq!(blank.validate(), Err(ClientConfigError::MissingApiKey));
    }

    #[test]
    fn test_masked_key_only_shows_prefix() {
        let config = ClientConfig::new("ABCDEFGHIJ");
        assert_eq!(config.masked_key(), "ABCDE...");
    }
}
