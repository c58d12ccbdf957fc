use thiserror::Error;

/// Coarse classification of a terminal fetch failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    Transport,
    Http,
    Provider,
    Malformed,
    NotFound,
    RetriesExhausted,
}

/// Terminal failure of `FetchClient::fetch` after its own retries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}")]
    Http { status: u16 },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("No data: {0}")]
    NotFound(String),

    #[error("Retries exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Transport(_) => FetchErrorKind::Transport,
            FetchError::Http { .. } => FetchErrorKind::Http,
            FetchError::Provider(_) => FetchErrorKind::Provider,
            FetchError::Malformed(_) => FetchErrorKind::Malformed,
            FetchError::NotFound(_) => FetchErrorKind::NotFound,
            FetchError::RetriesExhausted { .. } => FetchErrorKind::RetriesExhausted,
        }
    }

    /// True when a later attempt could plausibly succeed (network trouble or
    /// throttling), false for permanent answers from the provider.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Transport(_) | FetchError::RetriesExhausted { .. }
        )
    }
}

/// Invalid client construction parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientConfigError {
    #[error("Rate limit must allow at least one request per window")]
    ZeroRateLimit,

    #[error("Rate window must be non-zero")]
    ZeroWindow,

    #[error("API key is required")]
    MissingApiKey,

    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },
}
