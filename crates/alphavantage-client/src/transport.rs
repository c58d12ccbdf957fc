use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

/// Status, content type and body of one HTTP round-trip
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: Some("application/json".to_string()),
            body: body.into(),
        }
    }

    pub fn csv(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: Some("application/x-download".to_string()),
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: String::new(),
        }
    }
}

/// Failure below HTTP: the request never produced a status line.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

/// One network round-trip to the provider.
///
/// `FetchClient` owns rate limiting, caching and retries; a transport only
/// moves bytes and must enforce its own per-call deadline.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, query: &[(String, String)]) -> Result<RawResponse, TransportError>;
}

/// `reqwest`-backed transport against the provider's query endpoint
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, query: &[(String, String)]) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(query)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(map_reqwest_error)?;

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

// The URL carries the credential, so it is stripped before the error is rendered.
fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.without_url().to_string())
    } else {
        TransportError::Other(e.without_url().to_string())
    }
}
