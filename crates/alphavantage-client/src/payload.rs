use std::sync::Arc;

use serde_json::Value;

use crate::error::FetchError;

/// Body of a successful provider response.
///
/// Structured operations yield `Json`; the listing operation yields raw CSV
/// `Text`. Both are reference-counted so cache hits are cheap to hand out.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Arc<Value>),
    Text(Arc<str>),
}

impl Payload {
    pub fn as_json(&self) -> Result<&Value, FetchError> {
        match self {
            Payload::Json(v) => Ok(v),
            Payload::Text(_) => Err(FetchError::Malformed(
                "expected a JSON payload, got text".to_string(),
            )),
        }
    }

    pub fn as_text(&self) -> Result<&str, FetchError> {
        match self {
            Payload::Text(t) => Ok(t),
            Payload::Json(_) => Err(FetchError::Malformed(
                "expected a text payload, got JSON".to_string(),
            )),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Payload::Text(_))
    }
}
