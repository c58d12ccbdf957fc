use std::collections::BTreeMap;
use std::fmt;

/// Query parameter carrying the credential; never part of a cache key or a log line.
pub const CREDENTIAL_PARAM: &str = "apikey";

/// Provider operation names
pub mod functions {
    pub const GLOBAL_QUOTE: &str = "GLOBAL_QUOTE";
    pub const TIME_SERIES_DAILY: &str = "TIME_SERIES_DAILY";
    pub const SMA: &str = "SMA";
    pub const ATR: &str = "ATR";
    pub const RSI: &str = "RSI";
    pub const STOCH: &str = "STOCH";
    pub const MACD: &str = "MACD";
    pub const OVERVIEW: &str = "OVERVIEW";
    pub const NEWS_SENTIMENT: &str = "NEWS_SENTIMENT";
    pub const FEDERAL_FUNDS_RATE: &str = "FEDERAL_FUNDS_RATE";
    pub const CPI: &str = "CPI";
    pub const LISTING_STATUS: &str = "LISTING_STATUS";
}

/// Expected body format of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Csv,
}

/// Parameters of one provider request, kept sorted by name.
///
/// Sorting makes two logically identical requests canonicalise to the same
/// cache key regardless of the order parameters were added in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestParams {
    params: BTreeMap<String, String>,
}

impl RequestParams {
    pub fn new(function: &str) -> Self {
        let mut params = BTreeMap::new();
        params.insert("function".to_string(), function.to_string());
        Self { params }
    }

    pub fn symbol(self, symbol: &str) -> Self {
        self.with("symbol", symbol)
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn function(&self) -> &str {
        self.get("function").unwrap_or("UNKNOWN")
    }

    /// Deterministic signature of every non-credential parameter.
    pub fn cache_key(&self) -> String {
        self.public_params()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Listing requests and explicit `datatype=csv` requests come back as CSV.
    pub fn response_format(&self) -> ResponseFormat {
        let csv_requested = self
            .get("datatype")
            .map(|d| d.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if csv_requested || self.function() == functions::LISTING_STATUS {
            ResponseFormat::Csv
        } else {
            ResponseFormat::Json
        }
    }

    /// Query pairs with the credential appended
    pub fn to_query(&self, api_key: &str) -> Vec<(String, String)> {
        let mut query: Vec<(String, String)> = self
            .public_params()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        query.push((CREDENTIAL_PARAM.to_string(), api_key.to_string()));
        query
    }

    fn public_params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .filter(|(k, _)| !k.eq_ignore_ascii_case(CREDENTIAL_PARAM))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for RequestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_key())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
