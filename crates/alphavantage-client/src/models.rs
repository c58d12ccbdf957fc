//! Typed parsing of provider payloads.
//!
//! Every parser validates at the boundary: a missing section or an
//! unparseable number becomes `FetchError::Malformed`, an empty section
//! becomes `FetchError::NotFound`.

use std::collections::HashMap;

use analysis_core::stats::parse_number;
use analysis_core::{
    CompanyOverview, DailyBar, EconomicObservation, IndicatorPoint, IndicatorSeries,
    NewsSentiment, Quote,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FetchError;

const DAILY_SECTION: &str = "Time Series (Daily)";
const INDICATOR_SECTION_PREFIX: &str = "Technical Analysis";

#[derive(Debug, Deserialize)]
struct GlobalQuoteEnvelope {
    #[serde(rename = "Global Quote")]
    quote: RawQuote,
}

#[derive(Debug, Deserialize)]
struct RawQuote {
    #[serde(rename = "01. symbol")]
    symbol: String,
    #[serde(rename = "05. price")]
    price: String,
    #[serde(rename = "06. volume")]
    volume: String,
    #[serde(rename = "07. latest trading day", default)]
    latest_trading_day: Option<String>,
    #[serde(rename = "10. change percent", default)]
    change_percent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDailyBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

#[derive(Debug, Deserialize)]
struct RawOverview {
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Sector", default)]
    sector: Option<String>,
    #[serde(rename = "PERatio", default)]
    pe_ratio: Option<String>,
    #[serde(rename = "PriceToBookRatio", default)]
    price_to_book: Option<String>,
    #[serde(rename = "EPS", default)]
    eps: Option<String>,
    #[serde(rename = "Beta", default)]
    beta: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawNewsFeed {
    #[serde(default)]
    feed: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    #[serde(default)]
    ticker_sentiment: Vec<RawTickerSentiment>,
}

#[derive(Debug, Deserialize)]
struct RawTickerSentiment {
    ticker: String,
    ticker_sentiment_score: String,
}

#[derive(Debug, Deserialize)]
struct RawEconomicSeries {
    #[serde(default)]
    data: Vec<RawObservation>,
}

#[derive(Debug, Deserialize)]
struct RawObservation {
    date: String,
    value: String,
}

/// One row of the listing CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingEntry {
    pub symbol: String,
    pub name: String,
    pub exchange: String,
    #[serde(rename = "assetType")]
    pub asset_type: String,
    #[serde(rename = "ipoDate", default)]
    pub ipo_date: Option<String>,
    #[serde(rename = "delistingDate", default)]
    pub delisting_date: Option<String>,
    pub status: String,
}

fn number(raw: &str, field: &str) -> Result<f64, FetchError> {
    parse_number(raw)
        .ok_or_else(|| FetchError::Malformed(format!("{}: not a number: {:?}", field, raw)))
}

fn date(raw: &str) -> Result<NaiveDate, FetchError> {
    // Intraday indicator keys carry a time suffix ("2024-01-02 16:00").
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|_| FetchError::Malformed(format!("bad date: {:?}", raw)))
}

fn malformed(e: serde_json::Error) -> FetchError {
    FetchError::Malformed(e.to_string())
}

pub fn parse_quote(value: &Value) -> Result<Quote, FetchError> {
    let envelope = GlobalQuoteEnvelope::deserialize(value).map_err(malformed)?;
    let raw = envelope.quote;

    Ok(Quote {
        price: number(&raw.price, "price")?,
        volume: number(&raw.volume, "volume")?,
        change_percent: raw.change_percent.as_deref().and_then(parse_number),
        latest_trading_day: raw.latest_trading_day.as_deref().and_then(|d| date(d).ok()),
        symbol: raw.symbol,
    })
}

/// Daily bars, newest first
pub fn parse_daily_series(value: &Value, symbol: &str) -> Result<Vec<DailyBar>, FetchError> {
    let section = value
        .get(DAILY_SECTION)
        .ok_or_else(|| FetchError::Malformed(format!("missing '{}'", DAILY_SECTION)))?;
    let rows = HashMap::<String, RawDailyBar>::deserialize(section).map_err(malformed)?;
    if rows.is_empty() {
        return Err(FetchError::NotFound(symbol.to_string()));
    }

    let mut bars = rows
        .into_iter()
        .map(|(day, raw)| {
            Ok(DailyBar {
                date: date(&day)?,
                open: number(&raw.open, "open")?,
                high: number(&raw.high, "high")?,
                low: number(&raw.low, "low")?,
                close: number(&raw.close, "close")?,
                volume: number(&raw.volume, "volume")?,
            })
        })
        .collect::<Result<Vec<_>, FetchError>>()?;
    bars.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(bars)
}

/// One named column of a "Technical Analysis: X" section, newest first
pub fn parse_indicator(
    value: &Value,
    value_key: &str,
    symbol: &str,
) -> Result<IndicatorSeries, FetchError> {
    let section = value
        .as_object()
        .and_then(|map| {
            map.iter()
                .find(|(k, _)| k.starts_with(INDICATOR_SECTION_PREFIX))
                .map(|(_, v)| v)
        })
        .and_then(Value::as_object)
        .ok_or_else(|| FetchError::Malformed("missing technical analysis section".to_string()))?;
    if section.is_empty() {
        return Err(FetchError::NotFound(symbol.to_string()));
    }

    let points = section
        .iter()
        .map(|(day, row)| {
            let raw = row
                .get(value_key)
                .and_then(Value::as_str)
                .ok_or_else(|| FetchError::Malformed(format!("missing '{}'", value_key)))?;
            Ok(IndicatorPoint {
                date: date(day)?,
                value: number(raw, value_key)?,
            })
        })
        .collect::<Result<Vec<_>, FetchError>>()?;
    Ok(IndicatorSeries::new(value_key, points))
}

pub fn parse_overview(value: &Value) -> Result<CompanyOverview, FetchError> {
    let raw = RawOverview::deserialize(value).map_err(malformed)?;
    Ok(CompanyOverview {
        symbol: raw.symbol,
        name: raw.name.filter(|n| !n.is_empty()),
        sector: raw.sector.filter(|s| !s.is_empty() && s != "None"),
        pe_ratio: raw.pe_ratio.as_deref().and_then(parse_number),
        price_to_book: raw.price_to_book.as_deref().and_then(parse_number),
        eps: raw.eps.as_deref().and_then(parse_number),
        beta: raw.beta.as_deref().and_then(parse_number),
    })
}

/// Sentiment scores mentioning `symbol` across the feed. Unparseable scores
/// are dropped rather than failing the whole feed.
pub fn parse_news_sentiment(value: &Value, symbol: &str) -> Result<NewsSentiment, FetchError> {
    let raw = RawNewsFeed::deserialize(value).map_err(malformed)?;
    let scores = raw
        .feed
        .iter()
        .flat_map(|article| article.ticker_sentiment.iter())
        .filter(|ts| ts.ticker.eq_ignore_ascii_case(symbol))
        .filter_map(|ts| parse_number(&ts.ticker_sentiment_score))
        .collect();
    Ok(NewsSentiment {
        symbol: symbol.to_string(),
        scores,
    })
}

/// Most recent parseable observation of an economic series
pub fn parse_latest_observation(
    value: &Value,
    series: &str,
) -> Result<EconomicObservation, FetchError> {
    let raw = RawEconomicSeries::deserialize(value).map_err(malformed)?;
    raw.data
        .iter()
        .filter_map(|obs| {
            let value = parse_number(&obs.value)?;
            let date = date(&obs.date).ok()?;
            Some(EconomicObservation { date, value })
        })
        .max_by_key(|obs| obs.date)
        .ok_or_else(|| FetchError::NotFound(series.to_string()))
}

pub fn parse_listing(csv_text: &str) -> Result<Vec<ListingEntry>, FetchError> {
    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
    reader
        .deserialize::<ListingEntry>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| FetchError::Malformed(format!("listing csv: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_quote() {
        let value = json!({
            "Global Quote": {
                "01. symbol": "ABCD",
                "02. open": "2.9000",
                "05. price": "3.1000",
                "06. volume": "250000",
                "07. latest trading day": "2024-05-03",
                "10. change percent": "2.5000%"
            }
        });
        let quote = parse_quote(&value).unwrap();
        assert_eq!(quote.symbol, "ABCD");
        assert_eq!(quote.price, 3.1);
        assert_eq!(quote.volume, 250000.0);
        assert_eq!(quote.change_percent, Some(2.5));
        assert_eq!(
            quote.latest_trading_day,
            NaiveDate::from_ymd_opt(2024, 5, 3)
        );
    }

    #[test]
    fn test_parse_quote_bad_price_is_malformed() {
        let value = json!({
            "Global Quote": {"01. symbol": "ABCD", "05. price": "n/a", "06. volume": "1"}
        });
        assert!(matches!(parse_quote(&value), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_parse_daily_series_sorted_newest_first() {
        let value = json!({
            "Meta Data": {},
            "Time Series (Daily)": {
                "2024-05-01": {"1. open": "1", "2. high": "2", "3. low": "0.5", "4. close": "1.5", "5. volume": "100"},
                "2024-05-03": {"1. open": "1", "2. high": "2", "3. low": "0.5", "4. close": "1.7", "5. volume": "100"},
                "2024-05-02": {"1. open": "1", "2. high": "2", "3. low": "0.5", "4. close": "1.6", "5. volume": "100"}
            }
        });
        let bars = parse_daily_series(&value, "ABCD").unwrap();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.7, 1.6, 1.5]);
    }

    #[test]
    fn test_parse_indicator_named_column() {
        let value = json!({
            "Meta Data": {},
            "Technical Analysis: MACD": {
                "2024-05-02": {"MACD": "0.1", "MACD_Hist": "0.02", "MACD_Signal": "0.08"},
                "2024-05-03": {"MACD": "0.2", "MACD_Hist": "0.05", "MACD_Signal": "0.15"}
            }
        });
        let series = parse_indicator(&value, "MACD_Hist", "ABCD").unwrap();
        assert_eq!(series.latest(), Some(0.05));
        assert_eq!(series.points.len(), 2);

        assert!(matches!(
            parse_indicator(&value, "SlowK", "ABCD"),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_overview_treats_none_as_missing() {
        let value = json!({
            "Symbol": "ABCD",
            "Name": "Abcd Corp",
            "Sector": "TECHNOLOGY",
            "PERatio": "None",
            "PriceToBookRatio": "0.9",
            "EPS": "0.12",
            "Beta": "-"
        });
        let overview = parse_overview(&value).unwrap();
        assert_eq!(overview.pe_ratio, None);
        assert_eq!(overview.price_to_book, Some(0.9));
        assert_eq!(overview.beta, None);
    }

    #[test]
    fn test_parse_news_sentiment_filters_by_ticker() {
        let value = json!({
            "feed": [
                {"ticker_sentiment": [
                    {"ticker": "ABCD", "ticker_sentiment_score": "0.25"},
                    {"ticker": "ZZZ", "ticker_sentiment_score": "-0.9"}
                ]},
                {"ticker_sentiment": [{"ticker": "ABCD", "ticker_sentiment_score": "0.15"}]}
            ]
        });
        let sentiment = parse_news_sentiment(&value, "ABCD").unwrap();
        assert_eq!(sentiment.scores, vec![0.25, 0.15]);
    }

    #[test]
    fn test_parse_latest_observation_skips_placeholders() {
        let value = json!({
            "name": "CPI",
            "data": [
                {"date": "2024-04-01", "value": "."},
                {"date": "2024-03-01", "value": "3.5"},
                {"date": "2024-02-01", "value": "3.2"}
            ]
        });
        let obs = parse_latest_observation(&value, "CPI").unwrap();
        assert_eq!(obs.value, 3.5);

        let empty = json!({"name": "CPI", "data": []});
        assert!(matches!(
            parse_latest_observation(&empty, "CPI"),
            Err(FetchError::NotFound(_))
        ));
    }

    #[test]
    fn test_parse_listing_rows() {
        let csv_text = "symbol,name,exchange,assetType,ipoDate,delistingDate,status\n\
AAA,Alpha Inc,NASDAQ,Stock,2010-01-04,null,Active\n\
BBB,Beta ETF,NYSE ARCA,ETF,2012-05-01,null,Active\n";
        let rows = parse_listing(csv_text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol, "AAA");
        assert_eq!(rows[1].asset_type, "ETF");
    }
}
