use alphavantage_client::{FetchClient, FetchError, ListingEntry};

/// Active common stocks listed on `exchange`, in listing order
pub fn filter_listing(entries: &[ListingEntry], exchange: &str) -> Vec<String> {
    entries
        .iter()
        .filter(|e| {
            e.exchange.eq_ignore_ascii_case(exchange)
                && e.asset_type == "Stock"
                && e.status == "Active"
        })
        .map(|e| e.symbol.clone())
        .collect()
}

/// Download the listing and build the scan universe
pub async fn load_universe(
    client: &FetchClient,
    exchange: &str,
) -> Result<Vec<String>, FetchError> {
    tracing::info!("Downloading listing for {}", exchange);
    let entries = client.listing_status().await?;
    let universe = filter_listing(&entries, exchange);
    tracing::info!(
        "Universe loaded: {} of {} listed securities",
        universe.len(),
        entries.len()
    );
    Ok(universe)
}

/// Parse a comma separated ticker list (`SCAN_UNIVERSE`), dropping blanks
pub fn parse_universe(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(symbol: &str, exchange: &str, asset_type: &str, status: &str) -> ListingEntry {
        ListingEntry {
            symbol: symbol.to_string(),
            name: format!("{} Inc", symbol),
            exchange: exchange.to_string(),
            asset_type: asset_type.to_string(),
            ipo_date: None,
            delisting_date: None,
            status: status.to_string(),
        }
    }

    #[test]
    fn test_filter_listing_keeps_active_stocks_on_exchange() {
        let entries = vec![
            entry("AAA", "NASDAQ", "Stock", "Active"),
            entry("BBB", "NYSE", "Stock", "Active"),
            entry("CCC", "NASDAQ", "ETF", "Active"),
            entry("DDD", "NASDAQ", "Stock", "Delisted"),
            entry("EEE", "NASDAQ", "Stock", "Active"),
        ];
        assert_eq!(filter_listing(&entries, "NASDAQ"), vec!["AAA", "EEE"]);
    }

    #[test]
    fn test_parse_universe() {
        assert_eq!(parse_universe(" aaa, BBB,,ccc "), vec!["AAA", "BBB", "CCC"]);
        assert!(parse_universe("").is_empty());
    }
}
