use std::collections::HashMap;
use std::sync::Arc;

use analysis_core::Candidate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Fresh price data for a watch-list entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub price: f64,
    pub change_percent: Option<f64>,
}

#[derive(Debug, Default)]
struct Watchlist {
    candidates: Vec<Candidate>,
    published_at: Option<DateTime<Utc>>,
}

/// Finalized scan results ("Dream Team") shared with downstream consumers.
///
/// Clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct WatchlistStore {
    inner: Arc<RwLock<Watchlist>>,
}

impl WatchlistStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list with the candidates of a completed scan
    pub async fn publish(&self, candidates: Vec<Candidate>) {
        let mut list = self.inner.write().await;
        let tickers: Vec<&str> = candidates.iter().map(|c| c.ticker.as_str()).collect();
        tracing::info!("Watch-list updated with {} candidates: {:?}", tickers.len(), tickers);
        list.candidates = candidates;
        list.published_at = Some(Utc::now());
    }

    /// Candidates in qualification order
    pub async fn get_candidates(&self) -> Vec<Candidate> {
        self.inner.read().await.candidates.clone()
    }

    pub async fn tickers(&self) -> Vec<String> {
        self.inner
            .read()
            .await
            .candidates
            .iter()
            .map(|c| c.ticker.clone())
            .collect()
    }

    pub async fn published_at(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.published_at
    }

    /// Apply price updates to existing entries; unknown tickers are ignored.
    /// Returns how many entries changed.
    pub async fn update_prices(&self, updates: &HashMap<String, PriceUpdate>) -> usize {
        let mut list = self.inner.write().await;
        let mut updated = 0;
        for candidate in list.candidates.iter_mut() {
            if let Some(update) = updates.get(&candidate.ticker) {
                candidate.price = update.price;
                candidate.metadata.change_percent = update.change_percent;
                updated += 1;
            }
        }
        tracing::info!("Updated prices for {} watch-list entries", updated);
        updated
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.candidates.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::CandidateMetadata;

    fn candidate(ticker: &str, price: f64) -> Candidate {
        Candidate {
            ticker: ticker.to_string(),
            price,
            score: 2,
            metadata: CandidateMetadata {
                signals: vec![],
                max_score: 3,
                change_percent: None,
                volume: 150_000.0,
                qualified_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn test_publish_replaces_and_keeps_order() {
        let store = WatchlistStore::new();
        assert!(store.is_empty().await);
        assert!(store.published_at().await.is_none());

        store
            .publish(vec![candidate("BBB", 1.0), candidate("AAA", 2.0)])
            .await;
        assert_eq!(store.tickers().await, vec!["BBB", "AAA"]);
        assert!(store.published_at().await.is_some());

        store.publish(vec![candidate("CCC", 3.0)]).await;
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_prices_only_touches_known_tickers() {
        let store = WatchlistStore::new();
        store
            .publish(vec![candidate("AAA", 1.0), candidate("BBB", 2.0)])
            .await;

        let mut updates = HashMap::new();
        updates.insert(
            "BBB".to_string(),
            PriceUpdate {
                price: 2.4,
                change_percent: Some(20.0),
            },
        );
        updates.insert(
            "ZZZ".to_string(),
            PriceUpdate {
                price: 9.0,
                change_percent: None,
            },
        );

        assert_eq!(store.update_prices(&updates).await, 1);
        let candidates = store.get_candidates().await;
        assert_eq!(candidates[0].price, 1.0);
        assert_eq!(candidates[1].price, 2.4);
        assert_eq!(candidates[1].metadata.change_percent, Some(20.0));
    }
}
