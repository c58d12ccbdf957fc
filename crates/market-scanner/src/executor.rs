//! One bounded batch of the market scan.

use std::sync::Arc;

use analysis_core::{tally_votes, Candidate, CandidateMetadata, QualificationSignal};
use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::ScanConfig;
use crate::signals::default_signals;
use crate::source::MarketDataSource;
use crate::state::{ScanStateError, SharedScanState};
use crate::watchlist::WatchlistStore;

/// Failure in the executor's own bookkeeping. Per-ticker data problems never
/// surface here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    #[error("Failed to persist scan progress: {0}")]
    State(#[from] ScanStateError),
}

/// Result of evaluating one ticker
#[derive(Debug, Clone, PartialEq)]
pub enum TickerOutcome {
    /// Failed the price/volume prefilter; no further fetches were made
    Rejected { price: f64, volume: f64 },
    /// Data missing or unusable
    Skipped(String),
    NotQualified { score: u32 },
    Qualified(Candidate),
}

/// Summary of one `run_step` call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub processed: usize,
    pub rejected: usize,
    pub skipped: usize,
    pub qualified: usize,
    /// A pause was observed before the batch finished
    pub interrupted: bool,
    /// The scan was reset or restarted mid-batch; nothing was saved
    pub superseded: bool,
    pub completed: bool,
}

impl StepReport {
    fn record(&mut self, outcome: &TickerOutcome) {
        self.processed += 1;
        match outcome {
            TickerOutcome::Rejected { .. } => self.rejected += 1,
            TickerOutcome::Skipped(_) => self.skipped += 1,
            TickerOutcome::Qualified(_) => self.qualified += 1,
            TickerOutcome::NotQualified { .. } => {}
        }
    }
}

pub struct ScanStepExecutor {
    source: Arc<dyn MarketDataSource>,
    signals: Vec<Box<dyn QualificationSignal>>,
    config: ScanConfig,
    watchlist: WatchlistStore,
    // Serializes steps against the same executor
    step_guard: Mutex<()>,
}

impl ScanStepExecutor {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        config: ScanConfig,
        watchlist: WatchlistStore,
    ) -> Self {
        Self::with_signals(source, default_signals(), config, watchlist)
    }

    pub fn with_signals(
        source: Arc<dyn MarketDataSource>,
        signals: Vec<Box<dyn QualificationSignal>>,
        config: ScanConfig,
        watchlist: WatchlistStore,
    ) -> Self {
        Self {
            source,
            signals,
            config,
            watchlist,
            step_guard: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn watchlist(&self) -> &WatchlistStore {
        &self.watchlist
    }

    /// Process the next batch of the scan held in `state`.
    ///
    /// Does nothing unless the scan is active. Progress is saved exactly once
    /// per call, either when the batch ends or when a pause is observed
    /// before the next ticker. Reaching the end of the universe completes the
    /// scan and publishes the candidates to the watch-list.
    ///
    /// A batch belongs to the run it was taken from. If the scan is reset or
    /// a new universe adopted while the batch is in flight, the batch is
    /// dropped without touching the state.
    pub async fn run_step(&self, state: &SharedScanState) -> Result<StepReport, ScanError> {
        let _guard = self.step_guard.lock().await;
        let mut report = StepReport::default();

        let (batch, start, total, run_id) = {
            let s = state.read().await;
            if !s.is_active() {
                return Ok(report);
            }
            let start = s.next_index();
            let total = s.universe().len();
            let end = (start + self.config.batch_size).min(total);
            (s.universe()[start..end].to_vec(), start, total, s.run_id())
        };
        let end = start + batch.len();

        let mut log = vec![format!(
            "Processing tickers {}..{} of {}",
            start + 1,
            end,
            total
        )];
        let mut found = Vec::new();
        let mut last_done = start.checked_sub(1);

        for (offset, ticker) in batch.iter().enumerate() {
            let (active, current_run) = {
                let s = state.read().await;
                (s.is_active(), s.run_id())
            };
            if current_run != run_id {
                return Ok(superseded(report));
            }
            if !active {
                let mut s = state.write().await;
                if s.run_id() != run_id {
                    return Ok(superseded(report));
                }
                log.push("Pause detected, stopping the current batch".to_string());
                s.save_progress(last_done, found, log)?;
                report.interrupted = true;
                tracing::info!(
                    "Scan paused after {} tickers in this batch",
                    report.processed
                );
                return Ok(report);
            }

            let outcome = self.evaluate(ticker).await;
            log.push(describe(ticker, &outcome, self.signals.len()));
            report.record(&outcome);
            if let TickerOutcome::Qualified(candidate) = outcome {
                found.push(candidate);
            }
            last_done = Some(start + offset);
        }

        let mut s = state.write().await;
        if s.run_id() != run_id {
            return Ok(superseded(report));
        }
        s.save_progress(last_done, found, log)?;

        if end == total {
            s.complete()?;
            let candidates = s.candidates().to_vec();
            drop(s);
            tracing::info!(
                "Scan completed over {} tickers, {} candidates qualified",
                total,
                candidates.len()
            );
            self.watchlist.publish(candidates).await;
            report.completed = true;
        } else {
            tracing::info!(
                "Scan step done: {}/{} tickers, {} qualified, {} rejected, {} skipped",
                end,
                total,
                report.qualified,
                report.rejected,
                report.skipped
            );
        }

        Ok(report)
    }

    /// Prefilter, then fetch signal data and tally the votes.
    pub async fn evaluate(&self, ticker: &str) -> TickerOutcome {
        let quote = match self.source.quote(ticker).await {
            Ok(q) => q,
            Err(e) => {
                tracing::warn!("Quote for {} unavailable: {}", ticker, e);
                return TickerOutcome::Skipped(format!("quote unavailable: {}", e));
            }
        };

        if !self.config.passes_prefilter(quote.price, quote.volume) {
            return TickerOutcome::Rejected {
                price: quote.price,
                volume: quote.volume,
            };
        }

        let inputs = match self.source.signal_inputs(ticker).await {
            Ok(inputs) => inputs,
            Err(e) => {
                tracing::warn!("Signal data for {} incomplete: {}", ticker, e);
                return TickerOutcome::Skipped(format!("incomplete signal data: {}", e));
            }
        };

        let price = inputs.latest_close().unwrap_or(quote.price);
        let (score, voters) = tally_votes(&self.signals, &inputs, price);
        if score < self.config.vote_quorum {
            return TickerOutcome::NotQualified { score };
        }

        TickerOutcome::Qualified(Candidate {
            ticker: ticker.to_string(),
            price,
            score,
            metadata: CandidateMetadata {
                signals: voters,
                max_score: self.signals.len() as u32,
                change_percent: quote.change_percent,
                volume: quote.volume,
                qualified_at: Utc::now(),
            },
        })
    }
}

fn superseded(mut report: StepReport) -> StepReport {
    tracing::info!(
        "Scan was reset during the batch, discarding {} evaluated tickers",
        report.processed
    );
    report.superseded = true;
    report
}

fn describe(ticker: &str, outcome: &TickerOutcome, max_score: usize) -> String {
    match outcome {
        TickerOutcome::Rejected { price, volume } => format!(
            "[{}] Rejected by prefilter: price ${:.2}, volume {}",
            ticker, price, volume
        ),
        TickerOutcome::Skipped(reason) => format!("[{}] Skipped: {}", ticker, reason),
        TickerOutcome::NotQualified { score } => {
            format!("[{}] Not qualified: score {}/{}", ticker, score, max_score)
        }
        TickerOutcome::Qualified(c) => format!(
            "[{}] Qualified: score {}/{} ({})",
            ticker,
            c.score,
            max_score,
            c.metadata.signals.join(", ")
        ),
    }
}
