//! Scan state machine
//!
//! `ScanState` is the single durable record of a market scan. Every mutator
//! validates before it touches anything, so a rejected transition leaves the
//! state exactly as it was.

use std::collections::VecDeque;
use std::sync::Arc;

use analysis_core::Candidate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

/// Maximum number of log lines retained
pub const LOG_CAPACITY: usize = 100;

/// Shared handle: one writer at a time, readers get a consistent snapshot.
pub type SharedScanState = Arc<RwLock<ScanState>>;

/// Observable lifecycle phase, derived from the flags and cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanPhase {
    Idle,
    Active,
    Paused,
    Completed,
}

/// How `start` treated the call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Adopted a new universe
    Fresh,
    /// Continued from the saved cursor
    Resumed,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanStateError {
    #[error("scan already completed; reset before starting a new one")]
    AlreadyCompleted,

    #[error("cannot start a scan over an empty universe")]
    EmptyUniverse,

    #[error("scan is not active")]
    NotActive,

    #[error("scan has not been started")]
    NotStarted,

    #[error("cannot reset an active scan; pause it first")]
    ResetWhileActive,

    #[error("cursor would move backwards from {current} to {requested}")]
    CursorRegression { current: usize, requested: usize },

    #[error("cursor {cursor} is outside a universe of {len} tickers")]
    CursorOutOfRange { cursor: usize, len: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanState {
    is_active: bool,
    is_completed: bool,
    universe: Vec<String>,
    /// Index of the last fully processed ticker; `None` before the first one
    cursor: Option<usize>,
    candidates: Vec<Candidate>,
    log: VecDeque<String>,
    /// Changes whenever a new universe is adopted or the scan is reset
    run_id: u64,
}

/// Point-in-time copy of a `ScanState` for status callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanStatus {
    pub phase: ScanPhase,
    pub is_active: bool,
    pub is_completed: bool,
    pub cursor: Option<usize>,
    pub processed: usize,
    pub total: usize,
    pub candidates: Vec<Candidate>,
    pub log: Vec<String>,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedScanState {
        Arc::new(RwLock::new(self))
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn universe(&self) -> &[String] {
        &self.universe
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn log(&self) -> impl Iterator<Item = &str> {
        self.log.iter().map(String::as_str)
    }

    /// Identifies the current run; work captured under another id is stale
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    /// First index not yet processed
    pub fn next_index(&self) -> usize {
        self.cursor.map_or(0, |c| c + 1)
    }

    pub fn phase(&self) -> ScanPhase {
        if self.is_completed {
            ScanPhase::Completed
        } else if self.is_active {
            ScanPhase::Active
        } else if self.universe.is_empty() {
            ScanPhase::Idle
        } else {
            ScanPhase::Paused
        }
    }

    pub fn status(&self) -> ScanStatus {
        ScanStatus {
            phase: self.phase(),
            is_active: self.is_active,
            is_completed: self.is_completed,
            cursor: self.cursor,
            processed: self.next_index(),
            total: self.universe.len(),
            candidates: self.candidates.clone(),
            log: self.log.iter().cloned().collect(),
        }
    }

    /// Begin a scan over `universe`, or resume the one in progress.
    ///
    /// Before any ticker has been processed the universe is (re)adopted and
    /// candidates and log are cleared. Once the cursor has advanced the saved
    /// universe and candidates are kept and `universe` is ignored. Starting an
    /// already active scan is a no-op.
    pub fn start(&mut self, universe: Vec<String>) -> Result<StartMode, ScanStateError> {
        if self.is_completed {
            return Err(ScanStateError::AlreadyCompleted);
        }
        if self.is_active {
            return Ok(StartMode::Resumed);
        }
        if self.cursor.is_some() {
            self.is_active = true;
            self.push_log(format!(
                "Resuming scan at ticker {} of {}",
                self.next_index() + 1,
                self.universe.len()
            ));
            return Ok(StartMode::Resumed);
        }
        if universe.is_empty() {
            return Err(ScanStateError::EmptyUniverse);
        }

        let total = universe.len();
        self.run_id = self.run_id.wrapping_add(1);
        self.universe = universe;
        self.candidates.clear();
        self.log.clear();
        self.is_active = true;
        self.is_completed = false;
        self.push_log(format!("Starting scan over {} tickers", total));
        Ok(StartMode::Fresh)
    }

    pub fn pause(&mut self) -> Result<(), ScanStateError> {
        if !self.is_active {
            return Err(ScanStateError::NotActive);
        }
        self.is_active = false;
        self.push_log("Scan paused".to_string());
        Ok(())
    }

    /// Append a batch's results and move the cursor to `new_cursor`.
    ///
    /// `new_cursor` may equal the current cursor (no ticker finished) but never
    /// move backwards or past the end of the universe.
    pub fn save_progress(
        &mut self,
        new_cursor: Option<usize>,
        new_candidates: Vec<Candidate>,
        log_lines: Vec<String>,
    ) -> Result<(), ScanStateError> {
        match (self.cursor, new_cursor) {
            (Some(current), None) => {
                return Err(ScanStateError::CursorRegression {
                    current,
                    requested: 0,
                });
            }
            (Some(current), Some(requested)) if requested < current => {
                return Err(ScanStateError::CursorRegression { current, requested });
            }
            (_, Some(requested)) if requested >= self.universe.len() => {
                return Err(ScanStateError::CursorOutOfRange {
                    cursor: requested,
                    len: self.universe.len(),
                });
            }
            _ => {}
        }

        self.cursor = new_cursor;
        self.candidates.extend(new_candidates);
        for line in log_lines {
            self.push_log(line);
        }
        Ok(())
    }

    /// Mark the scan finished; the accumulated candidates become final.
    pub fn complete(&mut self) -> Result<(), ScanStateError> {
        if self.universe.is_empty() {
            return Err(ScanStateError::NotStarted);
        }
        self.is_completed = true;
        self.is_active = false;
        self.push_log(format!(
            "Scan completed: {} candidates qualified",
            self.candidates.len()
        ));
        Ok(())
    }

    /// Return to `Idle`, discarding universe, cursor, candidates and log.
    pub fn reset(&mut self) -> Result<(), ScanStateError> {
        if self.is_active {
            return Err(ScanStateError::ResetWhileActive);
        }
        *self = Self {
            run_id: self.run_id.wrapping_add(1),
            ..Self::default()
        };
        Ok(())
    }

    fn push_log(&mut self, line: String) {
        if self.log.len() == LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::CandidateMetadata;
    use chrono::Utc;

    fn universe(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("T{}", i)).collect()
    }

    fn candidate(ticker: &str) -> Candidate {
        Candidate {
            ticker: ticker.to_string(),
            price: 2.5,
            score: 2,
            metadata: CandidateMetadata {
                signals: vec!["momentum".into(), "volatility".into()],
                max_score: 3,
                change_percent: None,
                volume: 200_000.0,
                qualified_at: Utc::now(),
            },
        }
    }

    #[test]
    fn test_fresh_start_adopts_universe() {
        let mut state = ScanState::new();
        assert_eq!(state.phase(), ScanPhase::Idle);
        assert_eq!(state.start(universe(3)).unwrap(), StartMode::Fresh);
        assert_eq!(state.phase(), ScanPhase::Active);
        assert_eq!(state.universe().len(), 3);
        assert_eq!(state.cursor(), None);
        assert_eq!(state.next_index(), 0);
    }

    #[test]
    fn test_start_rejects_empty_universe_and_completed_scan() {
        let mut state = ScanState::new();
        assert_eq!(state.start(vec![]), Err(ScanStateError::EmptyUniverse));
        assert_eq!(state.phase(), ScanPhase::Idle);

        state.start(universe(1)).unwrap();
        state.save_progress(Some(0), vec![], vec![]).unwrap();
        state.complete().unwrap();
        assert_eq!(
            state.start(universe(2)),
            Err(ScanStateError::AlreadyCompleted)
        );
    }

    #[test]
    fn test_resume_keeps_universe_and_candidates() {
        let mut state = ScanState::new();
        state.start(universe(4)).unwrap();
        state
            .save_progress(Some(1), vec![candidate("T1")], vec!["batch".into()])
            .unwrap();
        state.pause().unwrap();
        assert_eq!(state.phase(), ScanPhase::Paused);

        assert_eq!(state.start(universe(9)).unwrap(), StartMode::Resumed);
        assert_eq!(state.universe().len(), 4);
        assert_eq!(state.candidates().len(), 1);
        assert_eq!(state.next_index(), 2);
    }

    #[test]
    fn test_pause_before_first_ticker_allows_new_universe() {
        let mut state = ScanState::new();
        state.start(universe(4)).unwrap();
        state.pause().unwrap();
        assert_eq!(state.start(universe(2)).unwrap(), StartMode::Fresh);
        assert_eq!(state.universe().len(), 2);
    }

    #[test]
    fn test_pause_requires_active() {
        let mut state = ScanState::new();
        assert_eq!(state.pause(), Err(ScanStateError::NotActive));
    }

    #[test]
    fn test_save_progress_rejects_regression_and_overflow() {
        let mut state = ScanState::new();
        state.start(universe(3)).unwrap();
        state.save_progress(Some(1), vec![candidate("T0")], vec![]).unwrap();

        let before = state.clone();
        assert_eq!(
            state.save_progress(Some(0), vec![candidate("X")], vec![]),
            Err(ScanStateError::CursorRegression {
                current: 1,
                requested: 0
            })
        );
        assert_eq!(
            state.save_progress(None, vec![], vec![]),
            Err(ScanStateError::CursorRegression {
                current: 1,
                requested: 0
            })
        );
        assert_eq!(
            state.save_progress(Some(3), vec![], vec![]),
            Err(ScanStateError::CursorOutOfRange { cursor: 3, len: 3 })
        );
        assert_eq!(state, before);

        // Same cursor is allowed (pause before finishing another ticker)
        state.save_progress(Some(1), vec![], vec!["paused".into()]).unwrap();
        assert_eq!(state.candidates().len(), 1);
    }

    #[test]
    fn test_log_is_capped() {
        let mut state = ScanState::new();
        state.start(universe(1)).unwrap();
        let lines: Vec<String> = (0..150).map(|i| format!("line {}", i)).collect();
        state.save_progress(None, vec![], lines).unwrap();
        let log: Vec<&str> = state.log().collect();
        assert_eq!(log.len(), LOG_CAPACITY);
        assert_eq!(log.last(), Some(&"line 149"));
        assert_eq!(log.first(), Some(&"line 50"));
    }

    #[test]
    fn test_complete_then_reset() {
        let mut state = ScanState::new();
        assert_eq!(state.complete(), Err(ScanStateError::NotStarted));

        state.start(universe(2)).unwrap();
        assert_eq!(state.reset(), Err(ScanStateError::ResetWhileActive));
        state
            .save_progress(Some(1), vec![candidate("T1")], vec![])
            .unwrap();
        state.complete().unwrap();
        assert_eq!(state.phase(), ScanPhase::Completed);
        assert!(!state.is_active());
        assert_eq!(state.candidates().len(), 1);

        let run = state.run_id();
        state.reset().unwrap();
        assert_eq!(state.phase(), ScanPhase::Idle);
        assert!(state.universe().is_empty());
        assert_eq!(state.cursor(), None);
        assert!(state.candidates().is_empty());
        assert_eq!(state.log().count(), 0);
        assert_ne!(state.run_id(), run);
    }

    #[test]
    fn test_run_id_changes_only_with_a_new_universe() {
        let mut state = ScanState::new();
        state.start(universe(4)).unwrap();
        let run = state.run_id();

        // Pause and resume keep the run
        state.save_progress(Some(0), vec![], vec![]).unwrap();
        state.pause().unwrap();
        assert_eq!(state.start(universe(9)).unwrap(), StartMode::Resumed);
        assert_eq!(state.run_id(), run);

        state.pause().unwrap();
        state.reset().unwrap();
        let after_reset = state.run_id();
        assert_ne!(after_reset, run);

        state.start(universe(2)).unwrap();
        assert_ne!(state.run_id(), after_reset);
        assert_ne!(state.run_id(), run);
    }

    #[test]
    fn test_cursor_and_candidates_monotonic_over_transition_sequence() {
        let mut state = ScanState::new();
        let mut last_cursor = None;
        let mut last_len = 0;

        state.start(universe(6)).unwrap();
        let steps: Vec<(Option<usize>, usize)> =
            vec![(Some(1), 1), (Some(1), 0), (Some(3), 2), (Some(5), 0)];
        for (i, (cursor, found)) in steps.into_iter().enumerate() {
            let found = (0..found).map(|k| candidate(&format!("C{}{}", i, k))).collect();
            state.save_progress(cursor, found, vec![]).unwrap();
            if i == 1 {
                state.pause().unwrap();
                state.start(vec![]).unwrap();
            }
            assert!(state.cursor() >= last_cursor);
            assert!(state.candidates().len() >= last_len);
            last_cursor = state.cursor();
            last_len = state.candidates().len();
        }
        state.complete().unwrap();
        assert_eq!(state.candidates().len(), 3);
    }
}
