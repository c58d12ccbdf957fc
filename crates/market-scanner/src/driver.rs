//! Periodic background task that advances the scan.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::executor::{ScanError, ScanStepExecutor};
use crate::state::SharedScanState;

/// Source of the driver's cadence, injectable so tests control time.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// `tokio::time` backed clock
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Why the driver loop returned
#[derive(Debug, Clone, PartialEq)]
pub enum DriverExit {
    Cancelled,
    Completed,
    Failed(ScanError),
}

/// Runs one step per tick while the scan is active and idles otherwise.
///
/// The driver is the single writer that advances a given `ScanState`.
pub struct ScanDriver {
    executor: Arc<ScanStepExecutor>,
    state: SharedScanState,
    clock: Arc<dyn Clock>,
    interval: Duration,
    stop_when_completed: bool,
}

impl ScanDriver {
    pub fn new(executor: Arc<ScanStepExecutor>, state: SharedScanState) -> Self {
        let interval = executor.config().step_interval;
        Self {
            executor,
            state,
            clock: Arc::new(TokioClock),
            interval,
            stop_when_completed: false,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Return `DriverExit::Completed` once the scan finishes instead of idling
    pub fn stop_when_completed(mut self) -> Self {
        self.stop_when_completed = true;
        self
    }

    pub async fn run(self, shutdown: CancellationToken) -> DriverExit {
        tracing::info!(
            "Scan driver started (interval {}s)",
            self.interval.as_secs_f64()
        );

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    tracing::info!("Scan driver stopped");
                    return DriverExit::Cancelled;
                }

                _ = self.clock.sleep(self.interval) => {}
            }

            let (active, completed) = {
                let s = self.state.read().await;
                (s.is_active(), s.is_completed())
            };
            if completed && self.stop_when_completed {
                return DriverExit::Completed;
            }
            if !active {
                continue;
            }

            match self.executor.run_step(&self.state).await {
                Ok(report) if report.completed && self.stop_when_completed => {
                    return DriverExit::Completed;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("Scan step failed: {}", e);
                    return DriverExit::Failed(e);
                }
            }
        }
    }

    /// Spawn `run` onto the runtime
    pub fn spawn(self, shutdown: CancellationToken) -> tokio::task::JoinHandle<DriverExit> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}
