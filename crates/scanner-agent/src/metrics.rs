use std::time::Instant;

/// Structured telemetry for one agent run: scan timing, report timing and
/// outcome counts.
#[derive(Debug, Default)]
pub struct AgentMetrics {
    pub scan_duration_ms: u64,
    pub report_duration_ms: u64,
    pub candidates: usize,
    pub quick_opportunities: usize,
    pub golden_scored: usize,
    pub backtests_run: u64,
    pub backtests_failed: u64,
    pub network_calls: u64,
}

impl AgentMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_timer() -> Instant {
        Instant::now()
    }

    pub fn record_scan_duration(&mut self, start: Instant) {
        self.scan_duration_ms = start.elapsed().as_millis() as u64;
    }

    pub fn record_report_duration(&mut self, start: Instant) {
        self.report_duration_ms = start.elapsed().as_millis() as u64;
    }

    pub fn record_backtest(&mut self, succeeded: bool) {
        self.backtests_run += 1;
        if !succeeded {
            self.backtests_failed += 1;
        }
    }

    /// Share of backtests that produced a result (0-100%)
    pub fn backtest_success_rate(&self) -> f64 {
        if self.backtests_run == 0 {
            return 0.0;
        }
        let ok = (self.backtests_run - self.backtests_failed) as f64;
        ok / self.backtests_run as f64 * 100.0
    }

    pub fn log_metrics(&self) {
        tracing::info!(
            scan_duration_ms = self.scan_duration_ms,
            report_duration_ms = self.report_duration_ms,
            candidates = self.candidates,
            quick_opportunities = self.quick_opportunities,
            golden_scored = self.golden_scored,
            backtests_run = self.backtests_run,
            backtests_failed = self.backtests_failed,
            network_calls = self.network_calls,
            "agent_metrics"
        );
    }
}
