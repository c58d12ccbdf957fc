//! Second-stage qualification signals.
//!
//! Each signal is a pure vote over already-fetched data. Missing or
//! insufficient data is a "no" vote, never an error.

use analysis_core::stats::mean;
use analysis_core::{QualificationSignal, SignalInputs};

/// Volume spike: some session in the lookback traded far above the average.
#[derive(Debug, Clone)]
pub struct LiquiditySignal {
    pub lookback: usize,
    pub spike_multiple: f64,
}

impl Default for LiquiditySignal {
    fn default() -> Self {
        Self {
            lookback: 30,
            spike_multiple: 5.0,
        }
    }
}

impl QualificationSignal for LiquiditySignal {
    fn name(&self) -> &'static str {
        "liquidity"
    }

    fn vote(&self, inputs: &SignalInputs, _current_price: f64) -> bool {
        if inputs.daily.len() < self.lookback {
            return false;
        }
        let volumes: Vec<f64> = inputs
            .daily
            .iter()
            .take(self.lookback)
            .map(|b| b.volume)
            .collect();
        let avg = mean(&volumes);
        if avg <= 0.0 {
            return false;
        }
        volumes.iter().any(|v| *v > avg * self.spike_multiple)
    }
}

/// Price above the long simple moving average
#[derive(Debug, Clone, Default)]
pub struct MomentumSignal;

impl QualificationSignal for MomentumSignal {
    fn name(&self) -> &'static str {
        "momentum"
    }

    fn vote(&self, inputs: &SignalInputs, current_price: f64) -> bool {
        match inputs.sma.latest() {
            Some(sma) => current_price > sma,
            None => false,
        }
    }
}

/// Average true range large relative to price
#[derive(Debug, Clone)]
pub struct VolatilitySignal {
    pub min_atr_ratio: f64,
}

impl Default for VolatilitySignal {
    fn default() -> Self {
        Self {
            min_atr_ratio: 0.04,
        }
    }
}

impl QualificationSignal for VolatilitySignal {
    fn name(&self) -> &'static str {
        "volatility"
    }

    fn vote(&self, inputs: &SignalInputs, current_price: f64) -> bool {
        if current_price <= 0.0 {
            return false;
        }
        match inputs.atr.latest() {
            Some(atr) => atr / current_price >= self.min_atr_ratio,
            None => false,
        }
    }
}

/// Liquidity, momentum and volatility with their usual thresholds
pub fn default_signals() -> Vec<Box<dyn QualificationSignal>> {
    vec![
        Box::new(LiquiditySignal::default()),
        Box::new(MomentumSignal),
        Box::new(VolatilitySignal::default()),
    ]
}
