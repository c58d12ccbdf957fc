use crate::SignalInputs;

/// One vote in the scanner's second-stage qualification.
///
/// Implementations are pure: no fetching, no shared state. The scanner and the
/// backtest replay call them without knowing their internals.
pub trait QualificationSignal: Send + Sync {
    /// Short identifier recorded in candidate metadata
    fn name(&self) -> &'static str;

    /// Whether this signal votes for the ticker at `current_price`
    fn vote(&self, inputs: &SignalInputs, current_price: f64) -> bool;
}

/// Tally the votes of `signals`, returning the score and the names that voted yes.
pub fn tally_votes(
    signals: &[Box<dyn QualificationSignal>],
    inputs: &SignalInputs,
    current_price: f64,
) -> (u32, Vec<String>) {
    let voters: Vec<String> = signals
        .iter()
        .filter(|s| s.vote(inputs, current_price))
        .map(|s| s.name().to_string())
        .collect();
    (voters.len() as u32, voters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IndicatorSeries;

    struct Always(bool, &'static str);

    impl QualificationSignal for Always {
        fn name(&self) -> &'static str {
            self.1
        }

        fn vote(&self, _inputs: &SignalInputs, _price: f64) -> bool {
            self.0
        }
    }

    #[test]
    fn test_tally_votes_counts_yes_votes_in_order() {
        let signals: Vec<Box<dyn QualificationSignal>> = vec![
            Box::new(Always(true, "a")),
            Box::new(Always(false, "b")),
            Box::new(Always(true, "c")),
        ];
        let inputs = SignalInputs {
            daily: vec![],
            sma: IndicatorSeries::new("SMA", vec![]),
            atr: IndicatorSeries::new("ATR", vec![]),
        };
        let (score, voters) = tally_votes(&signals, &inputs, 1.0);
        assert_eq!(score, 2);
        assert_eq!(voters, vec!["a".to_string(), "c".to_string()]);
    }
}
