//! Score aggregation for the two signal families

use crate::types::assessment::RiskSignal;
use std::collections::HashMap;
use tracing::warn;

/// Combines signal values into the confidence and risk composites.
pub struct ScoreAggregator {
    /// Risk-family weights keyed by signal name
    weights: HashMap<String, f64>,
}

impl ScoreAggregator {
    /// Create a new score aggregator with signal weights.
    pub fn new(weights: HashMap<String, f64>) -> Self {
        Self { weights }
    }

    /// Unweighted mean rounded to 3 decimals, 0.0 for no signals.
    pub fn confidence(&self, signals: &[RiskSignal]) -> f64 {
        if signals.is_empty() {
            return 0.0;
        }

        let mean = signals.iter().map(|s| s.value).sum::<f64>() / signals.len() as f64;
        round3(mean)
    }

    /// Weighted sum capped at 1.0.
    ///
    /// Weights are not normalized. A signal without a configured weight
    /// contributes nothing.
    pub fn risk(&self, signals: &[RiskSignal]) -> f64 {
        let weighted_sum: f64 = signals
            .iter()
            .map(|signal| match self.weights.get(signal.name) {
                Some(weight) => signal.value * weight,
                None => {
                    warn!(signal = signal.name, "No weight configured for signal");
                    0.0
                }
            })
            .sum();

        weighted_sum.min(1.0)
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::signals::{
        AMOUNT_DEVIATION_RISK, GEOGRAPHIC_RISK, PAYMENT_METHOD_RISK, TIME_PATTERN_RISK,
        VELOCITY_RISK,
    };

    fn aggregator() -> ScoreAggregator {
        ScoreAggregator::new(ScoringConfig::default().weights)
    }

    fn signals(values: &[(&'static str, f64)]) -> Vec<RiskSignal> {
        values
            .iter()
            .map(|&(name, value)| RiskSignal::new(name, value))
            .collect()
    }

    #[test]
    fn test_confidence_is_rounded_mean() {
        let scores = signals(&[("a", 0.9), ("b", 0.8), ("c", 0.7), ("d", 0.1), ("e", 0.9)]);
        assert_eq!(aggregator().confidence(&scores), 0.68);

        let scores = signals(&[("a", 0.1), ("b", 0.1), ("c", 0.12345)]);
        assert_eq!(aggregator().confidence(&scores), 0.108);
    }

    #[test]
    fn test_confidence_empty() {
        assert_eq!(aggregator().confidence(&[]), 0.0);
    }

    #[test]
    fn test_weighted_risk() {
        let scores = signals(&[
            (VELOCITY_RISK, 0.1),
            (GEOGRAPHIC_RISK, 0.2),
            (AMOUNT_DEVIATION_RISK, 0.4),
            (TIME_PATTERN_RISK, 0.1),
            (PAYMENT_METHOD_RISK, 0.1),
        ]);

        // 0.025 + 0.04 + 0.12 + 0.015 + 0.01
        assert!((aggregator().risk(&scores) - 0.21).abs() < 1e-9);
    }

    #[test]
    fn test_risk_capped_at_one() {
        let mut weights = HashMap::new();
        weights.insert(VELOCITY_RISK.to_string(), 0.8);
        weights.insert(GEOGRAPHIC_RISK.to_string(), 0.8);
        let aggregator = ScoreAggregator::new(weights);

        let scores = signals(&[(VELOCITY_RISK, 1.0), (GEOGRAPHIC_RISK, 1.0)]);
        assert_eq!(aggregator.risk(&scores), 1.0);
    }

    #[test]
    fn test_unweighted_signal_ignored() {
        let scores = signals(&[(VELOCITY_RISK, 1.0), ("unlisted", 1.0)]);
        assert!((aggregator().risk(&scores) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_risk_of_maximal_signals_is_one() {
        let scores = signals(&[
            (VELOCITY_RISK, 1.0),
            (GEOGRAPHIC_RISK, 1.0),
            (AMOUNT_DEVIATION_RISK, 1.0),
            (TIME_PATTERN_RISK, 1.0),
            (PAYMENT_METHOD_RISK, 1.0),
        ]);
        let risk = aggregator().risk(&scores);
        assert!(risk <= 1.0);
        assert!((risk - 1.0).abs() < 1e-9);
    }
}
