//! Amount-based signals

use super::{mean_and_std_dev, RiskSignalExtractor, AMOUNT_DEVIATION_RISK, AMOUNT_RISK};
use crate::history::HistoricalContext;
use crate::types::assessment::RiskSignal;
use crate::types::transaction::Transaction;

/// Continuous z-score of the amount against the user's recent amounts,
/// with absolute-amount buckets when there is nothing to compare against.
pub struct AmountSignal;

impl AmountSignal {
    fn fallback(amount: f64) -> f64 {
        if amount > 5000.0 {
            0.9
        } else if amount > 2000.0 {
            0.6
        } else if amount > 1000.0 {
            0.3
        } else {
            0.1
        }
    }

    fn score(tx: &Transaction, context: &HistoricalContext) -> f64 {
        if tx.user().is_some() {
            if let Some((mean, std_dev)) = mean_and_std_dev(&context.recent_amounts) {
                // A single sample has no spread of its own
                let std_dev = if context.recent_amounts.len() > 1 {
                    std_dev
                } else {
                    mean * 0.5
                };

                if std_dev > 0.0 {
                    let z_score = (tx.amount - mean).abs() / std_dev;
                    return (z_score / 3.0).min(1.0);
                }
            }
        }

        Self::fallback(tx.amount)
    }
}

impl RiskSignalExtractor for AmountSignal {
    fn name(&self) -> &'static str {
        AMOUNT_RISK
    }

    fn extract(&self, tx: &Transaction, context: &HistoricalContext) -> RiskSignal {
        RiskSignal::new(AMOUNT_RISK, Self::score(tx, context))
            .flag_above(0.7, "High amount transaction")
    }
}

/// Bucketed z-score against the longer deviation window. Never flags.
pub struct AmountDeviationSignal;

impl AmountDeviationSignal {
    const MIN_SAMPLES: usize = 3;

    fn score(tx: &Transaction, context: &HistoricalContext) -> f64 {
        if tx.user().is_none() {
            return 0.3;
        }

        let amounts = &context.deviation_amounts;
        if amounts.len() < Self::MIN_SAMPLES {
            return 0.4;
        }

        let Some((mean, std_dev)) = mean_and_std_dev(amounts) else {
            return 0.4;
        };

        if std_dev == 0.0 {
            return if tx.amount != mean { 0.8 } else { 0.1 };
        }

        let z_score = (tx.amount - mean).abs() / std_dev;
        if z_score > 3.0 {
            1.0
        } else if z_score > 2.0 {
            0.7
        } else if z_score > 1.0 {
            0.3
        } else {
            0.1
        }
    }
}

impl RiskSignalExtractor for AmountDeviationSignal {
    fn name(&self) -> &'static str {
        AMOUNT_DEVIATION_RISK
    }

    fn extract(&self, tx: &Transaction, context: &HistoricalContext) -> RiskSignal {
        RiskSignal::new(AMOUNT_DEVIATION_RISK, Self::score(tx, context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::test_support::{anonymous, transaction};

    fn with_recent(amounts: &[f64]) -> HistoricalContext {
        HistoricalContext {
            recent_amounts: amounts.to_vec(),
            ..HistoricalContext::empty()
        }
    }

    fn with_deviation(amounts: &[f64]) -> HistoricalContext {
        HistoricalContext {
            deviation_amounts: amounts.to_vec(),
            ..HistoricalContext::empty()
        }
    }

    #[test]
    fn test_fallback_buckets_without_history() {
        let ctx = HistoricalContext::empty();
        let signal = AmountSignal;

        assert_eq!(signal.extract(&transaction(8000.0, "Amazon", 14), &ctx).value, 0.9);
        assert_eq!(signal.extract(&transaction(5000.0, "Amazon", 14), &ctx).value, 0.6);
        assert_eq!(signal.extract(&transaction(1500.0, "Amazon", 14), &ctx).value, 0.3);
        assert_eq!(signal.extract(&transaction(1000.0, "Amazon", 14), &ctx).value, 0.1);
    }

    #[test]
    fn test_high_amount_flag() {
        let ctx = HistoricalContext::empty();
        let signal = AmountSignal.extract(&transaction(8000.0, "Amazon", 14), &ctx);
        assert_eq!(signal.flag, Some("High amount transaction"));

        let signal = AmountSignal.extract(&transaction(3000.0, "Amazon", 14), &ctx);
        assert_eq!(signal.flag, None);
    }

    #[test]
    fn test_z_score_against_history() {
        // mean 140, population std dev 20
        let ctx = with_recent(&[120.0, 160.0, 120.0, 160.0]);

        let signal = AmountSignal.extract(&transaction(150.0, "Amazon", 14), &ctx);
        assert!((signal.value - 0.5 / 3.0).abs() < 1e-9);

        let signal = AmountSignal.extract(&transaction(260.0, "Amazon", 14), &ctx);
        assert_eq!(signal.value, 1.0);
        assert!(signal.flag.is_some());
    }

    #[test]
    fn test_single_sample_uses_half_mean_spread() {
        let ctx = with_recent(&[100.0]);
        // z = 50 / 50 = 1
        let signal = AmountSignal.extract(&transaction(150.0, "Amazon", 14), &ctx);
        assert!((signal.value - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_history_falls_back_to_buckets() {
        let ctx = with_recent(&[50.0, 50.0, 50.0]);
        let signal = AmountSignal.extract(&transaction(2500.0, "Amazon", 14), &ctx);
        assert_eq!(signal.value, 0.6);
    }

    #[test]
    fn test_anonymous_ignores_history() {
        let ctx = with_recent(&[10.0, 12.0]);
        assert_eq!(AmountSignal.extract(&anonymous(50.0), &ctx).value, 0.1);
    }

    #[test]
    fn test_deviation_requires_three_samples() {
        let signal = AmountDeviationSignal;
        let tx = transaction(100.0, "Amazon", 14);

        assert_eq!(signal.extract(&tx, &with_deviation(&[10.0, 20.0])).value, 0.4);
        assert_eq!(signal.extract(&anonymous(100.0), &with_deviation(&[10.0, 20.0, 30.0])).value, 0.3);
    }

    #[test]
    fn test_deviation_zero_spread() {
        let ctx = with_deviation(&[100.0, 100.0, 100.0]);
        let signal = AmountDeviationSignal;

        assert_eq!(signal.extract(&transaction(100.0, "Amazon", 14), &ctx).value, 0.1);
        assert_eq!(signal.extract(&transaction(101.0, "Amazon", 14), &ctx).value, 0.8);
    }

    #[test]
    fn test_deviation_buckets() {
        // mean 140, population std dev 20
        let ctx = with_deviation(&[120.0, 160.0, 120.0, 160.0]);
        let signal = AmountDeviationSignal;

        assert_eq!(signal.extract(&transaction(150.0, "Amazon", 14), &ctx).value, 0.1);
        assert_eq!(signal.extract(&transaction(170.0, "Amazon", 14), &ctx).value, 0.3);
        assert_eq!(signal.extract(&transaction(190.0, "Amazon", 14), &ctx).value, 0.7);
        assert_eq!(signal.extract(&transaction(210.0, "Amazon", 14), &ctx).value, 1.0);
        assert_eq!(signal.extract(&transaction(210.0, "Amazon", 14), &ctx).flag, None);
    }
}
