//! Transaction frequency signals

use super::{RiskSignalExtractor, FREQUENCY_RISK, VELOCITY_RISK};
use crate::history::HistoricalContext;
use crate::types::assessment::RiskSignal;
use crate::types::transaction::Transaction;

/// Same-user transactions in the short frequency window.
pub struct FrequencySignal;

impl FrequencySignal {
    fn score(tx: &Transaction, context: &HistoricalContext) -> f64 {
        if tx.user().is_none() {
            return 0.3;
        }

        match context.count_last_hour {
            n if n >= 5 => 1.0,
            n if n >= 3 => 0.7,
            n if n >= 2 => 0.4,
            _ => 0.1,
        }
    }
}

impl RiskSignalExtractor for FrequencySignal {
    fn name(&self) -> &'static str {
        FREQUENCY_RISK
    }

    fn extract(&self, tx: &Transaction, context: &HistoricalContext) -> RiskSignal {
        RiskSignal::new(FREQUENCY_RISK, Self::score(tx, context))
            .flag_above(0.8, "High frequency transactions")
    }
}

/// Hourly and daily velocity, hourly bursts taking precedence.
pub struct VelocitySignal;

impl VelocitySignal {
    fn score(tx: &Transaction, context: &HistoricalContext) -> f64 {
        if tx.user().is_none() {
            return 0.5;
        }

        if context.count_last_hour >= 10 {
            1.0
        } else if context.count_last_hour >= 5 {
            0.8
        } else if context.count_last_day >= 50 {
            0.7
        } else if context.count_last_day >= 20 {
            0.4
        } else {
            0.1
        }
    }
}

impl RiskSignalExtractor for VelocitySignal {
    fn name(&self) -> &'static str {
        VELOCITY_RISK
    }

    fn extract(&self, tx: &Transaction, context: &HistoricalContext) -> RiskSignal {
        RiskSignal::new(VELOCITY_RISK, Self::score(tx, context))
    }
}
