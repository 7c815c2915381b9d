//! Time-of-day signals

use super::{RiskSignalExtractor, TIME_PATTERN_RISK, TIME_RISK};
use crate::history::HistoricalContext;
use crate::types::assessment::RiskSignal;
use crate::types::transaction::Transaction;

/// Fixed night-time risk bands.
pub struct TimeOfDaySignal;

impl TimeOfDaySignal {
    fn score(hour: u8) -> f64 {
        if hour >= 23 || hour <= 5 {
            0.8
        } else if hour >= 21 || hour <= 7 {
            0.4
        } else {
            0.1
        }
    }
}

impl RiskSignalExtractor for TimeOfDaySignal {
    fn name(&self) -> &'static str {
        TIME_RISK
    }

    fn extract(&self, tx: &Transaction, _context: &HistoricalContext) -> RiskSignal {
        RiskSignal::new(TIME_RISK, Self::score(tx.hour_of_day()))
            .flag_above(0.6, "Unusual transaction time")
    }
}

/// Hour-band risk, relaxed when the user habitually transacts at this hour.
pub struct TimePatternSignal;

impl TimePatternSignal {
    const MIN_SAMPLES: usize = 5;

    fn base_risk(hour: u8) -> f64 {
        match hour {
            2..=5 => 0.9,
            22 | 23 | 6 | 7 => 0.4,
            _ => 0.1,
        }
    }

    fn score(tx: &Transaction, context: &HistoricalContext) -> f64 {
        let hour = tx.hour_of_day();
        let base = Self::base_risk(hour);

        if tx.user().is_none() || context.hour_sample_count() < Self::MIN_SAMPLES {
            return base;
        }

        let frequency = context.hour_frequency(hour);
        if frequency > 0.1 {
            0.1
        } else if frequency > 0.05 {
            0.3
        } else {
            base
        }
    }
}

impl RiskSignalExtractor for TimePatternSignal {
    fn name(&self) -> &'static str {
        TIME_PATTERN_RISK
    }

    fn extract(&self, tx: &Transaction, context: &HistoricalContext) -> RiskSignal {
        RiskSignal::new(TIME_PATTERN_RISK, Self::score(tx, context))
    }
}
