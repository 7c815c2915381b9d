//! Risk signal extraction
//!
//! Each extractor maps a transaction and the user's historical context to
//! one [`RiskSignal`] in [0, 1]. Extractors are pure and never consult one
//! another, so they can be evaluated in any order.
//!
//! The confidence family feeds the unweighted confidence score that drives
//! the recommended action and raises flags. The risk family feeds the
//! weighted risk score. The amount and frequency dimensions appear in both
//! families with independently tuned thresholds and windows.

pub mod amount;
pub mod frequency;
pub mod location;
pub mod merchant;
pub mod payment;
pub mod time;

pub use amount::{AmountDeviationSignal, AmountSignal};
pub use frequency::{FrequencySignal, VelocitySignal};
pub use location::{GeographicSignal, LocationNoveltySignal};
pub use merchant::MerchantSignal;
pub use payment::PaymentMethodSignal;
pub use time::{TimeOfDaySignal, TimePatternSignal};

use crate::config::SignalConfig;
use crate::history::HistoricalContext;
use crate::types::assessment::RiskSignal;
use crate::types::transaction::Transaction;

pub const AMOUNT_RISK: &str = "amount_risk";
pub const TIME_RISK: &str = "time_risk";
pub const LOCATION_RISK: &str = "location_risk";
pub const FREQUENCY_RISK: &str = "frequency_risk";
pub const MERCHANT_RISK: &str = "merchant_risk";

pub const VELOCITY_RISK: &str = "velocity_risk";
pub const GEOGRAPHIC_RISK: &str = "geographic_risk";
pub const AMOUNT_DEVIATION_RISK: &str = "amount_deviation_risk";
pub const TIME_PATTERN_RISK: &str = "time_pattern_risk";
pub const PAYMENT_METHOD_RISK: &str = "payment_method_risk";

/// A single evaluation dimension of a transaction
pub trait RiskSignalExtractor: Send + Sync {
    /// Signal name used in the risk breakdown
    fn name(&self) -> &'static str;

    fn extract(&self, tx: &Transaction, context: &HistoricalContext) -> RiskSignal;
}

/// Confidence-family extractors in flag evaluation order:
/// amount, time, location, frequency, merchant.
pub fn confidence_family(config: &SignalConfig) -> Vec<Box<dyn RiskSignalExtractor>> {
    vec![
        Box::new(AmountSignal),
        Box::new(TimeOfDaySignal),
        Box::new(LocationNoveltySignal),
        Box::new(FrequencySignal),
        Box::new(MerchantSignal::new(&config.safe_merchants)),
    ]
}

/// Risk-family extractors, weighted by signal name.
pub fn risk_family(config: &SignalConfig) -> Vec<Box<dyn RiskSignalExtractor>> {
    vec![
        Box::new(VelocitySignal),
        Box::new(GeographicSignal::new(
            &config.high_risk_locations,
            &config.medium_risk_countries,
        )),
        Box::new(AmountDeviationSignal),
        Box::new(TimePatternSignal),
        Box::new(PaymentMethodSignal::new(
            config.payment_method_risks.clone(),
            config.default_payment_method_risk,
        )),
    ]
}

/// Population mean and standard deviation.
pub(crate) fn mean_and_std_dev(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::types::transaction::{Location, Transaction};
    use chrono::{TimeZone, Utc};

    pub fn transaction(amount: f64, merchant: &str, hour: u8) -> Transaction {
        Transaction::new(
            "tx_test",
            "USER_1001",
            amount,
            merchant,
            Location::new("USA", "New York", 40.7128, -74.0060),
            "credit_card",
            Utc.with_ymd_and_hms(2024, 6, 1, hour as u32, 0, 0).unwrap(),
        )
    }

    pub fn anonymous(amount: f64) -> Transaction {
        let mut tx = transaction(amount, "Amazon", 14);
        tx.user_id = None;
        tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_composition() {
        let config = SignalConfig::default();

        let names: Vec<&str> = confidence_family(&config).iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![AMOUNT_RISK, TIME_RISK, LOCATION_RISK, FREQUENCY_RISK, MERCHANT_RISK]
        );

        let names: Vec<&str> = risk_family(&config).iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                VELOCITY_RISK,
                GEOGRAPHIC_RISK,
                AMOUNT_DEVIATION_RISK,
                TIME_PATTERN_RISK,
                PAYMENT_METHOD_RISK
            ]
        );
    }

    #[test]
    fn test_mean_and_std_dev() {
        assert_eq!(mean_and_std_dev(&[]), None);

        let (mean, std_dev) = mean_and_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((mean - 5.0).abs() < 1e-9);
        assert!((std_dev - 2.0).abs() < 1e-9);
    }
}
