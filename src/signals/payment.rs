//! Payment method signal

use super::{RiskSignalExtractor, PAYMENT_METHOD_RISK};
use crate::history::HistoricalContext;
use crate::types::assessment::RiskSignal;
use crate::types::transaction::Transaction;
use std::collections::HashMap;

/// Fixed per-method risk lookup.
pub struct PaymentMethodSignal {
    risks: HashMap<String, f64>,
    default_risk: f64,
}

impl PaymentMethodSignal {
    pub fn new(risks: HashMap<String, f64>, default_risk: f64) -> Self {
        Self {
            risks: risks
                .into_iter()
                .map(|(method, risk)| (method.to_lowercase(), risk))
                .collect(),
            default_risk,
        }
    }
}

impl RiskSignalExtractor for PaymentMethodSignal {
    fn name(&self) -> &'static str {
        PAYMENT_METHOD_RISK
    }

    fn extract(&self, tx: &Transaction, _context: &HistoricalContext) -> RiskSignal {
        let method = tx.payment_method.to_lowercase();
        let risk = self.risks.get(&method).copied().unwrap_or(self.default_risk);
        RiskSignal::new(PAYMENT_METHOD_RISK, risk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignalConfig;
    use crate::signals::test_support::transaction;

    #[test]
    fn test_payment_method_lookup() {
        let config = SignalConfig::default();
        let signal = PaymentMethodSignal::new(
            config.payment_method_risks.clone(),
            config.default_payment_method_risk,
        );
        let ctx = HistoricalContext::empty();
        let mut tx = transaction(50.0, "Amazon", 14);

        for (method, risk) in [
            ("credit_card", 0.1),
            ("debit_card", 0.2),
            ("digital_wallet", 0.15),
            ("cryptocurrency", 0.8),
            ("Wire_Transfer", 0.6),
            ("unknown", 0.9),
            ("gift_card", 0.5),
        ] {
            tx.payment_method = method.to_string();
            assert_eq!(signal.extract(&tx, &ctx).value, risk, "method {}", method);
        }
    }
}
