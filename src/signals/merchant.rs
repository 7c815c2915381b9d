//! Merchant reputation signal

use super::{RiskSignalExtractor, MERCHANT_RISK};
use crate::history::HistoricalContext;
use crate::types::assessment::RiskSignal;
use crate::types::transaction::Transaction;

const UNKNOWN_MERCHANT: &str = "unknown merchant";

/// Allow-listed merchants are low risk, unnamed ones high risk.
pub struct MerchantSignal {
    safe_merchants: Vec<String>,
}

impl MerchantSignal {
    pub fn new(safe_merchants: &[String]) -> Self {
        Self {
            safe_merchants: safe_merchants.iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    fn score(&self, merchant: &str) -> f64 {
        let merchant = merchant.to_lowercase();

        if self
            .safe_merchants
            .iter()
            .any(|safe| merchant.contains(safe.as_str()))
        {
            0.1
        } else if merchant.is_empty() || merchant == UNKNOWN_MERCHANT {
            0.9
        } else {
            0.5
        }
    }
}

impl RiskSignalExtractor for MerchantSignal {
    fn name(&self) -> &'static str {
        MERCHANT_RISK
    }

    fn extract(&self, tx: &Transaction, _context: &HistoricalContext) -> RiskSignal {
        RiskSignal::new(MERCHANT_RISK, self.score(&tx.merchant))
            .flag_above(0.7, "Unknown or risky merchant")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignalConfig;
    use crate::signals::test_support::transaction;

    fn signal() -> MerchantSignal {
        MerchantSignal::new(&SignalConfig::default().safe_merchants)
    }

    #[test]
    fn test_safe_merchants_case_insensitive() {
        let ctx = HistoricalContext::empty();
        for merchant in ["Amazon", "AMAZON.COM", "Best Buy #1234", "apple store"] {
            let result = signal().extract(&transaction(50.0, merchant, 14), &ctx);
            assert_eq!(result.value, 0.1, "merchant {:?}", merchant);
            assert_eq!(result.flag, None);
        }
    }

    #[test]
    fn test_unknown_merchant() {
        let ctx = HistoricalContext::empty();
        for merchant in ["Unknown Merchant", ""] {
            let result = signal().extract(&transaction(50.0, merchant, 14), &ctx);
            assert_eq!(result.value, 0.9);
            assert_eq!(result.flag, Some("Unknown or risky merchant"));
        }
    }

    #[test]
    fn test_other_merchants_moderate() {
        let ctx = HistoricalContext::empty();
        let result = signal().extract(&transaction(50.0, "Joe's Electronics", 14), &ctx);
        assert_eq!(result.value, 0.5);
        assert_eq!(result.flag, None);
    }
}
