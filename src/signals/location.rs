//! Location-based signals

use super::{RiskSignalExtractor, GEOGRAPHIC_RISK, LOCATION_RISK};
use crate::history::HistoricalContext;
use crate::types::assessment::RiskSignal;
use crate::types::transaction::Transaction;

/// Whether the (country, city) pair is new for this user.
pub struct LocationNoveltySignal;

impl LocationNoveltySignal {
    fn score(tx: &Transaction, context: &HistoricalContext) -> f64 {
        if tx.location.is_unspecified() || tx.user().is_none() {
            return 0.5;
        }

        if context.location_window_count == 0 {
            // new user
            return 0.7;
        }

        if context.knows_location(&tx.location.country, &tx.location.city) {
            0.1
        } else {
            0.8
        }
    }
}

impl RiskSignalExtractor for LocationNoveltySignal {
    fn name(&self) -> &'static str {
        LOCATION_RISK
    }

    fn extract(&self, tx: &Transaction, context: &HistoricalContext) -> RiskSignal {
        RiskSignal::new(LOCATION_RISK, Self::score(tx, context))
            .flag_above(0.5, "New or suspicious location")
    }
}

/// Country risk by case-insensitive substring match against fixed lists.
pub struct GeographicSignal {
    high_risk: Vec<String>,
    medium_risk: Vec<String>,
}

impl GeographicSignal {
    pub fn new(high_risk: &[String], medium_risk: &[String]) -> Self {
        Self {
            high_risk: high_risk.iter().map(|s| s.to_lowercase()).collect(),
            medium_risk: medium_risk.iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    fn score(&self, country: &str) -> f64 {
        let country = country.to_lowercase();

        if self.high_risk.iter().any(|token| country.contains(token.as_str())) {
            1.0
        } else if self.medium_risk.iter().any(|token| country.contains(token.as_str())) {
            0.6
        } else {
            0.2
        }
    }
}

impl RiskSignalExtractor for GeographicSignal {
    fn name(&self) -> &'static str {
        GEOGRAPHIC_RISK
    }

    fn extract(&self, tx: &Transaction, _context: &HistoricalContext) -> RiskSignal {
        RiskSignal::new(GEOGRAPHIC_RISK, self.score(&tx.location.country))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignalConfig;
    use crate::signals::test_support::{anonymous, transaction};

    fn known(pairs: &[(&str, &str)]) -> HistoricalContext {
        HistoricalContext {
            known_locations: pairs
                .iter()
                .map(|(country, city)| (country.to_string(), city.to_string()))
                .collect(),
            location_window_count: pairs.len(),
            ..HistoricalContext::empty()
        }
    }

    #[test]
    fn test_new_user_location() {
        let signal = LocationNoveltySignal.extract(&transaction(50.0, "Amazon", 14), &HistoricalContext::empty());
        assert_eq!(signal.value, 0.7);
        assert_eq!(signal.flag, Some("New or suspicious location"));
    }

    #[test]
    fn test_familiar_and_new_locations() {
        let tx = transaction(50.0, "Amazon", 14);

        let familiar = LocationNoveltySignal.extract(&tx, &known(&[("USA", "New York")]));
        assert_eq!(familiar.value, 0.1);
        assert_eq!(familiar.flag, None);

        let novel = LocationNoveltySignal.extract(&tx, &known(&[("USA", "Boston"), ("UK", "New York")]));
        assert_eq!(novel.value, 0.8);
    }

    #[test]
    fn test_location_without_user_or_place() {
        let ctx = known(&[("USA", "New York")]);
        assert_eq!(LocationNoveltySignal.extract(&anonymous(50.0), &ctx).value, 0.5);

        let mut tx = transaction(50.0, "Amazon", 14);
        tx.location.country = String::new();
        tx.location.city = " ".to_string();
        let signal = LocationNoveltySignal.extract(&tx, &ctx);
        assert_eq!(signal.value, 0.5);
        assert_eq!(signal.flag, None);
    }

    #[test]
    fn test_geographic_lists() {
        let config = SignalConfig::default();
        let signal = GeographicSignal::new(&config.high_risk_locations, &config.medium_risk_countries);
        let ctx = HistoricalContext::empty();

        let mut tx = transaction(50.0, "Amazon", 14);
        for (country, risk) in [
            ("Unknown", 1.0),
            ("TOR exit", 1.0),
            ("Anonymous Proxy", 1.0),
            ("Nigeria", 0.6),
            ("Russia", 0.6),
            ("North Korea", 0.6),
            ("USA", 0.2),
            ("", 0.2),
        ] {
            tx.location.country = country.to_string();
            assert_eq!(signal.extract(&tx, &ctx).value, risk, "country {:?}", country);
        }
    }
}
