//! Per-message processing for the scoring service
//!
//! A payload becomes a stored assessment record or an error, never both:
//! nothing is stored unless the transaction decodes, validates, and is
//! assessed.

use crate::consumer;
use crate::error::{ScoringError, StorageError};
use crate::history::InMemoryHistoryStore;
use crate::scoring::RiskEngine;
use crate::types::assessment::{AssessmentRecord, FraudAssessment};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

/// Reasons a message produced no record
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("malformed transaction payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("failed to store assessment: {0}")]
    Storage(#[from] StorageError),
}

impl ProcessError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessError::Decode(_) => "decode",
            ProcessError::Scoring(e) => e.kind(),
            ProcessError::Storage(_) => "storage",
        }
    }
}

/// Decode, assess, and store one transaction payload.
///
/// The transaction is stamped with `received_at` before scoring, so the
/// history windows and the stored history follow server receipt time
/// rather than the client-supplied timestamp.
pub fn process(
    engine: &RiskEngine,
    store: &InMemoryHistoryStore,
    payload: &[u8],
    received_at: DateTime<Utc>,
) -> Result<(FraudAssessment, AssessmentRecord), ProcessError> {
    let mut transaction = consumer::decode(payload)?;

    if transaction.timestamp != received_at {
        debug!(
            transaction_id = %transaction.transaction_id,
            client_timestamp = %transaction.timestamp,
            received_at = %received_at,
            "Replacing client timestamp with receipt time"
        );
        transaction.timestamp = received_at;
    }

    let assessment = engine.assess_at(&transaction, received_at)?;
    let record = store.record(&transaction, &assessment)?;
    Ok((assessment, record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::error::ProviderError;
    use crate::history::{ContextRequest, HistoricalContext, HistoryProvider};
    use crate::signals::FREQUENCY_RISK;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    struct UnreachableProvider;

    impl HistoryProvider for UnreachableProvider {
        fn get_context(
            &self,
            request: &ContextRequest<'_>,
        ) -> Result<HistoricalContext, ProviderError> {
            Err(ProviderError::Unavailable {
                user_id: request.user_id.to_string(),
                reason: "connection refused".to_string(),
            })
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 14, 0, 0).unwrap()
    }

    fn payload(id: &str, amount: f64, timestamp: DateTime<Utc>) -> Vec<u8> {
        serde_json::json!({
            "transaction_id": id,
            "user_id": "USER_42",
            "amount": amount,
            "merchant": "Amazon",
            "location": {"country": "USA", "city": "Boston", "lat": 42.36, "lng": -71.06},
            "payment_method": "credit_card",
            "timestamp": timestamp.to_rfc3339(),
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn test_future_dated_burst_still_counted() {
        let store = Arc::new(InMemoryHistoryStore::new());
        let engine = RiskEngine::new(&ScoringConfig::default(), store.clone());

        for i in 0..6 {
            let received = now() - Duration::minutes(6 - i);
            let future = received + Duration::hours(2);
            process(&engine, &store, &payload(&format!("b{}", i), 40.0, future), received).unwrap();
        }

        let (assessment, record) =
            process(&engine, &store, &payload("t1", 40.0, now() + Duration::hours(2)), now()).unwrap();

        assert_eq!(assessment.risk_breakdown[FREQUENCY_RISK], 1.0);
        assert!(assessment
            .flags
            .contains(&"High frequency transactions".to_string()));
        assert_eq!(record.timestamp, now().to_rfc3339());
    }

    #[test]
    fn test_provider_failure_stores_nothing() {
        let store = InMemoryHistoryStore::new();
        let engine = RiskEngine::new(&ScoringConfig::default(), Arc::new(UnreachableProvider));

        let err = process(&engine, &store, &payload("t1", 40.0, now()), now()).unwrap_err();

        assert_eq!(err.kind(), "history_unavailable");
        assert_eq!(store.statistics().unwrap().total_transactions, 0);
        assert!(store.recent(now(), Duration::days(1), 10).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_transaction_stores_nothing() {
        let store = Arc::new(InMemoryHistoryStore::new());
        let engine = RiskEngine::new(&ScoringConfig::default(), store.clone());

        let err = process(&engine, &store, &payload("t1", -5.0, now()), now()).unwrap_err();
        assert_eq!(err.kind(), "invalid");

        let err = process(&engine, &store, b"{\"amount\": 3}", now()).unwrap_err();
        assert_eq!(err.kind(), "decode");

        assert_eq!(store.statistics().unwrap().total_transactions, 0);
    }

    #[test]
    fn test_successful_message_is_stored() {
        let store = Arc::new(InMemoryHistoryStore::new());
        let engine = RiskEngine::new(&ScoringConfig::default(), store.clone());

        let (_, record) = process(&engine, &store, &payload("t1", 40.0, now()), now()).unwrap();

        let stored = store.recent(now(), Duration::minutes(1), 10).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].record_id, record.record_id);
    }
}
