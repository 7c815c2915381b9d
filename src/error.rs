//! Error types for transaction scoring

use thiserror::Error;

/// A single reason a transaction cannot be scored
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("transaction id is required")]
    MissingTransactionId,

    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(f64),

    #[error("payment method is required")]
    MissingPaymentMethod,

    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("hour {0} outside [0, 23]")]
    HourOutOfRange(u8),
}

/// Failure to obtain a user's historical context
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The backing store could not be read
    #[error("history for user {user_id} unavailable: {reason}")]
    Unavailable { user_id: String, reason: String },
}

/// Failure of the in-memory history store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("history store lock poisoned")]
    Poisoned,
}

/// Reasons an assessment could not be produced
#[derive(Error, Debug)]
pub enum ScoringError {
    /// The transaction failed validation
    #[error("invalid transaction: {}", join(.0))]
    Invalid(Vec<ValidationError>),

    /// Historical context could not be fetched
    #[error("historical context unavailable: {0}")]
    HistoryUnavailable(#[from] ProviderError),
}

impl ScoringError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ScoringError::Invalid(_) => "invalid",
            ScoringError::HistoryUnavailable(_) => "history_unavailable",
        }
    }
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_message_lists_every_error() {
        let err = ScoringError::Invalid(vec![
            ValidationError::MissingTransactionId,
            ValidationError::NonPositiveAmount(-5.0),
        ]);

        assert_eq!(
            err.to_string(),
            "invalid transaction: transaction id is required; amount must be positive, got -5"
        );
        assert_eq!(err.kind(), "invalid");
    }

    #[test]
    fn test_provider_error_converts() {
        let err: ScoringError = ProviderError::Unavailable {
            user_id: "USER_1".to_string(),
            reason: "lock poisoned".to_string(),
        }
        .into();

        assert_eq!(err.kind(), "history_unavailable");
        assert!(err.to_string().contains("USER_1"));
    }
}
