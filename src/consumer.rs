//! NATS consumer for transactions awaiting assessment

use crate::types::transaction::Transaction;
use anyhow::{Context, Result};
use async_nats::{Client, Subscriber};
use tracing::info;

/// Receives transaction payloads from NATS
pub struct TransactionConsumer {
    client: Client,
    subject: String,
}

impl TransactionConsumer {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Subscribe to the transaction subject
    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = self
            .client
            .subscribe(self.subject.clone())
            .await
            .with_context(|| format!("Failed to subscribe to {}", self.subject))?;
        info!(subject = %self.subject, "Subscribed to transaction subject");
        Ok(subscriber)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Decode a JSON transaction payload.
pub fn decode(payload: &[u8]) -> serde_json::Result<Transaction> {
    serde_json::from_slice(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_minimal_payload() {
        let payload = br#"{
            "transaction_id": "tx_1",
            "user_id": "USER_1001",
            "amount": 42.5,
            "merchant": "Amazon",
            "location": {"country": "USA", "city": "Boston", "lat": 42.36, "lng": -71.06},
            "payment_method": "debit_card",
            "timestamp": "2024-06-01T14:00:00Z"
        }"#;

        let tx = decode(payload).unwrap();
        assert_eq!(tx.transaction_id, "tx_1");
        assert_eq!(tx.currency, "USD");
        assert_eq!(tx.location.latitude, 42.36);
        assert_eq!(tx.hour_of_day(), 14);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode(b"not json").is_err());
        assert!(decode(br#"{"transaction_id": "tx_1"}"#).is_err());
    }
}
