//! NATS producer for assessment records

use crate::types::assessment::AssessmentRecord;
use anyhow::Result;
use async_nats::Client;
use tracing::debug;

/// Publishes assessment records to NATS
#[derive(Clone)]
pub struct AssessmentProducer {
    client: Client,
    subject: String,
}

impl AssessmentProducer {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish one assessment record
    pub async fn publish(&self, record: &AssessmentRecord) -> Result<()> {
        let payload = serde_json::to_vec(record)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            record_id = %record.record_id,
            transaction_id = %record.transaction_id,
            action = record.action.as_str(),
            confidence_score = record.confidence_score,
            "Published assessment"
        );

        Ok(())
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}
