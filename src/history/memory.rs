//! In-memory transaction history and assessment store
//!
//! Serves as the [`HistoryProvider`] for the scoring service and as the
//! persistence collaborator for assessed transactions. Reads for one user
//! may race with writes for the same user from other in-flight requests;
//! that read skew is accepted.

use super::{ContextRequest, HistoricalContext, HistoryProvider, HistoryWindows};
use crate::error::{ProviderError, StorageError};
use crate::types::assessment::{
    AssessmentRecord, FraudAssessment, RecommendedAction, HIGH_RISK_SCORE,
};
use crate::types::transaction::Transaction;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use tracing::debug;

/// What the store remembers about a past transaction for scoring
#[derive(Debug, Clone)]
struct HistoryEntry {
    timestamp: DateTime<Utc>,
    amount: f64,
    country: String,
    city: String,
    hour: u8,
}

impl HistoryEntry {
    fn from_transaction(tx: &Transaction) -> Self {
        Self {
            timestamp: tx.timestamp,
            amount: tx.amount,
            country: tx.location.country.clone(),
            city: tx.location.city.clone(),
            hour: tx.hour_of_day(),
        }
    }

    fn within(&self, as_of: DateTime<Utc>, window: Duration) -> bool {
        self.timestamp <= as_of && self.timestamp >= as_of - window
    }
}

#[derive(Debug, Clone)]
struct StoredRecord {
    timestamp: DateTime<Utc>,
    record: AssessmentRecord,
}

/// Aggregate outcome counts across every stored assessment
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FraudStatistics {
    pub total_transactions: u64,
    pub flagged_transactions: u64,
    pub blocked_transactions: u64,
    pub approved_transactions: u64,
    /// Percentage of flagged or blocked transactions, 2 decimals
    pub fraud_rate: f64,
}

/// High-risk activity grouped by location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatMapCell {
    pub country: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub fraud_count: u64,
    pub avg_risk_score: f64,
}

/// Assessment records kept when no limit is configured
pub const DEFAULT_MAX_RECORDS: usize = 100_000;

/// Thread-safe in-memory store keyed by user
///
/// Each user's history is kept in timestamp order and trimmed to
/// `retention` behind the user's newest entry. Assessment records are
/// capped at `max_records`, oldest dropped first.
#[derive(Debug)]
pub struct InMemoryHistoryStore {
    history: RwLock<HashMap<String, Vec<HistoryEntry>>>,
    records: RwLock<Vec<StoredRecord>>,
    retention: Duration,
    max_records: usize,
}

impl Default for InMemoryHistoryStore {
    fn default() -> Self {
        Self::with_limits(HistoryWindows::default().longest(), DEFAULT_MAX_RECORDS)
    }
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(retention: Duration, max_records: usize) -> Self {
        Self {
            history: RwLock::new(HashMap::new()),
            records: RwLock::new(Vec::new()),
            retention,
            max_records: max_records.max(1),
        }
    }

    /// Add a transaction to its user's history without an assessment.
    pub fn record_transaction(&self, tx: &Transaction) -> Result<(), StorageError> {
        let Some(user_id) = tx.user() else {
            return Ok(());
        };

        let mut history = self.history.write().map_err(|_| StorageError::Poisoned)?;
        let entries = history.entry(user_id.to_string()).or_default();

        let entry = HistoryEntry::from_transaction(tx);
        let position = entries.partition_point(|e| e.timestamp <= entry.timestamp);
        entries.insert(position, entry);

        if let Some(newest) = entries.last().map(|e| e.timestamp) {
            let cutoff = newest - self.retention;
            let stale = entries.partition_point(|e| e.timestamp < cutoff);
            if stale > 0 {
                entries.drain(..stale);
            }
        }
        Ok(())
    }

    /// Drop history older than the retention window before `as_of` for
    /// every user. Returns the number of entries removed.
    pub fn prune(&self, as_of: DateTime<Utc>) -> Result<usize, StorageError> {
        let cutoff = as_of - self.retention;
        let mut history = self.history.write().map_err(|_| StorageError::Poisoned)?;

        let mut removed = 0;
        history.retain(|_, entries| {
            let stale = entries.partition_point(|e| e.timestamp < cutoff);
            entries.drain(..stale);
            removed += stale;
            !entries.is_empty()
        });

        if removed > 0 {
            debug!(removed, "Pruned expired history");
        }
        Ok(removed)
    }

    /// Store an assessed transaction and return its flat record.
    pub fn record(
        &self,
        tx: &Transaction,
        assessment: &FraudAssessment,
    ) -> Result<AssessmentRecord, StorageError> {
        self.record_transaction(tx)?;

        let record = assessment.to_record(tx);
        let mut records = self.records.write().map_err(|_| StorageError::Poisoned)?;
        records.push(StoredRecord {
            timestamp: tx.timestamp,
            record: record.clone(),
        });
        if records.len() > self.max_records {
            let excess = records.len() - self.max_records;
            records.drain(..excess);
        }
        drop(records);

        debug!(
            transaction_id = %tx.transaction_id,
            record_id = %record.record_id,
            "Stored assessment"
        );
        Ok(record)
    }

    /// Records within `window` before `as_of`, newest first.
    pub fn recent(
        &self,
        as_of: DateTime<Utc>,
        window: Duration,
        limit: usize,
    ) -> Result<Vec<AssessmentRecord>, StorageError> {
        let records = self.records.read().map_err(|_| StorageError::Poisoned)?;
        let mut matching: Vec<&StoredRecord> = records
            .iter()
            .filter(|stored| stored.timestamp <= as_of && stored.timestamp >= as_of - window)
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(matching
            .into_iter()
            .take(limit)
            .map(|stored| stored.record.clone())
            .collect())
    }

    /// Records with a high score or a flag/block action, newest first.
    pub fn high_risk(&self, limit: usize) -> Result<Vec<AssessmentRecord>, StorageError> {
        let records = self.records.read().map_err(|_| StorageError::Poisoned)?;
        let mut matching: Vec<&StoredRecord> = records
            .iter()
            .filter(|stored| {
                let record = &stored.record;
                record.confidence_score >= HIGH_RISK_SCORE
                    || record.risk_score >= HIGH_RISK_SCORE
                    || record.action >= RecommendedAction::Flag
            })
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(matching
            .into_iter()
            .take(limit)
            .map(|stored| stored.record.clone())
            .collect())
    }

    /// Outcome counts over the retained records.
    pub fn statistics(&self) -> Result<FraudStatistics, StorageError> {
        let records = self.records.read().map_err(|_| StorageError::Poisoned)?;

        let mut stats = FraudStatistics::default();
        for stored in records.iter() {
            stats.total_transactions += 1;
            match stored.record.action {
                RecommendedAction::Approve => stats.approved_transactions += 1,
                RecommendedAction::Flag => stats.flagged_transactions += 1,
                RecommendedAction::Block => stats.blocked_transactions += 1,
            }
        }

        if stats.total_transactions > 0 {
            let rate = (stats.flagged_transactions + stats.blocked_transactions) as f64
                / stats.total_transactions as f64
                * 100.0;
            stats.fraud_rate = (rate * 100.0).round() / 100.0;
        }

        Ok(stats)
    }

    /// Group records in the window whose risk score reaches
    /// `min_risk_score` by (country, city).
    pub fn heat_map(
        &self,
        as_of: DateTime<Utc>,
        window: Duration,
        min_risk_score: f64,
    ) -> Result<Vec<HeatMapCell>, StorageError> {
        let records = self.records.read().map_err(|_| StorageError::Poisoned)?;

        let mut cells: BTreeMap<(String, String), (HeatMapCell, f64)> = BTreeMap::new();
        for stored in records.iter() {
            if stored.timestamp > as_of || stored.timestamp < as_of - window {
                continue;
            }
            let record = &stored.record;
            if record.risk_score < min_risk_score {
                continue;
            }

            let (cell, score_sum) = cells
                .entry(record.location.key())
                .or_insert_with(|| {
                    (
                        HeatMapCell {
                            country: record.location.country.clone(),
                            city: record.location.city.clone(),
                            latitude: record.location.latitude,
                            longitude: record.location.longitude,
                            fraud_count: 0,
                            avg_risk_score: 0.0,
                        },
                        0.0,
                    )
                });
            cell.fraud_count += 1;
            *score_sum += record.risk_score;
        }

        Ok(cells
            .into_values()
            .map(|(mut cell, score_sum)| {
                cell.avg_risk_score = score_sum / cell.fraud_count as f64;
                cell
            })
            .collect())
    }

    fn build_context(&self, request: &ContextRequest<'_>) -> Result<HistoricalContext, StorageError> {
        let history = self.history.read().map_err(|_| StorageError::Poisoned)?;
        let Some(entries) = history.get(request.user_id) else {
            return Ok(HistoricalContext::empty());
        };

        let as_of = request.as_of;
        let windows = request.windows;
        let mut context = HistoricalContext::empty();

        for entry in entries.iter().take_while(|entry| entry.timestamp <= as_of) {
            context.total_count += 1;
            if entry.within(as_of, windows.amount()) {
                context.recent_amounts.push(entry.amount);
            }
            if entry.within(as_of, windows.deviation()) {
                context.deviation_amounts.push(entry.amount);
            }
            if entry.within(as_of, windows.location()) {
                context.location_window_count += 1;
                context
                    .known_locations
                    .insert((entry.country.clone(), entry.city.clone()));
            }
            if entry.within(as_of, windows.frequency()) {
                context.count_last_hour += 1;
            }
            if entry.within(as_of, windows.velocity()) {
                context.count_last_day += 1;
            }
            if entry.within(as_of, windows.time_pattern()) {
                if let Some(slot) = context.hour_histogram.get_mut(entry.hour as usize) {
                    *slot += 1;
                }
            }
        }

        Ok(context)
    }
}

impl HistoryProvider for InMemoryHistoryStore {
    fn get_context(&self, request: &ContextRequest<'_>) -> Result<HistoricalContext, ProviderError> {
        self.build_context(request)
            .map_err(|e| ProviderError::Unavailable {
                user_id: request.user_id.to_string(),
                reason: e.to_string(),
            })
    }
}
