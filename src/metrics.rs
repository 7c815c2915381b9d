//! Throughput, latency, and outcome tracking for the scoring service.

use crate::history::InMemoryHistoryStore;
use crate::types::assessment::{FraudAssessment, RecommendedAction};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Metrics collector for the scoring pipeline
pub struct PipelineMetrics {
    /// Transactions assessed successfully
    pub transactions_assessed: AtomicU64,
    /// Transactions that could not be assessed
    pub transactions_failed: AtomicU64,
    /// Assessments by recommended action
    by_action: RwLock<HashMap<RecommendedAction, u64>>,
    /// Failures by error kind
    failures_by_kind: RwLock<HashMap<String, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Confidence score distribution buckets
    confidence_buckets: RwLock<[u64; 10]>,
    start_time: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            transactions_assessed: AtomicU64::new(0),
            transactions_failed: AtomicU64::new(0),
            by_action: RwLock::new(HashMap::new()),
            failures_by_kind: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            confidence_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a completed assessment
    pub fn record_assessment(&self, processing_time: Duration, assessment: &FraudAssessment) {
        self.transactions_assessed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only the most recent samples
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        if let Ok(mut by_action) = self.by_action.write() {
            *by_action.entry(assessment.recommended_action).or_insert(0) += 1;
        }

        let bucket = (assessment.confidence_score * 10.0).clamp(0.0, 9.0) as usize;
        if let Ok(mut buckets) = self.confidence_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a transaction that failed at `kind` (decode, invalid, ...)
    pub fn record_failure(&self, kind: &str) {
        self.transactions_failed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut failures) = self.failures_by_kind.write() {
            *failures.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let Ok(times) = self.processing_times.read() else {
            return ProcessingStats::default();
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[((count as f64 * 0.95) as usize).min(count - 1)],
            p99_us: sorted[((count as f64 * 0.99) as usize).min(count - 1)],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (transactions per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.transactions_assessed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_confidence_distribution(&self) -> [u64; 10] {
        self.confidence_buckets
            .read()
            .map(|buckets| *buckets)
            .unwrap_or_default()
    }

    pub fn get_action_count(&self, action: RecommendedAction) -> u64 {
        self.by_action
            .read()
            .ok()
            .and_then(|by_action| by_action.get(&action).copied())
            .unwrap_or(0)
    }

    pub fn get_failures_by_kind(&self) -> HashMap<String, u64> {
        self.failures_by_kind
            .read()
            .map(|failures| failures.clone())
            .unwrap_or_default()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let assessed = self.transactions_assessed.load(Ordering::Relaxed);
        let failed = self.transactions_failed.load(Ordering::Relaxed);
        let approved = self.get_action_count(RecommendedAction::Approve);
        let flagged = self.get_action_count(RecommendedAction::Flag);
        let blocked = self.get_action_count(RecommendedAction::Block);
        let review_rate = if assessed > 0 {
            ((flagged + blocked) as f64 / assessed as f64) * 100.0
        } else {
            0.0
        };

        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();
        let distribution = self.get_confidence_distribution();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║             FRAUD RISK SCORING - METRICS SUMMARY             ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Transactions Assessed:  {:>8}  │  Throughput: {:>6.1} tx/s ║",
            assessed, throughput
        );
        info!(
            "║ Failed:                 {:>8}  │  Review Rate: {:>5.1}%     ║",
            failed, review_rate
        );
        info!(
            "║ Approved: {:>8}   Flagged: {:>8}   Blocked: {:>8}     ║",
            approved, flagged, blocked
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Confidence Score Distribution:                               ║");
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar_len = (pct / 2.0) as usize;
            let bar: String = "█".repeat(bar_len.min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");

        let failures = self.get_failures_by_kind();
        if !failures.is_empty() {
            info!("Failures by kind:");
            for (kind, count) in &failures {
                info!("  {}: {}", kind, count);
            }
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic reporter for pipeline metrics and store statistics. Also
/// prunes expired history on each tick.
pub struct MetricsReporter {
    metrics: Arc<PipelineMetrics>,
    store: Arc<InMemoryHistoryStore>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(
        metrics: Arc<PipelineMetrics>,
        store: Arc<InMemoryHistoryStore>,
        interval_secs: u64,
    ) -> Self {
        Self {
            metrics,
            store,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        loop {
            interval.tick().await;
            self.metrics.print_summary();

            match self.store.statistics() {
                Ok(stats) => info!(
                    total = stats.total_transactions,
                    flagged = stats.flagged_transactions,
                    blocked = stats.blocked_transactions,
                    approved = stats.approved_transactions,
                    fraud_rate = stats.fraud_rate,
                    "Store statistics"
                ),
                Err(e) => warn!(error = %e, "Store statistics unavailable"),
            }

            if let Err(e) = self.store.prune(Utc::now()) {
                warn!(error = %e, "History pruning failed");
            }
        }
    }
}
