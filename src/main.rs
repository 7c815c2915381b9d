//! Fraud Risk Scoring - Main Entry Point
//!
//! Consumes transactions from NATS, scores them against each user's history,
//! and publishes assessment records. Transactions are scored in parallel up
//! to the configured worker count.

use anyhow::{Context, Result};
use fraud_risk_scoring::{
    config::AppConfig,
    consumer::TransactionConsumer,
    metrics::{MetricsReporter, PipelineMetrics},
    pipeline::process,
    producer::AssessmentProducer,
    InMemoryHistoryStore, RiskEngine,
};
use chrono::Utc;
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Configuration not loaded ({:#}), using defaults", e);
        AppConfig::default()
    });

    config.logging.init()?;
    info!("Starting Fraud Risk Scoring service");
    info!(
        block = config.scoring.decision.block,
        flag = config.scoring.decision.flag,
        "Decision thresholds"
    );

    let metrics = Arc::new(PipelineMetrics::new());
    let store = Arc::new(InMemoryHistoryStore::with_limits(
        config.scoring.windows.longest(),
        config.pipeline.max_records,
    ));
    let engine = Arc::new(RiskEngine::new(&config.scoring, store.clone()));

    let client = async_nats::connect(&config.nats.url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", config.nats.url))?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = TransactionConsumer::new(client.clone(), &config.nats.transaction_subject);
    let producer = Arc::new(AssessmentProducer::new(
        client.clone(),
        &config.nats.assessment_subject,
    ));

    let num_workers = config.pipeline.workers.max(1);
    info!(
        workers = num_workers,
        transactions = consumer.subject(),
        assessments = producer.subject(),
        "Starting transaction processing loop"
    );

    // Bounds the number of in-flight assessments
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));

    let reporter = MetricsReporter::new(
        metrics.clone(),
        store.clone(),
        config.pipeline.report_interval_secs,
    );
    tokio::spawn(reporter.start());

    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .context("Worker semaphore closed")?;

        let engine = engine.clone();
        let store = store.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();

            let (assessment, record) =
                match process(&engine, &store, &message.payload, Utc::now()) {
                    Ok(processed) => processed,
                    Err(e) => {
                        warn!(kind = e.kind(), error = %e, "Transaction not assessed");
                        metrics.record_failure(e.kind());
                        drop(permit);
                        return;
                    }
                };
            let tx_id = record.transaction_id.clone();

            let processing_time = start_time.elapsed();
            metrics.record_assessment(processing_time, &assessment);

            if let Err(e) = producer.publish(&record).await {
                error!(transaction_id = %tx_id, error = %e, "Failed to publish assessment");
                metrics.record_failure("publish");
            } else if assessment.is_flagged() {
                info!(
                    transaction_id = %tx_id,
                    confidence_score = assessment.confidence_score,
                    risk_score = assessment.risk_score,
                    action = assessment.recommended_action.as_str(),
                    flags = ?assessment.flags,
                    processing_time_us = processing_time.as_micros() as u64,
                    "Transaction held for review"
                );
            } else {
                debug!(
                    transaction_id = %tx_id,
                    confidence_score = assessment.confidence_score,
                    processing_time_us = processing_time.as_micros() as u64,
                    "Transaction approved"
                );
            }

            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
            if count % 100 == 0 {
                let processing_stats = metrics.get_processing_stats();
                info!(
                    processed = count,
                    throughput = format!("{:.1} tx/s", metrics.get_throughput()),
                    avg_latency_us = processing_stats.mean_us,
                    "Processing milestone"
                );
            }

            drop(permit);
        });
    }

    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}
