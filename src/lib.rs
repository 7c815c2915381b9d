//! Fraud Risk Scoring Library
//!
//! Explainable per-transaction fraud scoring: ten independent risk signals
//! over a user's recent history, folded into a confidence score that drives
//! an approve / flag / block recommendation and an advisory weighted risk
//! score.

pub mod config;
pub mod consumer;
pub mod error;
pub mod history;
pub mod metrics;
pub mod pipeline;
pub mod producer;
pub mod scoring;
pub mod signals;
pub mod types;

pub use config::AppConfig;
pub use consumer::TransactionConsumer;
pub use error::{ProviderError, ScoringError, ValidationError};
pub use history::{HistoricalContext, HistoryProvider, InMemoryHistoryStore};
pub use producer::AssessmentProducer;
pub use scoring::RiskEngine;
pub use types::{AssessmentRecord, FraudAssessment, RecommendedAction, Transaction};
