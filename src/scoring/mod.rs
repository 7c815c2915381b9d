//! Scoring: aggregation, decisioning, and assessment assembly

pub mod aggregator;
pub mod decision;
pub mod engine;

pub use aggregator::ScoreAggregator;
pub use decision::DecisionPolicy;
pub use engine::RiskEngine;
