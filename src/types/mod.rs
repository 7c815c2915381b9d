//! Type definitions for transaction risk scoring

pub mod assessment;
pub mod transaction;

pub use assessment::{
    AssessmentRecord, FraudAssessment, RecommendedAction, RiskLevel, RiskLevelThresholds,
    RiskSignal,
};
pub use transaction::{Location, Transaction};
