//! Fraud assessment data structures

use crate::types::transaction::{Location, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::error;

/// A single [0, 1] risk estimate produced by one extractor
#[derive(Debug, Clone, PartialEq)]
pub struct RiskSignal {
    pub name: &'static str,
    pub value: f64,
    pub flag: Option<&'static str>,
}

impl RiskSignal {
    /// Create a signal, clamping values outside [0, 1].
    ///
    /// An out-of-range value is an extractor defect; it is logged and
    /// clamped, with NaN treated as maximum risk.
    pub fn new(name: &'static str, value: f64) -> Self {
        let value = if value.is_nan() {
            error!(signal = name, "Signal produced NaN, clamping to 1.0");
            1.0
        } else if !(0.0..=1.0).contains(&value) {
            error!(signal = name, value, "Signal outside [0, 1], clamping");
            value.clamp(0.0, 1.0)
        } else {
            value
        };

        Self {
            name,
            value,
            flag: None,
        }
    }

    /// Attach `flag` when the value is strictly above `threshold`.
    pub fn flag_above(mut self, threshold: f64, flag: &'static str) -> Self {
        if self.value > threshold {
            self.flag = Some(flag);
        }
        self
    }
}

/// Recommended handling of an assessed transaction, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendedAction {
    Approve,
    Flag,
    Block,
}

impl RecommendedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendedAction::Approve => "approve",
            RecommendedAction::Flag => "flag",
            RecommendedAction::Block => "block",
        }
    }
}

/// Human-readable risk level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    LowMedium,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Determine risk level from score and thresholds
    pub fn from_score(score: f64, thresholds: &RiskLevelThresholds) -> Self {
        if score >= thresholds.critical {
            RiskLevel::Critical
        } else if score >= thresholds.high {
            RiskLevel::High
        } else if score >= thresholds.medium {
            RiskLevel::Medium
        } else if score >= thresholds.low_medium {
            RiskLevel::LowMedium
        } else {
            RiskLevel::Low
        }
    }
}

/// Configurable risk level thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskLevelThresholds {
    pub low_medium: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskLevelThresholds {
    fn default() -> Self {
        Self {
            low_medium: 0.2,
            medium: 0.4,
            high: 0.6,
            critical: 0.8,
        }
    }
}

/// Score at or above which either composite marks a transaction high risk
pub const HIGH_RISK_SCORE: f64 = 0.7;

/// Outcome of scoring one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudAssessment {
    /// Unweighted mean of the confidence signals, rounded to 3 decimals
    pub confidence_score: f64,

    /// Weighted sum of the risk signals, capped at 1.0
    pub risk_score: f64,

    /// Decision derived from `confidence_score` only
    pub recommended_action: RecommendedAction,

    /// Classification of the larger of the two scores
    pub risk_level: RiskLevel,

    /// Flags in evaluation order
    pub flags: Vec<String>,

    /// Every signal's value keyed by signal name
    pub risk_breakdown: BTreeMap<String, f64>,
}

impl FraudAssessment {
    pub fn is_blocked(&self) -> bool {
        self.recommended_action == RecommendedAction::Block
    }

    /// Flagged for review, including blocked transactions
    pub fn is_flagged(&self) -> bool {
        self.recommended_action >= RecommendedAction::Flag
    }

    pub fn is_high_risk(&self) -> bool {
        self.confidence_score >= HIGH_RISK_SCORE || self.risk_score >= HIGH_RISK_SCORE
    }

    /// Flatten the assessment with transaction pass-through fields.
    pub fn to_record(&self, transaction: &Transaction) -> AssessmentRecord {
        AssessmentRecord {
            record_id: uuid::Uuid::new_v4().to_string(),
            transaction_id: transaction.transaction_id.clone(),
            user_id: transaction.user().map(str::to_string),
            amount: transaction.amount,
            currency: transaction.currency.clone(),
            location: transaction.location.clone(),
            timestamp: transaction.timestamp.to_rfc3339(),
            confidence_score: self.confidence_score,
            risk_score: self.risk_score,
            action: self.recommended_action,
            risk_level: self.risk_level,
            flags: self.flags.clone(),
            risk_breakdown: self.risk_breakdown.clone(),
        }
    }
}

/// Flat assessment record handed to storage and subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub record_id: String,
    pub transaction_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub location: Location,
    /// RFC 3339 transaction timestamp
    pub timestamp: String,
    pub confidence_score: f64,
    pub risk_score: f64,
    pub action: RecommendedAction,
    pub risk_level: RiskLevel,
    pub flags: Vec<String>,
    pub risk_breakdown: BTreeMap<String, f64>,
}
