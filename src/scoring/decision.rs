//! Decision policy mapping confidence to a recommended action

use crate::config::DecisionThresholds;
use crate::types::assessment::RecommendedAction;

/// Threshold classification of the confidence score.
///
/// The risk score is advisory and never consulted here.
#[derive(Debug, Clone)]
pub struct DecisionPolicy {
    block: f64,
    flag: f64,
}

impl DecisionPolicy {
    pub fn new(thresholds: &DecisionThresholds) -> Self {
        Self {
            block: thresholds.block,
            flag: thresholds.flag,
        }
    }

    pub fn decide(&self, confidence_score: f64) -> RecommendedAction {
        if confidence_score >= self.block {
            RecommendedAction::Block
        } else if confidence_score >= self.flag {
            RecommendedAction::Flag
        } else {
            RecommendedAction::Approve
        }
    }
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::new(&DecisionThresholds::default())
    }
}
