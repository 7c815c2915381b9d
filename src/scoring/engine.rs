//! Risk engine: assembles a fraud assessment for one transaction

use crate::config::ScoringConfig;
use crate::error::ScoringError;
use crate::history::{ContextRequest, HistoricalContext, HistoryProvider, HistoryWindows};
use crate::scoring::aggregator::ScoreAggregator;
use crate::scoring::decision::DecisionPolicy;
use crate::signals::{self, RiskSignalExtractor};
use crate::types::assessment::{FraudAssessment, RiskLevel, RiskLevelThresholds, RiskSignal};
use crate::types::transaction::Transaction;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Scores transactions against their users' history.
///
/// Holds no per-request state: every call fetches a fresh historical
/// context, so one engine can serve concurrent requests.
pub struct RiskEngine {
    provider: Arc<dyn HistoryProvider>,
    windows: HistoryWindows,
    /// Confidence family, in flag evaluation order
    confidence_signals: Vec<Box<dyn RiskSignalExtractor>>,
    /// Risk family
    risk_signals: Vec<Box<dyn RiskSignalExtractor>>,
    aggregator: ScoreAggregator,
    policy: DecisionPolicy,
    risk_levels: RiskLevelThresholds,
}

impl RiskEngine {
    /// Create an engine from configuration
    pub fn new(config: &ScoringConfig, provider: Arc<dyn HistoryProvider>) -> Self {
        Self {
            provider,
            windows: config.windows.clone(),
            confidence_signals: signals::confidence_family(&config.signals),
            risk_signals: signals::risk_family(&config.signals),
            aggregator: ScoreAggregator::new(config.weights.clone()),
            policy: DecisionPolicy::new(&config.decision),
            risk_levels: config.risk_levels.clone(),
        }
    }

    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    /// Assess a transaction using its own timestamp as the time reference.
    pub fn assess(&self, tx: &Transaction) -> Result<FraudAssessment, ScoringError> {
        self.assess_at(tx, tx.timestamp)
    }

    /// Assess a transaction with history windows ending at `as_of`.
    pub fn assess_at(
        &self,
        tx: &Transaction,
        as_of: DateTime<Utc>,
    ) -> Result<FraudAssessment, ScoringError> {
        let errors = tx.validate();
        if !errors.is_empty() {
            return Err(ScoringError::Invalid(errors));
        }

        let context = self.fetch_context(tx, as_of)?;
        Ok(self.evaluate(tx, &context))
    }

    fn fetch_context(
        &self,
        tx: &Transaction,
        as_of: DateTime<Utc>,
    ) -> Result<HistoricalContext, ScoringError> {
        // Without a user there is no history to ask for
        let Some(user_id) = tx.user() else {
            return Ok(HistoricalContext::empty());
        };

        let request = ContextRequest {
            user_id,
            as_of,
            windows: &self.windows,
        };

        self.provider.get_context(&request).map_err(|e| {
            warn!(
                transaction_id = %tx.transaction_id,
                user_id = %user_id,
                error = %e,
                "Historical context unavailable"
            );
            ScoringError::HistoryUnavailable(e)
        })
    }

    /// Score a transaction against an already fetched context.
    pub fn evaluate(&self, tx: &Transaction, context: &HistoricalContext) -> FraudAssessment {
        let confidence_signals = run(&self.confidence_signals, tx, context);
        let risk_signals = run(&self.risk_signals, tx, context);

        let assessment = self.assemble(&confidence_signals, &risk_signals);

        debug!(
            transaction_id = %tx.transaction_id,
            confidence_score = assessment.confidence_score,
            risk_score = assessment.risk_score,
            action = assessment.recommended_action.as_str(),
            flags = ?assessment.flags,
            "Transaction assessed"
        );

        assessment
    }

    /// Combine evaluated signals into an assessment.
    pub fn assemble(
        &self,
        confidence_signals: &[RiskSignal],
        risk_signals: &[RiskSignal],
    ) -> FraudAssessment {
        let confidence_score = self.aggregator.confidence(confidence_signals);
        let risk_score = self.aggregator.risk(risk_signals);
        let recommended_action = self.policy.decide(confidence_score);
        let risk_level =
            RiskLevel::from_score(confidence_score.max(risk_score), &self.risk_levels);

        let flags = confidence_signals
            .iter()
            .filter_map(|signal| signal.flag.map(str::to_string))
            .collect();

        let risk_breakdown: BTreeMap<String, f64> = confidence_signals
            .iter()
            .chain(risk_signals)
            .map(|signal| (signal.name.to_string(), signal.value))
            .collect();

        FraudAssessment {
            confidence_score,
            risk_score,
            recommended_action,
            risk_level,
            flags,
            risk_breakdown,
        }
    }
}

fn run(
    extractors: &[Box<dyn RiskSignalExtractor>],
    tx: &Transaction,
    context: &HistoricalContext,
) -> Vec<RiskSignal> {
    extractors
        .iter()
        .map(|extractor| {
            let signal = extractor.extract(tx, context);
            debug!(
                transaction_id = %tx.transaction_id,
                signal = signal.name,
                value = signal.value,
                "Signal evaluated"
            );
            signal
        })
        .collect()
}
