//! Configuration management for the risk scoring service

use crate::history::memory::DEFAULT_MAX_RECORDS;
use crate::history::HistoryWindows;
use crate::signals::{
    AMOUNT_DEVIATION_RISK, GEOGRAPHIC_RISK, PAYMENT_METHOD_RISK, TIME_PATTERN_RISK, VELOCITY_RISK,
};
use crate::types::assessment::RiskLevelThresholds;
use anyhow::{anyhow, bail, Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming transactions
    pub transaction_subject: String,
    /// Subject for outgoing assessment records
    pub assessment_subject: String,
}

/// Scoring engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Confidence thresholds for the recommended action
    pub decision: DecisionThresholds,
    /// Risk-family weights keyed by signal name
    pub weights: HashMap<String, f64>,
    /// Risk level classification thresholds
    pub risk_levels: RiskLevelThresholds,
    /// Trailing history windows
    pub windows: HistoryWindows,
    /// Signal lookup tables
    pub signals: SignalConfig,
}

/// Confidence score thresholds, inclusive lower bounds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DecisionThresholds {
    pub block: f64,
    pub flag: f64,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            block: 0.8,
            flag: 0.5,
        }
    }
}

/// Lists and tables consulted by signal extractors
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Merchant name fragments treated as safe
    pub safe_merchants: Vec<String>,
    /// Country fragments treated as high risk
    pub high_risk_locations: Vec<String>,
    /// Country fragments treated as medium risk
    pub medium_risk_countries: Vec<String>,
    /// Risk per payment method
    pub payment_method_risks: HashMap<String, f64>,
    /// Risk for payment methods not in the table
    pub default_payment_method_risk: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        let mut payment_method_risks = HashMap::new();
        payment_method_risks.insert("credit_card".to_string(), 0.1);
        payment_method_risks.insert("debit_card".to_string(), 0.2);
        payment_method_risks.insert("digital_wallet".to_string(), 0.15);
        payment_method_risks.insert("cryptocurrency".to_string(), 0.8);
        payment_method_risks.insert("wire_transfer".to_string(), 0.6);
        payment_method_risks.insert("unknown".to_string(), 0.9);

        Self {
            safe_merchants: to_strings(&["amazon", "walmart", "target", "best buy", "apple", "google"]),
            high_risk_locations: to_strings(&["unknown", "tor", "proxy"]),
            medium_risk_countries: to_strings(&["nigeria", "russia", "china", "iran", "north korea"]),
            payment_method_risks,
            default_payment_method_risk: 0.5,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_weights() -> HashMap<String, f64> {
    let mut weights = HashMap::new();
    weights.insert(VELOCITY_RISK.to_string(), 0.25);
    weights.insert(GEOGRAPHIC_RISK.to_string(), 0.20);
    weights.insert(AMOUNT_DEVIATION_RISK.to_string(), 0.30);
    weights.insert(TIME_PATTERN_RISK.to_string(), 0.15);
    weights.insert(PAYMENT_METHOD_RISK.to_string(), 0.10);
    weights
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            decision: DecisionThresholds::default(),
            weights: default_weights(),
            risk_levels: RiskLevelThresholds::default(),
            windows: HistoryWindows::default(),
            signals: SignalConfig::default(),
        }
    }
}

impl ScoringConfig {
    /// Reject settings that would break score or decision invariants.
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, value: f64| -> Result<()> {
            if !(0.0..=1.0).contains(&value) {
                bail!("{} must be within [0, 1], got {}", name, value);
            }
            Ok(())
        };

        unit("decision.block", self.decision.block)?;
        unit("decision.flag", self.decision.flag)?;
        if self.decision.flag > self.decision.block {
            bail!(
                "decision.flag ({}) must not exceed decision.block ({})",
                self.decision.flag,
                self.decision.block
            );
        }

        for (name, weight) in &self.weights {
            if !weight.is_finite() || *weight < 0.0 {
                bail!("weight for {} must be non-negative, got {}", name, weight);
            }
        }

        for (method, risk) in &self.signals.payment_method_risks {
            unit(&format!("payment_method_risks.{}", method), *risk)?;
        }
        unit(
            "default_payment_method_risk",
            self.signals.default_payment_method_risk,
        )?;

        let invalid = self.windows.non_positive();
        if !invalid.is_empty() {
            bail!("history windows must be positive: {}", invalid.join(", "));
        }

        Ok(())
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum transactions scored concurrently
    pub workers: usize,
    /// Seconds between metrics summaries
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
    /// Assessment records kept in memory
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

fn default_report_interval() -> u64 {
    30
}

fn default_max_records() -> usize {
    DEFAULT_MAX_RECORDS
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl LoggingConfig {
    /// Install the global tracing subscriber. `RUST_LOG` overrides `level`.
    pub fn init(&self) -> Result<()> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .with_context(|| format!("Invalid log level {:?}", self.level))?;

        let builder = tracing_subscriber::fmt().with_env_filter(filter);
        let installed = match self.format.as_str() {
            "json" => builder.json().try_init(),
            "pretty" => builder.pretty().try_init(),
            other => bail!("Unknown log format {:?} (expected json or pretty)", other),
        };

        installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        let app: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app.scoring
            .validate()
            .context("Invalid scoring configuration")?;

        Ok(app)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                transaction_subject: "transactions".to_string(),
                assessment_subject: "transactions.assessed".to_string(),
            },
            scoring: ScoringConfig::default(),
            pipeline: PipelineConfig {
                workers: 4,
                report_interval_secs: default_report_interval(),
                max_records: default_max_records(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.scoring.decision.block, 0.8);
        assert_eq!(config.scoring.decision.flag, 0.5);
        assert_eq!(config.scoring.weights.len(), 5);
        assert!(config.scoring.validate().is_ok());
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let total: f64 = default_weights().values().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(default_weights().get(AMOUNT_DEVIATION_RISK), Some(&0.30));
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config = AppConfig::load().unwrap();
        let defaults = ScoringConfig::default();

        assert_eq!(config.scoring.weights, defaults.weights);
        assert_eq!(config.scoring.signals.safe_merchants, defaults.signals.safe_merchants);
        assert_eq!(
            config.scoring.signals.payment_method_risks,
            defaults.signals.payment_method_risks
        );
        assert_eq!(config.scoring.windows.deviation_days, 60);
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let logging = LoggingConfig {
            level: "info".to_string(),
            format: "xml".to_string(),
        };
        assert!(logging.init().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let mut scoring = ScoringConfig::default();
        scoring.decision.flag = 0.9;
        assert!(scoring.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_weight() {
        let mut scoring = ScoringConfig::default();
        scoring.weights.insert(VELOCITY_RISK.to_string(), -0.1);
        assert!(scoring.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_window() {
        let mut scoring = ScoringConfig::default();
        scoring.windows.frequency_minutes = 0;
        assert!(scoring.validate().is_err());
    }

    #[test]
    fn test_load_partial_scoring_section() {
        let path = std::env::temp_dir().join(format!("risk-config-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[nats]
url = "nats://nats:4222"
transaction_subject = "tx"
assessment_subject = "tx.assessed"

[scoring.decision]
block = 0.9
flag = 0.6

[pipeline]
workers = 8

[logging]
level = "debug"
format = "pretty"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.nats.assessment_subject, "tx.assessed");
        assert_eq!(config.scoring.decision.block, 0.9);
        assert_eq!(config.scoring.weights.len(), 5);
        assert_eq!(config.scoring.windows.location_days, 90);
        assert_eq!(config.pipeline.report_interval_secs, 30);
        assert_eq!(config.pipeline.max_records, DEFAULT_MAX_RECORDS);
    }
}
