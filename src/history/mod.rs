//! Historical context supplied to signal extractors
//!
//! The engine never queries a datastore directly. It asks a
//! [`HistoryProvider`] for the aggregates of one user as of an explicit
//! point in time, and every extractor reads from the resulting
//! [`HistoricalContext`].

pub mod memory;

pub use memory::InMemoryHistoryStore;

use crate::error::ProviderError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Trailing windows the context aggregates over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryWindows {
    /// Frequency window in minutes
    pub frequency_minutes: i64,
    /// Velocity window in hours
    pub velocity_hours: i64,
    /// Window for the confidence-family amount signal, in days
    pub amount_days: i64,
    /// Window for the risk-family amount deviation signal, in days
    pub deviation_days: i64,
    /// Window for known locations, in days
    pub location_days: i64,
    /// Window for the user's hour-of-day profile, in days
    pub time_pattern_days: i64,
}

impl HistoryWindows {
    pub fn frequency(&self) -> Duration {
        Duration::minutes(self.frequency_minutes)
    }

    pub fn velocity(&self) -> Duration {
        Duration::hours(self.velocity_hours)
    }

    pub fn amount(&self) -> Duration {
        Duration::days(self.amount_days)
    }

    pub fn deviation(&self) -> Duration {
        Duration::days(self.deviation_days)
    }

    pub fn location(&self) -> Duration {
        Duration::days(self.location_days)
    }

    pub fn time_pattern(&self) -> Duration {
        Duration::days(self.time_pattern_days)
    }

    /// Widest configured window; older history never affects scoring.
    pub fn longest(&self) -> Duration {
        [
            self.frequency(),
            self.velocity(),
            self.amount(),
            self.deviation(),
            self.location(),
            self.time_pattern(),
        ]
        .into_iter()
        .max()
        .unwrap_or_else(Duration::zero)
    }

    /// Names of windows that are not strictly positive.
    pub fn non_positive(&self) -> Vec<&'static str> {
        [
            ("frequency_minutes", self.frequency_minutes),
            ("velocity_hours", self.velocity_hours),
            ("amount_days", self.amount_days),
            ("deviation_days", self.deviation_days),
            ("location_days", self.location_days),
            ("time_pattern_days", self.time_pattern_days),
        ]
        .into_iter()
        .filter(|(_, value)| *value <= 0)
        .map(|(name, _)| name)
        .collect()
    }
}

impl Default for HistoryWindows {
    fn default() -> Self {
        Self {
            frequency_minutes: 60,
            velocity_hours: 24,
            amount_days: 30,
            deviation_days: 60,
            location_days: 90,
            time_pattern_days: 30,
        }
    }
}

/// Request for one user's history as of a fixed instant
#[derive(Debug, Clone)]
pub struct ContextRequest<'a> {
    pub user_id: &'a str,
    pub as_of: DateTime<Utc>,
    pub windows: &'a HistoryWindows,
}

/// Read-only view of a user's past behavior over the configured windows
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoricalContext {
    /// Amounts within the amount window, oldest first
    pub recent_amounts: Vec<f64>,
    /// Amounts within the deviation window, oldest first
    pub deviation_amounts: Vec<f64>,
    /// Distinct (country, city) pairs within the location window
    pub known_locations: BTreeSet<(String, String)>,
    /// Transactions within the location window
    pub location_window_count: usize,
    /// Every retained transaction at or before the reference time
    pub total_count: usize,
    /// Transactions within the frequency window
    pub count_last_hour: usize,
    /// Transactions within the velocity window
    pub count_last_day: usize,
    /// Hour-of-day histogram over the time-pattern window
    pub hour_histogram: [u32; 24],
}

impl HistoricalContext {
    /// A valid context for a user with no recorded history.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Transactions within the time-pattern window
    pub fn hour_sample_count(&self) -> usize {
        self.hour_histogram.iter().map(|&count| count as usize).sum()
    }

    /// Share of time-pattern samples that fall in `hour`.
    pub fn hour_frequency(&self, hour: u8) -> f64 {
        let total = self.hour_sample_count();
        if total == 0 {
            return 0.0;
        }
        let at_hour = self
            .hour_histogram
            .get(hour as usize)
            .copied()
            .unwrap_or(0);
        at_hour as f64 / total as f64
    }

    pub fn knows_location(&self, country: &str, city: &str) -> bool {
        self.known_locations
            .contains(&(country.to_string(), city.to_string()))
    }
}

/// Source of per-user historical aggregates
///
/// Implementations may cache internally. A user with no history must be
/// reported as an empty context, never as an error; an unreachable
/// backend must be reported as [`ProviderError`].
pub trait HistoryProvider: Send + Sync {
    fn get_context(&self, request: &ContextRequest<'_>) -> Result<HistoricalContext, ProviderError>;
}
