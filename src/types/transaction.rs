//! Transaction data structures submitted for fraud risk scoring

use crate::error::ValidationError;
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Geographic location a transaction was made from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub country: String,
    pub city: String,

    /// Latitude in degrees, [-90, 90]
    #[serde(alias = "lat")]
    pub latitude: f64,

    /// Longitude in degrees, [-180, 180]
    #[serde(alias = "lng", alias = "lon")]
    pub longitude: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

impl Location {
    pub fn new(country: &str, city: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            country: country.to_string(),
            city: city.to_string(),
            latitude,
            longitude,
            region: None,
            postal_code: None,
            ip_address: None,
        }
    }

    /// True when neither country nor city carries any information.
    pub fn is_unspecified(&self) -> bool {
        self.country.trim().is_empty() && self.city.trim().is_empty()
    }

    /// Key used to compare locations against a user's history.
    pub fn key(&self) -> (String, String) {
        (self.country.clone(), self.city.clone())
    }

    /// Great-circle distance in kilometers (haversine).
    pub fn distance_to(&self, other: &Location) -> f64 {
        let (lat1, lon1) = (self.latitude.to_radians(), self.longitude.to_radians());
        let (lat2, lon2) = (other.latitude.to_radians(), other.longitude.to_radians());

        let a = ((lat2 - lat1) / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * ((lon2 - lon1) / 2.0).sin().powi(2);
        2.0 * a.sqrt().asin() * EARTH_RADIUS_KM
    }
}

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A payment transaction to be assessed for fraud risk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction identifier
    pub transaction_id: String,

    /// Submitting user; absent users degrade history-based signals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Amount in `currency` units, must be positive
    pub amount: f64,

    #[serde(default = "default_currency")]
    pub currency: String,

    /// Merchant display name
    pub merchant: String,

    pub location: Location,

    /// Payment method, e.g. `credit_card`, `cryptocurrency`
    pub payment_method: String,

    /// Submission time (defaults to receipt time)
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Hour of day [0, 23]; derived from `timestamp` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_last_four: Option<String>,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Transaction {
    /// Create a new transaction with required fields
    pub fn new(
        transaction_id: &str,
        user_id: &str,
        amount: f64,
        merchant: &str,
        location: Location,
        payment_method: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            transaction_id: transaction_id.to_string(),
            user_id: Some(user_id.to_string()),
            amount,
            currency: default_currency(),
            merchant: merchant.to_string(),
            location,
            payment_method: payment_method.to_string(),
            timestamp,
            hour: None,
            category: None,
            description: None,
            device_id: None,
            session_id: None,
            card_last_four: None,
        }
    }

    /// Override the reported hour of day
    pub fn with_hour(mut self, hour: u8) -> Self {
        self.hour = Some(hour);
        self
    }

    /// User identifier, treating a blank id as absent.
    pub fn user(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Hour of day the transaction is scored at.
    pub fn hour_of_day(&self) -> u8 {
        self.hour.unwrap_or_else(|| self.timestamp.hour() as u8)
    }

    /// Check the fields scoring depends on. An empty result means the
    /// transaction can be scored.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.transaction_id.trim().is_empty() {
            errors.push(ValidationError::MissingTransactionId);
        }

        if !self.amount.is_finite() || self.amount <= 0.0 {
            errors.push(ValidationError::NonPositiveAmount(self.amount));
        }

        if self.payment_method.trim().is_empty() {
            errors.push(ValidationError::MissingPaymentMethod);
        }

        if !(-90.0..=90.0).contains(&self.location.latitude) {
            errors.push(ValidationError::LatitudeOutOfRange(self.location.latitude));
        }

        if !(-180.0..=180.0).contains(&self.location.longitude) {
            errors.push(ValidationError::LongitudeOutOfRange(self.location.longitude));
        }

        if let Some(hour) = self.hour {
            if hour > 23 {
                errors.push(ValidationError::HourOutOfRange(hour));
            }
        }

        errors
    }
}
