//! Error types for the EWA engine.
//!
//! Calculation failures and configuration failures are kept apart:
//! [`CalcError`] is what a caller sees for a bad request, while
//! [`ConfigError`] only surfaces while country configurations are being
//! loaded.

use rust_decimal::Decimal;
use std::path::PathBuf;

/// Reasons a calculation request is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalcError {
    /// The pay cycle has no length, so nothing can be pro-rated over it.
    #[error("cycleDays must be positive, got {cycle_days}")]
    InvalidCycle { cycle_days: Decimal },

    /// `salary` or `daysWorked` was below zero.
    #[error("{field} must not be negative, got {value}")]
    NegativeInput { field: &'static str, value: Decimal },

    /// No configuration is registered for the requested country.
    #[error("no configuration for country '{code}'")]
    UnknownCountry { code: String },

    /// An intermediate amount exceeded the range of a decimal.
    #[error("amounts are too large to calculate")]
    AmountOutOfRange,
}

/// Failures while loading or validating country configurations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration for '{code}': {reason}")]
    Invalid { code: String, reason: String },

    #[error("country '{code}' is configured more than once")]
    Duplicate { code: String },
}
