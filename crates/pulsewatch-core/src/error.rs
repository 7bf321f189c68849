//! Error types for Pulsewatch

use thiserror::Error;

use crate::models::{AlertStatus, MetricType};

/// Result type alias using Pulsewatch's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Pulsewatch operations
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected metric sample (NaN, infinite, or otherwise out of domain)
    #[error("invalid metric sample: {0}")]
    InvalidMetric(String),

    /// No catalog entry registered for a metric type
    #[error("unknown metric type: {0}")]
    UnknownMetric(MetricType),

    /// Not found error
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Attempted state change from a terminal or incompatible state
    #[error("invalid transition for alert {id}: {from:?} -> {to:?}")]
    InvalidTransition {
        id: String,
        from: AlertStatus,
        to: AlertStatus,
    },

    /// Notification delivery failure surfaced from the injected notifier
    #[error("notification failed: {0}")]
    NotificationFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an invalid metric error
    pub fn invalid_metric(msg: impl Into<String>) -> Self {
        Self::InvalidMetric(msg.into())
    }

    /// Create an invalid transition error
    pub fn invalid_transition(id: impl Into<String>, from: AlertStatus, to: AlertStatus) -> Self {
        Self::InvalidTransition {
            id: id.into(),
            from,
            to,
        }
    }

    /// Create a notification failure error
    pub fn notification_failed(msg: impl Into<String>) -> Self {
        Self::NotificationFailed(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
