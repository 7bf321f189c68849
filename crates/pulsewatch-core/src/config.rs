//! Configuration for the monitoring core
//!
//! Plain serde structs with defaults; loading them from files or the
//! environment is left to the embedding application.

use serde::{Deserialize, Serialize};

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Scheduler and metric store configuration
    pub monitor: MonitorConfig,

    /// Alerting configuration
    pub alerting: AlertingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Scheduler and metric store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between scheduled health check ticks
    pub check_interval_seconds: u64,

    /// Rolling history samples retained per (entity, metric)
    pub history_limit: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_seconds: 30,
            history_limit: 1024,
        }
    }
}

/// Alerting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertingConfig {
    /// Duplicate-suppression window applied when a rule has no cooldown of
    /// its own, in seconds
    pub default_cooldown_seconds: u64,

    /// Whether the escalation scheduler runs at all
    pub escalation_enabled: bool,

    /// Delivery retry attempts, carried for the injected notifier to honor
    pub notification_retry_attempts: u32,

    /// Delay between delivery retries in seconds, carried for the notifier
    pub notification_retry_delay_seconds: u64,
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            default_cooldown_seconds: 300,
            escalation_enabled: true,
            notification_retry_attempts: 3,
            notification_retry_delay_seconds: 30,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
