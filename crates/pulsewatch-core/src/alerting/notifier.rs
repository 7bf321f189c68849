//! Notification capability
//!
//! The core decides *that* and *to whom* a notification should go; delivery
//! transport (email, Slack, SMS, paging) is an injected capability
//! implemented by the embedding application. Delivery failures are surfaced
//! as errors and logged, never fatal to a tick, and the core performs no
//! retries of its own — retry settings ride along in `AlertingConfig` for
//! the implementation to honor.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::models::{Alert, NotificationChannel};

/// Delivery capability consumed by the health check executor
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification for an alert to the given channels and contacts
    async fn send(
        &self,
        alert: &Alert,
        channels: &[NotificationChannel],
        contacts: &[String],
    ) -> Result<()>;
}

/// Record of a sent notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Channel type
    pub channel_type: String,

    /// When it was sent
    pub sent_at: DateTime<Utc>,

    /// Whether it succeeded
    pub success: bool,

    /// Error message if failed
    pub error: Option<String>,
}

/// Default notifier that logs instead of delivering
///
/// Useful for embedding the engine before wiring real transport, and as the
/// demo binary's sink.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(
        &self,
        alert: &Alert,
        channels: &[NotificationChannel],
        contacts: &[String],
    ) -> Result<()> {
        let channel_kinds: Vec<&str> = channels.iter().map(NotificationChannel::kind).collect();

        info!(
            alert_id = alert.id,
            entity_id = alert.entity_id,
            severity = %alert.severity,
            channels = ?channel_kinds,
            contacts = ?contacts,
            message = alert.message,
            "Notification dispatched"
        );

        Ok(())
    }
}
