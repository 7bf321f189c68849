//! # Pulsewatch
//!
//! Embeddable health monitoring and alerting engine.
//!
//! Pulsewatch ingests per-entity metric samples, evaluates them against
//! configurable threshold rules, manages the full alert lifecycle
//! (creation, suppression, escalation, acknowledgment, resolution), and
//! derives an aggregate health score per monitored entity.
//!
//! ## Architecture
//!
//! - **Store**: latest and historical metric samples per entity
//! - **Catalogs**: severity thresholds and escalation policies, injected
//!   at construction
//! - **Alerting**: rule evaluation, cooldown suppression, lifecycle state
//!   machine, escalation ladder
//! - **Monitor**: the periodic health check loop and embeddable facade
//!
//! Notification transport and persistence are the embedding application's
//! job; the engine only decides that and to whom a notification should go.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pulsewatch::prelude::*;
//! use chrono::Utc;
//!
//! # async fn example() -> pulsewatch::Result<()> {
//! let monitor = HealthMonitor::new(Config::default());
//!
//! monitor.record_metric("node-7", MetricType::CpuUsage, 93.0, "%", Utc::now())?;
//! monitor.tick(Utc::now()).await;
//!
//! for alert in monitor.list_active_alerts(Some("node-7")) {
//!     println!("{}: {}", alert.severity, alert.message);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod alerting;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod monitor;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::alerting::{LogNotifier, Notifier};
    pub use crate::catalog::{EscalationPolicySet, ThresholdCatalog};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::models::*;
    pub use crate::monitor::HealthMonitor;
    pub use crate::store::MetricStore;
}
