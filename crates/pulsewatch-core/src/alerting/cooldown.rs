//! Duplicate alert suppression
//!
//! Prevents alert storms from a metric oscillating around a threshold: while
//! an ACTIVE alert for the same (entity, metric, severity) is younger than
//! the cooldown window, no new alert is generated. The window is keyed on
//! the creation time of the still-active alert, not on last evaluation.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::models::{MetricType, Severity};

use super::lifecycle::AlertLifecycleManager;

/// Suppresses duplicate alert generation within a cooldown window
pub struct CooldownGuard {
    lifecycle: Arc<AlertLifecycleManager>,
    default_cooldown_seconds: u64,
}

impl CooldownGuard {
    /// Create a guard over the shared alert state
    pub fn new(lifecycle: Arc<AlertLifecycleManager>, default_cooldown_seconds: u64) -> Self {
        Self {
            lifecycle,
            default_cooldown_seconds,
        }
    }

    /// Whether a new alert for this key should be suppressed
    ///
    /// `cooldown_seconds` is the candidate rule's window; zero falls back to
    /// the configured default.
    pub fn should_suppress(
        &self,
        entity_id: &str,
        metric_type: MetricType,
        severity: Severity,
        cooldown_seconds: u64,
        now: DateTime<Utc>,
    ) -> bool {
        let window = if cooldown_seconds == 0 {
            self.default_cooldown_seconds
        } else {
            cooldown_seconds
        };
        let window = Duration::seconds(window as i64);

        let suppress = self
            .lifecycle
            .active_alerts_for(entity_id)
            .iter()
            .any(|alert| {
                alert.metric_type == metric_type
                    && alert.severity == severity
                    && now - alert.created_at < window
            });

        if suppress {
            debug!(
                entity_id,
                metric = %metric_type,
                severity = %severity,
                "Suppressing duplicate alert within cooldown window"
            );
        }

        suppress
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::alerting::lifecycle::NewAlert;
    use crate::models::Operator;

    fn seed_alert(lifecycle: &AlertLifecycleManager, created_at: DateTime<Utc>) -> String {
        lifecycle
            .create(
                NewAlert {
                    entity_id: "node-1".to_string(),
                    severity: Severity::Critical,
                    message: "cpu_usage exceeded threshold".to_string(),
                    metric_type: MetricType::CpuUsage,
                    current_value: 96.0,
                    threshold: 90.0,
                    operator: Operator::Gt,
                    rule_id: None,
                    escalation_enabled: false,
                    metadata: HashMap::new(),
                },
                created_at,
            )
            .unwrap()
            .id
    }

    #[test]
    fn test_suppresses_within_window() {
        let lifecycle = Arc::new(AlertLifecycleManager::new());
        let guard = CooldownGuard::new(lifecycle.clone(), 300);

        let t0 = Utc::now();
        seed_alert(&lifecycle, t0);

        let t1 = t0 + Duration::seconds(10);
        assert!(guard.should_suppress("node-1", MetricType::CpuUsage, Severity::Critical, 300, t1));
    }

    #[test]
    fn test_no_suppression_outside_window() {
        let lifecycle = Arc::new(AlertLifecycleManager::new());
        let guard = CooldownGuard::new(lifecycle.clone(), 300);

        let t0 = Utc::now();
        seed_alert(&lifecycle, t0);

        let t1 = t0 + Duration::seconds(301);
        assert!(!guard.should_suppress("node-1", MetricType::CpuUsage, Severity::Critical, 300, t1));
    }

    #[test]
    fn test_key_is_entity_metric_severity() {
        let lifecycle = Arc::new(AlertLifecycleManager::new());
        let guard = CooldownGuard::new(lifecycle.clone(), 300);

        let t0 = Utc::now();
        seed_alert(&lifecycle, t0);
        let t1 = t0 + Duration::seconds(10);

        // Different entity, metric, or severity: no suppression
        assert!(!guard.should_suppress("node-2", MetricType::CpuUsage, Severity::Critical, 300, t1));
        assert!(!guard.should_suppress("node-1", MetricType::MemoryUsage, Severity::Critical, 300, t1));
        assert!(!guard.should_suppress("node-1", MetricType::CpuUsage, Severity::Emergency, 300, t1));
    }

    #[test]
    fn test_resolved_alert_does_not_suppress() {
        let lifecycle = Arc::new(AlertLifecycleManager::new());
        let guard = CooldownGuard::new(lifecycle.clone(), 300);

        let t0 = Utc::now();
        let id = seed_alert(&lifecycle, t0);
        lifecycle.resolve(&id, "alice", t0).unwrap();

        let t1 = t0 + Duration::seconds(10);
        assert!(!guard.should_suppress("node-1", MetricType::CpuUsage, Severity::Critical, 300, t1));
    }

    #[test]
    fn test_zero_cooldown_uses_default() {
        let lifecycle = Arc::new(AlertLifecycleManager::new());
        let guard = CooldownGuard::new(lifecycle.clone(), 300);

        let t0 = Utc::now();
        seed_alert(&lifecycle, t0);

        let t1 = t0 + Duration::seconds(100);
        assert!(guard.should_suppress("node-1", MetricType::CpuUsage, Severity::Critical, 0, t1));
    }
}
