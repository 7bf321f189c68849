//! Health scoring
//!
//! Derives a 0-100 score and a coarse status tier per entity from its open
//! alert burden. The score is always recomputed from current state, never
//! persisted independently of its inputs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::alerting::AlertLifecycleManager;
use crate::error::Result;
use crate::models::{HealthStatus, Severity};
use crate::store::MetricStore;

/// Score deduction per open alert of a given severity
fn penalty(severity: Severity) -> f64 {
    match severity {
        Severity::Info => 0.0,
        Severity::Warning => 10.0,
        Severity::Critical => 25.0,
        Severity::Emergency => 40.0,
    }
}

/// Status tier for a score
fn tier(score: f64) -> HealthStatus {
    if score >= 90.0 {
        HealthStatus::Excellent
    } else if score >= 70.0 {
        HealthStatus::Good
    } else if score >= 40.0 {
        HealthStatus::Warning
    } else {
        HealthStatus::Critical
    }
}

/// Computes health scores and status tiers per entity
pub struct HealthScorer {
    store: Arc<MetricStore>,
    lifecycle: Arc<AlertLifecycleManager>,
}

impl HealthScorer {
    /// Create a scorer over the shared metric and alert state
    pub fn new(store: Arc<MetricStore>, lifecycle: Arc<AlertLifecycleManager>) -> Self {
        Self { store, lifecycle }
    }

    /// Compute the score and status tier for an entity
    ///
    /// Starts at 100 and subtracts a per-severity penalty for every open
    /// alert, clamped at 0. Any open emergency alert forces the status to
    /// critical regardless of the arithmetic score.
    pub fn score(&self, entity_id: &str) -> (f64, HealthStatus) {
        let open = self.lifecycle.open_alerts(Some(entity_id));

        let deducted: f64 = open.iter().map(|a| penalty(a.severity)).sum();
        let score = (100.0 - deducted).max(0.0);

        let status = if open.iter().any(|a| a.severity == Severity::Emergency) {
            HealthStatus::Critical
        } else {
            tier(score)
        };

        debug!(entity_id, score, status = %status, open_alerts = open.len(), "Scored entity");

        (score, status)
    }

    /// Score an entity and write the result into its health snapshot
    pub fn apply(&self, entity_id: &str, now: DateTime<Utc>) -> Result<(f64, HealthStatus)> {
        let (score, status) = self.score(entity_id);
        self.store.apply_score(entity_id, score, status, now)?;
        Ok((score, status))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::alerting::NewAlert;
    use crate::models::{MetricType, Operator};

    fn setup() -> (Arc<MetricStore>, Arc<AlertLifecycleManager>, HealthScorer) {
        let store = Arc::new(MetricStore::new(16));
        let lifecycle = Arc::new(AlertLifecycleManager::new());
        let scorer = HealthScorer::new(store.clone(), lifecycle.clone());
        (store, lifecycle, scorer)
    }

    fn open_alert(lifecycle: &AlertLifecycleManager, severity: Severity, metric: MetricType) {
        lifecycle
            .create(
                NewAlert {
                    entity_id: "node-1".to_string(),
                    severity,
                    message: format!("{metric} breached"),
                    metric_type: metric,
                    current_value: 99.0,
                    threshold: 90.0,
                    operator: Operator::Gt,
                    rule_id: None,
                    escalation_enabled: false,
                    metadata: HashMap::new(),
                },
                Utc::now(),
            )
            .unwrap();
    }

    #[test]
    fn test_no_alerts_is_perfect_health() {
        let (_, _, scorer) = setup();
        assert_eq!(scorer.score("node-1"), (100.0, HealthStatus::Excellent));
    }

    #[test]
    fn test_penalties_accumulate() {
        let (_, lifecycle, scorer) = setup();

        open_alert(&lifecycle, Severity::Warning, MetricType::CpuUsage);
        assert_eq!(scorer.score("node-1"), (90.0, HealthStatus::Excellent));

        open_alert(&lifecycle, Severity::Critical, MetricType::MemoryUsage);
        assert_eq!(scorer.score("node-1"), (65.0, HealthStatus::Good));

        open_alert(&lifecycle, Severity::Critical, MetricType::ResponseTime);
        assert_eq!(scorer.score("node-1"), (40.0, HealthStatus::Warning));
    }

    #[test]
    fn test_score_clamps_at_zero() {
        let (_, lifecycle, scorer) = setup();

        for metric in [
            MetricType::CpuUsage,
            MetricType::MemoryUsage,
            MetricType::DiskUsage,
        ] {
            open_alert(&lifecycle, Severity::Emergency, metric);
        }
        open_alert(&lifecycle, Severity::Critical, MetricType::ResponseTime);

        let (score, status) = scorer.score("node-1");
        assert_eq!(score, 0.0);
        assert_eq!(status, HealthStatus::Critical);
    }

    #[test]
    fn test_emergency_forces_critical_status() {
        let (_, lifecycle, scorer) = setup();

        // One emergency alert: arithmetic score of 60 would be Warning tier
        open_alert(&lifecycle, Severity::Emergency, MetricType::ErrorRate);

        let (score, status) = scorer.score("node-1");
        assert_eq!(score, 60.0);
        assert_eq!(status, HealthStatus::Critical);
    }

    #[test]
    fn test_resolved_alerts_restore_score() {
        let (_, lifecycle, scorer) = setup();

        open_alert(&lifecycle, Severity::Critical, MetricType::CpuUsage);
        let alert = &lifecycle.open_alerts(Some("node-1"))[0];
        lifecycle.resolve(&alert.id, "alice", Utc::now()).unwrap();

        assert_eq!(scorer.score("node-1"), (100.0, HealthStatus::Excellent));
    }

    #[test]
    fn test_apply_writes_snapshot() {
        let (store, lifecycle, scorer) = setup();
        let now = Utc::now();

        store
            .record("node-1", MetricType::CpuUsage, 96.0, "%", now)
            .unwrap();
        open_alert(&lifecycle, Severity::Critical, MetricType::CpuUsage);

        scorer.apply("node-1", now).unwrap();

        let snapshot = store.snapshot("node-1").unwrap();
        assert_eq!(snapshot.health_score, 75.0);
        assert_eq!(snapshot.overall_status, HealthStatus::Good);
        assert_eq!(snapshot.last_evaluated_at, Some(now));
    }
}
