//! Alert lifecycle management
//!
//! Owns the alert book and drives every state transition. Alerts start
//! ACTIVE, may pass through ACKNOWLEDGED, and end RESOLVED or EXPIRED;
//! terminal alerts are retained for audit, never deleted. At most one open
//! alert exists per (entity, metric, severity) at any time.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{
    Alert, AlertStatus, EscalationLevel, HealthSnapshot, MetricType, Operator, Severity,
};

/// Parameters for creating a new alert
#[derive(Debug, Clone)]
pub struct NewAlert {
    /// Entity the alert belongs to
    pub entity_id: String,
    /// Alert severity
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Metric that breached
    pub metric_type: MetricType,
    /// Observed value
    pub current_value: f64,
    /// Breached threshold
    pub threshold: f64,
    /// Operator of the originating condition
    pub operator: Operator,
    /// Originating rule, if any
    pub rule_id: Option<Uuid>,
    /// Whether the alert walks the escalation ladder
    pub escalation_enabled: bool,
    /// Context attached at creation
    pub metadata: HashMap<String, String>,
}

/// Creates, acknowledges, resolves, and auto-clears alerts
pub struct AlertLifecycleManager {
    /// Alerts grouped per entity; the grouping shards contention the same
    /// way the metric store does
    by_entity: DashMap<String, Vec<Alert>>,
    /// Alert id -> entity id
    index: DashMap<String, String>,
}

impl AlertLifecycleManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self {
            by_entity: DashMap::new(),
            index: DashMap::new(),
        }
    }

    /// Create an alert, unless an open alert with the same
    /// (entity, metric, severity) key already exists
    ///
    /// Returns `None` when the duplicate check declines creation. The id is
    /// `<entity_id>_<metric_type>_<unix_ts>`.
    pub fn create(&self, req: NewAlert, now: DateTime<Utc>) -> Option<Alert> {
        let mut alerts = self.by_entity.entry(req.entity_id.clone()).or_default();

        let duplicate = alerts.iter().any(|a| {
            a.is_open() && a.metric_type == req.metric_type && a.severity == req.severity
        });
        if duplicate {
            debug!(
                entity_id = req.entity_id,
                metric = %req.metric_type,
                severity = %req.severity,
                "Open alert already exists, skipping creation"
            );
            return None;
        }

        let alert = Alert {
            id: format!("{}_{}_{}", req.entity_id, req.metric_type, now.timestamp()),
            rule_id: req.rule_id,
            entity_id: req.entity_id.clone(),
            severity: req.severity,
            message: req.message,
            metric_type: req.metric_type,
            current_value: req.current_value,
            threshold: req.threshold,
            operator: req.operator,
            created_at: now,
            status: AlertStatus::Active,
            acknowledged_by: None,
            acknowledged_at: None,
            resolved_by: None,
            resolved_at: None,
            escalation_level: EscalationLevel::L1,
            escalation_enabled: req.escalation_enabled,
            notification_sent: false,
            metadata: req.metadata,
        };

        info!(
            alert_id = alert.id,
            entity_id = alert.entity_id,
            severity = %alert.severity,
            metric = %alert.metric_type,
            "Alert created"
        );

        self.index
            .insert(alert.id.clone(), req.entity_id.clone());
        alerts.push(alert.clone());

        Some(alert)
    }

    /// Acknowledge an alert
    ///
    /// ACTIVE -> ACKNOWLEDGED. Re-acknowledging by the same actor is a
    /// no-op; any other state is an invalid transition.
    pub fn acknowledge(&self, alert_id: &str, by: &str, now: DateTime<Utc>) -> Result<()> {
        self.with_alert(alert_id, |alert| {
            match alert.status {
                AlertStatus::Active => {
                    alert.status = AlertStatus::Acknowledged;
                    alert.acknowledged_by = Some(by.to_string());
                    alert.acknowledged_at = Some(now);
                    info!(alert_id, by, "Alert acknowledged");
                    Ok(())
                }
                AlertStatus::Acknowledged if alert.acknowledged_by.as_deref() == Some(by) => Ok(()),
                from => Err(Error::invalid_transition(
                    alert_id,
                    from,
                    AlertStatus::Acknowledged,
                )),
            }
        })?
    }

    /// Resolve an alert
    ///
    /// ACTIVE or ACKNOWLEDGED -> RESOLVED.
    pub fn resolve(&self, alert_id: &str, by: &str, now: DateTime<Utc>) -> Result<()> {
        self.with_alert(alert_id, |alert| {
            if !alert.is_open() {
                return Err(Error::invalid_transition(
                    alert_id,
                    alert.status,
                    AlertStatus::Resolved,
                ));
            }

            alert.status = AlertStatus::Resolved;
            alert.resolved_by = Some(by.to_string());
            alert.resolved_at = Some(now);
            info!(alert_id, by, "Alert resolved");
            Ok(())
        })?
    }

    /// Administratively expire an alert whose entity has been deregistered
    ///
    /// Nothing in the core triggers this automatically.
    pub fn expire(&self, alert_id: &str, now: DateTime<Utc>) -> Result<()> {
        self.with_alert(alert_id, |alert| {
            if alert.status.is_terminal() {
                return Err(Error::invalid_transition(
                    alert_id,
                    alert.status,
                    AlertStatus::Expired,
                ));
            }

            alert.status = AlertStatus::Expired;
            alert.resolved_at = Some(now);
            info!(alert_id, "Alert expired");
            Ok(())
        })?
    }

    /// Auto-resolve open alerts whose originating condition no longer holds
    ///
    /// For every open alert of the entity, re-checks the stored condition
    /// against the latest sample in the snapshot; alerts whose metric has
    /// returned within threshold resolve with `resolved_by = "system"`.
    /// Resolution is purely value-driven. Returns the resolved alerts.
    pub fn reevaluate(
        &self,
        entity_id: &str,
        snapshot: &HealthSnapshot,
        now: DateTime<Utc>,
    ) -> Vec<Alert> {
        let mut resolved = Vec::new();

        let Some(mut alerts) = self.by_entity.get_mut(entity_id) else {
            return resolved;
        };

        for alert in alerts.iter_mut().filter(|a| a.is_open()) {
            let Some(sample) = snapshot.latest(alert.metric_type) else {
                continue;
            };

            if !alert.operator.matches(sample.value, alert.threshold) {
                alert.status = AlertStatus::Resolved;
                alert.resolved_by = Some("system".to_string());
                alert.resolved_at = Some(now);
                info!(
                    alert_id = alert.id,
                    entity_id,
                    metric = %alert.metric_type,
                    value = sample.value,
                    "Alert auto-resolved, condition cleared"
                );
                resolved.push(alert.clone());
            }
        }

        resolved
    }

    /// Advance an alert one escalation tier
    ///
    /// Only ACTIVE alerts escalate, and the level only moves up.
    pub fn advance_escalation(
        &self,
        alert_id: &str,
        new_level: EscalationLevel,
    ) -> Result<Alert> {
        self.with_alert(alert_id, |alert| {
            if alert.status != AlertStatus::Active {
                return Err(Error::invalid_transition(
                    alert_id,
                    alert.status,
                    alert.status,
                ));
            }
            if new_level <= alert.escalation_level {
                return Err(Error::internal(format!(
                    "escalation level for {alert_id} may only increase ({} -> {new_level})",
                    alert.escalation_level
                )));
            }

            alert.escalation_level = new_level;
            Ok(alert.clone())
        })?
    }

    /// Record that the creation notification went out
    pub fn mark_notified(&self, alert_id: &str) -> Result<()> {
        self.with_alert(alert_id, |alert| {
            alert.notification_sent = true;
        })
    }

    /// An alert by id
    pub fn get(&self, alert_id: &str) -> Option<Alert> {
        let entity_id = self.index.get(alert_id)?;
        self.by_entity
            .get(entity_id.value())?
            .iter()
            .find(|a| a.id == alert_id)
            .cloned()
    }

    /// Every alert for an entity, terminal ones included
    pub fn alerts_for_entity(&self, entity_id: &str) -> Vec<Alert> {
        self.by_entity
            .get(entity_id)
            .map(|alerts| alerts.clone())
            .unwrap_or_default()
    }

    /// Open (ACTIVE or ACKNOWLEDGED) alerts, optionally scoped to one entity
    pub fn open_alerts(&self, entity_id: Option<&str>) -> Vec<Alert> {
        match entity_id {
            Some(entity_id) => self
                .by_entity
                .get(entity_id)
                .map(|alerts| alerts.iter().filter(|a| a.is_open()).cloned().collect())
                .unwrap_or_default(),
            None => self
                .by_entity
                .iter()
                .flat_map(|e| e.value().iter().filter(|a| a.is_open()).cloned().collect::<Vec<_>>())
                .collect(),
        }
    }

    /// ACTIVE alerts for one entity (acknowledged ones excluded)
    pub fn active_alerts_for(&self, entity_id: &str) -> Vec<Alert> {
        self.by_entity
            .get(entity_id)
            .map(|alerts| {
                alerts
                    .iter()
                    .filter(|a| a.status == AlertStatus::Active)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Entities with at least one alert on record
    pub fn entities(&self) -> Vec<String> {
        self.by_entity.iter().map(|e| e.key().clone()).collect()
    }

    fn with_alert<R>(&self, alert_id: &str, f: impl FnOnce(&mut Alert) -> R) -> Result<R> {
        let entity_id = self
            .index
            .get(alert_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| Error::not_found("alert", alert_id))?;

        let mut alerts = self
            .by_entity
            .get_mut(&entity_id)
            .ok_or_else(|| Error::not_found("alert", alert_id))?;

        let alert = alerts
            .iter_mut()
            .find(|a| a.id == alert_id)
            .ok_or_else(|| Error::not_found("alert", alert_id))?;

        Ok(f(alert))
    }
}

impl Default for AlertLifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::HealthSnapshot;

    fn new_alert(entity: &str, severity: Severity) -> NewAlert {
        NewAlert {
            entity_id: entity.to_string(),
            severity,
            message: "cpu_usage exceeded threshold".to_string(),
            metric_type: MetricType::CpuUsage,
            current_value: 96.0,
            threshold: 90.0,
            operator: Operator::Gt,
            rule_id: None,
            escalation_enabled: true,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn test_create_assigns_stable_id() {
        let manager = AlertLifecycleManager::new();
        let now = Utc::now();

        let alert = manager.create(new_alert("node-1", Severity::Critical), now).unwrap();

        assert_eq!(
            alert.id,
            format!("node-1_cpu_usage_{}", now.timestamp())
        );
        assert_eq!(alert.status, AlertStatus::Active);
        assert_eq!(alert.escalation_level, EscalationLevel::L1);
        assert!(!alert.notification_sent);
    }

    #[test]
    fn test_create_skips_duplicate_open_alert() {
        let manager = AlertLifecycleManager::new();
        let now = Utc::now();

        let first = manager.create(new_alert("node-1", Severity::Critical), now);
        assert!(first.is_some());

        let later = now + Duration::seconds(10);
        let second = manager.create(new_alert("node-1", Severity::Critical), later);
        assert!(second.is_none());

        // Still only one alert on record
        assert_eq!(manager.alerts_for_entity("node-1").len(), 1);

        // A different severity for the same metric is a different key
        let warning = manager.create(new_alert("node-1", Severity::Warning), later);
        assert!(warning.is_some());
    }

    #[test]
    fn test_acknowledge_transitions_and_idempotence() {
        let manager = AlertLifecycleManager::new();
        let now = Utc::now();
        let alert = manager.create(new_alert("node-1", Severity::Critical), now).unwrap();

        manager.acknowledge(&alert.id, "alice", now).unwrap();
        let acked = manager.get(&alert.id).unwrap();
        assert_eq!(acked.status, AlertStatus::Acknowledged);
        assert_eq!(acked.acknowledged_by.as_deref(), Some("alice"));

        // Same actor again: no-op, not an error
        manager.acknowledge(&alert.id, "alice", now).unwrap();

        // Different actor: invalid transition
        let err = manager.acknowledge(&alert.id, "bob", now).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
    }

    #[test]
    fn test_acknowledge_unknown_alert() {
        let manager = AlertLifecycleManager::new();
        let err = manager.acknowledge("nope", "alice", Utc::now()).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_resolve_from_active_and_acknowledged() {
        let manager = AlertLifecycleManager::new();
        let now = Utc::now();

        let a = manager.create(new_alert("node-1", Severity::Critical), now).unwrap();
        manager.resolve(&a.id, "alice", now).unwrap();
        assert_eq!(manager.get(&a.id).unwrap().status, AlertStatus::Resolved);

        // Resolving again is an invalid transition
        let err = manager.resolve(&a.id, "alice", now).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));

        let b = manager
            .create(new_alert("node-2", Severity::Critical), now)
            .unwrap();
        manager.acknowledge(&b.id, "bob", now).unwrap();
        manager.resolve(&b.id, "bob", now).unwrap();
        let resolved = manager.get(&b.id).unwrap();
        assert_eq!(resolved.status, AlertStatus::Resolved);
        assert_eq!(resolved.resolved_by.as_deref(), Some("bob"));
        assert!(resolved.resolved_at.is_some());
    }

    #[test]
    fn test_reevaluate_auto_resolves_cleared_condition() {
        let manager = AlertLifecycleManager::new();
        let now = Utc::now();
        let alert = manager.create(new_alert("node-1", Severity::Critical), now).unwrap();

        // Condition still holds: nothing resolves
        let mut snapshot = HealthSnapshot::new("node-1");
        snapshot.metrics.insert(
            MetricType::CpuUsage,
            crate::models::MetricSample::new("node-1", MetricType::CpuUsage, 97.0, "%", now),
        );
        assert!(manager.reevaluate("node-1", &snapshot, now).is_empty());

        // Metric back within threshold: alert self-clears
        snapshot.metrics.insert(
            MetricType::CpuUsage,
            crate::models::MetricSample::new("node-1", MetricType::CpuUsage, 50.0, "%", now),
        );
        let resolved = manager.reevaluate("node-1", &snapshot, now);
        assert_eq!(resolved.len(), 1);

        let cleared = manager.get(&alert.id).unwrap();
        assert_eq!(cleared.status, AlertStatus::Resolved);
        assert_eq!(cleared.resolved_by.as_deref(), Some("system"));
    }

    #[test]
    fn test_escalation_advancement_rules() {
        let manager = AlertLifecycleManager::new();
        let now = Utc::now();
        let alert = manager.create(new_alert("node-1", Severity::Critical), now).unwrap();

        let advanced = manager
            .advance_escalation(&alert.id, EscalationLevel::L2)
            .unwrap();
        assert_eq!(advanced.escalation_level, EscalationLevel::L2);

        // Level only increases
        assert!(manager
            .advance_escalation(&alert.id, EscalationLevel::L1)
            .is_err());

        // Acknowledged alerts freeze
        manager.acknowledge(&alert.id, "alice", now).unwrap();
        assert!(manager
            .advance_escalation(&alert.id, EscalationLevel::L3)
            .is_err());
        assert_eq!(
            manager.get(&alert.id).unwrap().escalation_level,
            EscalationLevel::L2
        );
    }

    #[test]
    fn test_expire_is_terminal() {
        let manager = AlertLifecycleManager::new();
        let now = Utc::now();
        let alert = manager.create(new_alert("node-1", Severity::Warning), now).unwrap();

        manager.expire(&alert.id, now).unwrap();
        assert_eq!(manager.get(&alert.id).unwrap().status, AlertStatus::Expired);

        assert!(manager.acknowledge(&alert.id, "alice", now).is_err());
        assert!(manager.resolve(&alert.id, "alice", now).is_err());
        assert!(manager.expire(&alert.id, now).is_err());
    }

    #[test]
    fn test_open_alert_queries() {
        let manager = AlertLifecycleManager::new();
        let now = Utc::now();

        let a = manager.create(new_alert("node-1", Severity::Critical), now).unwrap();
        let _b = manager
            .create(new_alert("node-2", Severity::Warning), now)
            .unwrap();

        manager.acknowledge(&a.id, "alice", now).unwrap();

        assert_eq!(manager.open_alerts(None).len(), 2);
        assert_eq!(manager.open_alerts(Some("node-1")).len(), 1);

        // active_alerts_for excludes acknowledged
        assert!(manager.active_alerts_for("node-1").is_empty());
        assert_eq!(manager.active_alerts_for("node-2").len(), 1);
    }
}
