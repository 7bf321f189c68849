//! Monitoring facade and scheduler
//!
//! `HealthMonitor` wires the store, catalogs, rule engine, alert lifecycle,
//! escalation, scoring, and the injected notifier into one embeddable
//! surface, and runs the periodic health check loop.

mod executor;
mod scorer;

pub use executor::HealthCheckExecutor;
pub use scorer::HealthScorer;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::info;

use crate::alerting::{
    AlertLifecycleManager, CooldownGuard, EscalationScheduler, LogNotifier, Notifier,
};
use crate::catalog::{default_rules, EscalationPolicySet, ThresholdCatalog};
use crate::config::Config;
use crate::error::Result;
use crate::models::{
    Alert, AlertRule, EscalationPolicy, HealthSnapshot, MetricType, Threshold,
};
use crate::store::MetricStore;

/// The embeddable health monitoring engine
///
/// Producers record metrics from any task; API-facing callers acknowledge
/// and resolve alerts concurrently; the scheduler loop (or a manual `tick`)
/// drives evaluation. All state is in-memory.
pub struct HealthMonitor {
    config: Config,
    store: Arc<MetricStore>,
    thresholds: Arc<ThresholdCatalog>,
    policies: Arc<EscalationPolicySet>,
    lifecycle: Arc<AlertLifecycleManager>,
    executor: Arc<HealthCheckExecutor>,
    shutdown_tx: mpsc::Sender<()>,
    shutdown_rx: Mutex<Option<mpsc::Receiver<()>>>,
}

impl HealthMonitor {
    /// Create a monitor with the stock catalogs, stock rules, and the
    /// logging notifier
    pub fn new(config: Config) -> Self {
        Self::with_notifier(config, Arc::new(LogNotifier))
    }

    /// Create a monitor with the stock catalogs and an injected notifier
    pub fn with_notifier(config: Config, notifier: Arc<dyn Notifier>) -> Self {
        let store = Arc::new(MetricStore::new(config.monitor.history_limit));
        let thresholds = Arc::new(ThresholdCatalog::with_defaults());
        let policies = Arc::new(EscalationPolicySet::with_defaults());
        let lifecycle = Arc::new(AlertLifecycleManager::new());

        let executor = Arc::new(HealthCheckExecutor::new(
            store.clone(),
            CooldownGuard::new(lifecycle.clone(), config.alerting.default_cooldown_seconds),
            lifecycle.clone(),
            EscalationScheduler::new(lifecycle.clone(), policies.clone()),
            HealthScorer::new(store.clone(), lifecycle.clone()),
            notifier,
            config.alerting.escalation_enabled,
        ));

        for rule in default_rules(&thresholds) {
            executor.register_rule(rule);
        }

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        Self {
            config,
            store,
            thresholds,
            policies,
            lifecycle,
            executor,
            shutdown_tx,
            shutdown_rx: Mutex::new(Some(shutdown_rx)),
        }
    }

    // --- Metric ingestion and queries ---

    /// Record a metric sample for an entity
    pub fn record_metric(
        &self,
        entity_id: &str,
        metric_type: MetricType,
        value: f64,
        unit: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        self.store
            .record(entity_id, metric_type, value, unit, timestamp)
    }

    /// Health snapshot for an entity
    pub fn snapshot(&self, entity_id: &str) -> Result<HealthSnapshot> {
        self.store.snapshot(entity_id)
    }

    /// Open alerts, optionally scoped to one entity
    pub fn list_active_alerts(&self, entity_id: Option<&str>) -> Vec<Alert> {
        self.lifecycle.open_alerts(entity_id)
    }

    /// Full alert history for an entity, terminal alerts included
    pub fn alert_history(&self, entity_id: &str) -> Vec<Alert> {
        self.lifecycle.alerts_for_entity(entity_id)
    }

    // --- Alert transitions ---

    /// Acknowledge an alert
    pub fn acknowledge(&self, alert_id: &str, by: &str) -> Result<()> {
        self.lifecycle.acknowledge(alert_id, by, Utc::now())
    }

    /// Resolve an alert
    pub fn resolve(&self, alert_id: &str, by: &str) -> Result<()> {
        self.lifecycle.resolve(alert_id, by, Utc::now())
    }

    /// Administratively expire an alert
    pub fn expire(&self, alert_id: &str) -> Result<()> {
        self.lifecycle.expire(alert_id, Utc::now())
    }

    // --- Catalog and rule administration ---

    /// Register an alert rule
    pub fn register_rule(&self, rule: AlertRule) {
        self.executor.register_rule(rule);
    }

    /// All registered rules
    pub fn rules(&self) -> Vec<AlertRule> {
        self.executor.rules()
    }

    /// Toggle a rule administratively
    pub fn set_rule_enabled(&self, rule_id: uuid::Uuid, enabled: bool) -> Result<()> {
        self.executor.set_rule_enabled(rule_id, enabled)
    }

    /// Register or replace a threshold triple
    pub fn register_threshold(&self, threshold: Threshold) {
        self.thresholds.register(threshold);
    }

    /// Threshold triple for a metric type
    pub fn threshold(&self, metric: MetricType) -> Result<Threshold> {
        self.thresholds.get(metric)
    }

    /// Register or replace an escalation policy
    pub fn register_escalation_policy(&self, policy: EscalationPolicy) {
        self.policies.register(policy);
    }

    // --- Scheduling ---

    /// Run one evaluation pass manually
    ///
    /// The scheduler calls this on its interval; tests and embedders may
    /// call it directly with any clock value.
    pub async fn tick(&self, now: DateTime<Utc>) {
        self.executor.tick(now).await;
    }

    /// Run the scheduler loop until `stop` is called
    ///
    /// An in-flight tick always drains before the loop exits; alert
    /// transitions are never interrupted midway.
    pub async fn start(&self) {
        let mut shutdown_rx = {
            let mut guard = self.shutdown_rx.lock();
            match guard.take() {
                Some(rx) => rx,
                None => {
                    tracing::error!("Monitor scheduler already started");
                    return;
                }
            }
        };

        let period = Duration::from_secs(self.config.monitor.check_interval_seconds);
        let mut ticker = interval(period);

        info!(
            interval_seconds = self.config.monitor.check_interval_seconds,
            "Health monitor started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.executor.tick(Utc::now()).await;
                }
                _ = shutdown_rx.recv() => {
                    info!("Health monitor stopped");
                    break;
                }
            }
        }
    }

    /// Signal the scheduler loop to exit after the current tick
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{AlertStatus, HealthStatus, Severity};

    #[tokio::test]
    async fn test_facade_end_to_end() {
        let monitor = HealthMonitor::new(Config::default());
        let t0 = Utc::now();

        monitor
            .record_metric("node-7", MetricType::CpuUsage, 93.0, "%", t0)
            .unwrap();
        monitor.tick(t0).await;

        let alerts = monitor.list_active_alerts(Some("node-7"));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Critical);

        monitor.acknowledge(&alerts[0].id, "alice").unwrap();
        assert_eq!(
            monitor.list_active_alerts(Some("node-7"))[0].status,
            AlertStatus::Acknowledged
        );

        monitor.resolve(&alerts[0].id, "alice").unwrap();
        assert!(monitor.list_active_alerts(Some("node-7")).is_empty());
        assert_eq!(monitor.alert_history("node-7").len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_reflects_scoring() {
        let monitor = HealthMonitor::new(Config::default());
        let t0 = Utc::now();

        monitor
            .record_metric("node-1", MetricType::MemoryUsage, 40.0, "%", t0)
            .unwrap();
        monitor.tick(t0).await;

        let snapshot = monitor.snapshot("node-1").unwrap();
        assert_eq!(snapshot.health_score, 100.0);
        assert_eq!(snapshot.overall_status, HealthStatus::Excellent);
        assert_eq!(snapshot.last_evaluated_at, Some(t0));
    }

    #[tokio::test]
    async fn test_unknown_entity_snapshot_errors() {
        let monitor = HealthMonitor::new(Config::default());
        assert!(monitor.snapshot("ghost").is_err());
    }

    #[tokio::test]
    async fn test_scheduler_starts_and_stops() {
        let mut config = Config::default();
        config.monitor.check_interval_seconds = 1;

        let monitor = Arc::new(HealthMonitor::new(config));
        let runner = {
            let monitor = monitor.clone();
            tokio::spawn(async move { monitor.start().await })
        };

        monitor.stop().await;
        runner.await.unwrap();
    }
}
