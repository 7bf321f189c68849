//! Health check execution
//!
//! One tick walks every known entity: evaluate rules against the latest
//! snapshot, create unsuppressed alerts, notify, auto-resolve cleared
//! conditions, advance escalation, then recompute the health score. The
//! order is load-bearing (scoring must see the freshest alert states), but
//! a tick is idempotent and safe to re-run on any schedule. Errors for one
//! entity never stop the tick for the rest of the fleet.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::alerting::{
    AlertLifecycleManager, AlertRuleEngine, CooldownGuard, EscalationScheduler, NewAlert, Notifier,
};
use crate::error::Result;
use crate::models::{AlertRule, MetricSample, MetricType};
use crate::store::MetricStore;

use super::scorer::HealthScorer;

/// Orchestrates the periodic evaluation pass over all entities
pub struct HealthCheckExecutor {
    store: Arc<MetricStore>,
    rules: RwLock<Vec<AlertRule>>,
    engine: AlertRuleEngine,
    cooldown: CooldownGuard,
    lifecycle: Arc<AlertLifecycleManager>,
    escalation: EscalationScheduler,
    scorer: HealthScorer,
    notifier: Arc<dyn Notifier>,
    escalation_enabled: bool,
}

impl HealthCheckExecutor {
    /// Wire an executor over the shared component set
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<MetricStore>,
        cooldown: CooldownGuard,
        lifecycle: Arc<AlertLifecycleManager>,
        escalation: EscalationScheduler,
        scorer: HealthScorer,
        notifier: Arc<dyn Notifier>,
        escalation_enabled: bool,
    ) -> Self {
        Self {
            store,
            rules: RwLock::new(Vec::new()),
            engine: AlertRuleEngine::new(),
            cooldown,
            lifecycle,
            escalation,
            scorer,
            notifier,
            escalation_enabled,
        }
    }

    /// Register an alert rule
    pub fn register_rule(&self, rule: AlertRule) {
        self.rules.write().push(rule);
    }

    /// All registered rules
    pub fn rules(&self) -> Vec<AlertRule> {
        self.rules.read().clone()
    }

    /// Toggle a rule administratively
    pub fn set_rule_enabled(&self, rule_id: Uuid, enabled: bool) -> Result<()> {
        let mut rules = self.rules.write();
        let rule = rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or_else(|| crate::error::Error::not_found("rule", rule_id.to_string()))?;
        rule.enabled = enabled;
        Ok(())
    }

    /// Run one evaluation pass over every entity
    pub async fn tick(&self, now: DateTime<Utc>) {
        let entities = self.store.all_entities();
        debug!(entities = entities.len(), "Health check tick");

        for entity_id in entities {
            if let Err(e) = self.tick_entity(&entity_id, now).await {
                error!(entity_id, error = %e, "Health check failed for entity");
            }
        }
    }

    /// Run the evaluation pass for a single entity
    async fn tick_entity(&self, entity_id: &str, now: DateTime<Utc>) -> Result<()> {
        let snapshot = self.store.snapshot(entity_id)?;

        // Evaluate enabled rules against the latest samples; when several
        // rules match one metric (stacked severity tiers), only the
        // highest-severity match survives, so a breach yields one alert.
        let rules = self.rules.read().clone();
        let mut matched: HashMap<MetricType, (AlertRule, MetricSample)> = HashMap::new();

        for rule in rules.iter().filter(|r| r.enabled) {
            let Some(sample) = snapshot.latest(rule.condition.metric) else {
                continue;
            };
            if !self.engine.evaluate(rule, sample) {
                continue;
            }

            match matched.get(&rule.condition.metric) {
                Some((best, _)) if best.severity >= rule.severity => {}
                _ => {
                    matched.insert(rule.condition.metric, (rule.clone(), sample.clone()));
                }
            }
        }

        // Create alerts that survive the cooldown guard
        let mut created = Vec::new();
        for (metric, (rule, sample)) in matched {
            if self.cooldown.should_suppress(
                entity_id,
                metric,
                rule.severity,
                rule.cooldown_seconds,
                now,
            ) {
                continue;
            }

            let alert = self.lifecycle.create(
                NewAlert {
                    entity_id: entity_id.to_string(),
                    severity: rule.severity,
                    message: self.engine.format_alert_message(&rule, &sample),
                    metric_type: metric,
                    current_value: sample.value,
                    threshold: rule.condition.threshold,
                    operator: rule.condition.operator,
                    rule_id: Some(rule.id),
                    escalation_enabled: rule.escalation_enabled,
                    metadata: HashMap::new(),
                },
                now,
            );

            if let Some(alert) = alert {
                created.push((alert, rule));
            }
        }

        // Notify on the immutable alert values, after the mutation is done
        for (alert, rule) in &created {
            match self
                .notifier
                .send(alert, &rule.notification_channels, &[])
                .await
            {
                Ok(()) => {
                    self.lifecycle.mark_notified(&alert.id)?;
                }
                Err(e) => {
                    warn!(alert_id = alert.id, error = %e, "Notification delivery failed");
                }
            }
        }

        // Auto-resolve alerts whose condition cleared
        let snapshot = self.store.snapshot(entity_id)?;
        let resolved = self.lifecycle.reevaluate(entity_id, &snapshot, now);
        if !resolved.is_empty() {
            debug!(entity_id, resolved = resolved.len(), "Auto-resolved alerts");
        }

        // Walk unacknowledged alerts up the escalation ladder
        if self.escalation_enabled {
            for event in self.escalation.tick_entity(entity_id, now) {
                let Some(alert) = self.lifecycle.get(&event.alert_id) else {
                    continue;
                };
                if let Err(e) = self
                    .notifier
                    .send(&alert, &event.channels, &event.contacts)
                    .await
                {
                    warn!(alert_id = event.alert_id, error = %e, "Escalation notification failed");
                }
            }
        }

        // Scoring runs last so it sees the freshest alert states
        self.scorer.apply(entity_id, now)?;

        Ok(())
    }
}
