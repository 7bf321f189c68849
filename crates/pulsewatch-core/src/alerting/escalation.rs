//! Escalation scheduling
//!
//! Walks unacknowledged alerts up the escalation ladder on a timer.
//! Acknowledging an alert freezes its level; terminal states freeze it for
//! good. Tier delays are measured from alert creation, and L4 is the top of
//! the ladder.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::catalog::EscalationPolicySet;
use crate::models::{Alert, EscalationEvent};

use super::lifecycle::AlertLifecycleManager;

/// Advances ACTIVE alerts through escalation levels
pub struct EscalationScheduler {
    lifecycle: Arc<AlertLifecycleManager>,
    policies: Arc<EscalationPolicySet>,
}

impl EscalationScheduler {
    /// Create a scheduler over the shared alert state and policy catalog
    pub fn new(lifecycle: Arc<AlertLifecycleManager>, policies: Arc<EscalationPolicySet>) -> Self {
        Self {
            lifecycle,
            policies,
        }
    }

    /// Advance escalation for every entity's alerts
    pub fn tick(&self, now: DateTime<Utc>) -> Vec<EscalationEvent> {
        let mut events = Vec::new();
        for entity_id in self.lifecycle.entities() {
            events.extend(self.tick_entity(&entity_id, now));
        }
        events
    }

    /// Advance escalation for one entity's alerts
    ///
    /// Each pass moves an alert up at most one tier, so repeated emission
    /// for an already-advanced level cannot happen.
    pub fn tick_entity(&self, entity_id: &str, now: DateTime<Utc>) -> Vec<EscalationEvent> {
        let mut events = Vec::new();

        for alert in self.lifecycle.active_alerts_for(entity_id) {
            if !alert.escalation_enabled {
                continue;
            }

            match self.advance(&alert, now) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(e) => {
                    // Raced with an acknowledge/resolve; skip this alert
                    warn!(alert_id = alert.id, error = %e, "Escalation advancement skipped");
                }
            }
        }

        events
    }

    fn advance(
        &self,
        alert: &Alert,
        now: DateTime<Utc>,
    ) -> crate::error::Result<Option<EscalationEvent>> {
        let Some(next_level) = alert.escalation_level.next() else {
            return Ok(None); // already at the top of the ladder
        };

        let Some(policy) = self.policies.get(next_level) else {
            return Ok(None);
        };

        if !policy.auto_escalate {
            return Ok(None);
        }

        let due = Duration::minutes(policy.delay_minutes as i64);
        if now - alert.created_at < due {
            return Ok(None);
        }

        let advanced = self.lifecycle.advance_escalation(&alert.id, next_level)?;

        info!(
            alert_id = advanced.id,
            entity_id = advanced.entity_id,
            level = %next_level,
            "Alert escalated"
        );

        Ok(Some(EscalationEvent {
            alert_id: advanced.id,
            entity_id: advanced.entity_id,
            new_level: next_level,
            contacts: policy.contacts,
            channels: policy.notification_channels,
            escalated_at: now,
        }))
    }
}
