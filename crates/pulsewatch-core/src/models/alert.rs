//! Alert data models

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::metric::MetricType;

/// Alert severity level
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational
    Info,
    /// Warning
    #[default]
    Warning,
    /// Critical
    Critical,
    /// Emergency
    Emergency,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
            Severity::Emergency => "emergency",
        };
        f.write_str(s)
    }
}

/// Status of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    /// Alert is currently active
    #[default]
    Active,
    /// Alert has been acknowledged by an operator
    Acknowledged,
    /// Alert has been resolved
    Resolved,
    /// Alert was administratively expired
    Expired,
    /// Alert was suppressed before activation
    Suppressed,
}

impl AlertStatus {
    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, AlertStatus::Resolved | AlertStatus::Expired)
    }

    /// Open alerts count toward scoring and duplicate suppression
    pub fn is_open(&self) -> bool {
        matches!(self, AlertStatus::Active | AlertStatus::Acknowledged)
    }
}

/// Comparison operator for rule conditions
///
/// Comparisons are strict: `Eq` is exact floating-point equality with no
/// epsilon, and no hysteresis band is applied when a value sits on a
/// threshold. Callers wanting flap resistance layer it on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Greater than
    Gt,
    /// Less than
    Lt,
    /// Greater than or equal to
    Gte,
    /// Less than or equal to
    Lte,
    /// Equal to
    Eq,
}

impl Operator {
    /// Apply the operator between a sample value and a threshold
    #[allow(clippy::float_cmp)]
    pub fn matches(&self, value: f64, threshold: f64) -> bool {
        match self {
            Operator::Gt => value > threshold,
            Operator::Lt => value < threshold,
            Operator::Gte => value >= threshold,
            Operator::Lte => value <= threshold,
            Operator::Eq => value == threshold,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Eq => "==",
        };
        f.write_str(s)
    }
}

/// Condition attached to an alert rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertCondition {
    /// Metric the condition applies to
    pub metric: MetricType,

    /// Comparison operator
    pub operator: Operator,

    /// Threshold value
    pub threshold: f64,

    /// Advisory "must persist for N seconds" metadata. The evaluator is
    /// single-shot; persistence is up to callers re-evaluating across ticks.
    pub duration_seconds: u64,
}

impl AlertCondition {
    /// Create a condition with no persistence requirement
    pub fn new(metric: MetricType, operator: Operator, threshold: f64) -> Self {
        Self {
            metric,
            operator,
            threshold,
            duration_seconds: 0,
        }
    }
}

/// An alert rule definition
///
/// Rules are immutable after load; only `enabled` may be toggled
/// administratively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    /// Unique identifier
    pub id: Uuid,

    /// Human-readable name
    pub name: String,

    /// Severity of alerts created from this rule
    pub severity: Severity,

    /// Matching condition
    pub condition: AlertCondition,

    /// Whether the rule participates in evaluation
    pub enabled: bool,

    /// Duplicate-suppression window in seconds
    pub cooldown_seconds: u64,

    /// Whether alerts from this rule walk the escalation ladder
    pub escalation_enabled: bool,

    /// Channels to notify when the rule fires
    pub notification_channels: Vec<NotificationChannel>,
}

impl AlertRule {
    /// Create an enabled rule with default cooldown and escalation settings
    pub fn new(name: impl Into<String>, severity: Severity, condition: AlertCondition) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            severity,
            condition,
            enabled: true,
            cooldown_seconds: 300,
            escalation_enabled: true,
            notification_channels: Vec::new(),
        }
    }

    /// Check if a value triggers this rule's condition
    pub fn check(&self, value: f64) -> bool {
        self.condition.operator.matches(value, self.condition.threshold)
    }
}

/// Notification channel configuration
///
/// Carried as configuration for the injected notifier; the core never
/// performs delivery itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationChannel {
    /// Slack webhook
    Slack {
        webhook_url: String,
        channel: Option<String>,
    },
    /// Email notification
    Email { to: Vec<String> },
    /// Generic webhook
    Webhook { url: String },
    /// PagerDuty
    PagerDuty { routing_key: String },
}

impl NotificationChannel {
    /// Short channel kind label for records and logs
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationChannel::Slack { .. } => "slack",
            NotificationChannel::Email { .. } => "email",
            NotificationChannel::Webhook { .. } => "webhook",
            NotificationChannel::PagerDuty { .. } => "pagerduty",
        }
    }
}

/// Escalation tier for an unacknowledged alert
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum EscalationLevel {
    /// First responder tier
    #[default]
    L1,
    /// Second tier
    L2,
    /// Third tier
    L3,
    /// Final tier; no further advancement
    L4,
}

impl EscalationLevel {
    /// The next tier up, or `None` at the top of the ladder
    pub fn next(&self) -> Option<EscalationLevel> {
        match self {
            EscalationLevel::L1 => Some(EscalationLevel::L2),
            EscalationLevel::L2 => Some(EscalationLevel::L3),
            EscalationLevel::L3 => Some(EscalationLevel::L4),
            EscalationLevel::L4 => None,
        }
    }
}

impl fmt::Display for EscalationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EscalationLevel::L1 => "L1",
            EscalationLevel::L2 => "L2",
            EscalationLevel::L3 => "L3",
            EscalationLevel::L4 => "L4",
        };
        f.write_str(s)
    }
}

/// Per-level escalation configuration, loaded at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationPolicy {
    /// Tier this policy configures
    pub level: EscalationLevel,

    /// Minutes after alert creation before this tier is entered
    pub delay_minutes: u64,

    /// Contacts paged at this tier
    pub contacts: Vec<String>,

    /// Channels used at this tier
    pub notification_channels: Vec<NotificationChannel>,

    /// Whether the scheduler may advance into this tier on its own
    pub auto_escalate: bool,

    /// Carried configuration for embedders; advancement does not wait on it
    pub require_acknowledgment: bool,
}

/// Emitted when an alert advances one escalation tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationEvent {
    /// Alert that escalated
    pub alert_id: String,

    /// Entity the alert belongs to
    pub entity_id: String,

    /// Tier the alert advanced to
    pub new_level: EscalationLevel,

    /// Contacts configured for the new tier
    pub contacts: Vec<String>,

    /// Channels configured for the new tier
    pub channels: Vec<NotificationChannel>,

    /// When the advancement happened
    pub escalated_at: DateTime<Utc>,
}

/// Severity thresholds for one metric type
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Threshold {
    /// Metric the thresholds apply to
    pub metric: MetricType,

    /// Warning tier boundary
    pub warning: f64,

    /// Critical tier boundary
    pub critical: f64,

    /// Emergency tier boundary
    pub emergency: f64,
}

impl Threshold {
    /// Classify a value against the tier boundaries, highest tier first
    pub fn classify(&self, value: f64) -> Option<Severity> {
        if value > self.emergency {
            Some(Severity::Emergency)
        } else if value > self.critical {
            Some(Severity::Critical)
        } else if value > self.warning {
            Some(Severity::Warning)
        } else {
            None
        }
    }
}

/// A triggered alert
///
/// Created when a rule matches and is not suppressed; owned by the lifecycle
/// manager and mutated only through explicit transitions. Terminal alerts are
/// retained for audit, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Stable identifier of form `<entity_id>_<metric_type>_<unix_ts>`
    pub id: String,

    /// Rule that produced this alert, if still known
    pub rule_id: Option<Uuid>,

    /// Entity the alert belongs to
    pub entity_id: String,

    /// Severity at creation
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Metric that breached
    pub metric_type: MetricType,

    /// Value observed at creation
    pub current_value: f64,

    /// Threshold that was breached
    pub threshold: f64,

    /// Operator of the originating condition, kept so re-evaluation can
    /// re-check the condition without consulting the rule set
    pub operator: Operator,

    /// When the alert was created
    pub created_at: DateTime<Utc>,

    /// Current status
    pub status: AlertStatus,

    /// Operator who acknowledged, if any
    pub acknowledged_by: Option<String>,

    /// When the alert was acknowledged
    pub acknowledged_at: Option<DateTime<Utc>>,

    /// Who resolved the alert ("system" for value-driven auto-resolution)
    pub resolved_by: Option<String>,

    /// When the alert was resolved
    pub resolved_at: Option<DateTime<Utc>>,

    /// Current escalation tier; monotonic while the alert is open
    pub escalation_level: EscalationLevel,

    /// Whether escalation advancement applies to this alert
    pub escalation_enabled: bool,

    /// Whether a creation notification went out successfully
    pub notification_sent: bool,

    /// Free-form context attached at creation
    pub metadata: HashMap<String, String>,
}

impl Alert {
    /// Whether the alert still counts toward scoring and suppression
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
        assert!(Severity::Critical < Severity::Emergency);
    }

    #[test]
    fn test_status_terminality() {
        assert!(AlertStatus::Resolved.is_terminal());
        assert!(AlertStatus::Expired.is_terminal());
        assert!(!AlertStatus::Active.is_terminal());
        assert!(!AlertStatus::Acknowledged.is_terminal());
        assert!(!AlertStatus::Suppressed.is_terminal());

        assert!(AlertStatus::Active.is_open());
        assert!(AlertStatus::Acknowledged.is_open());
        assert!(!AlertStatus::Suppressed.is_open());
    }

    #[test]
    fn test_escalation_ladder() {
        assert_eq!(EscalationLevel::L1.next(), Some(EscalationLevel::L2));
        assert_eq!(EscalationLevel::L3.next(), Some(EscalationLevel::L4));
        assert_eq!(EscalationLevel::L4.next(), None);
        assert!(EscalationLevel::L1 < EscalationLevel::L4);
    }

    #[test]
    fn test_threshold_classification() {
        let threshold = Threshold {
            metric: MetricType::CpuUsage,
            warning: 70.0,
            critical: 90.0,
            emergency: 95.0,
        };

        assert_eq!(threshold.classify(50.0), None);
        assert_eq!(threshold.classify(70.0), None); // boundary excluded
        assert_eq!(threshold.classify(75.0), Some(Severity::Warning));
        assert_eq!(threshold.classify(93.0), Some(Severity::Critical));
        assert_eq!(threshold.classify(96.0), Some(Severity::Emergency));
    }

    #[test]
    fn test_rule_check_strict_boundary() {
        let rule = AlertRule::new(
            "cpu high",
            Severity::Critical,
            AlertCondition::new(MetricType::CpuUsage, Operator::Gt, 90.0),
        );

        assert!(rule.check(95.0));
        assert!(!rule.check(90.0)); // strict: boundary excluded for Gt
    }
}
