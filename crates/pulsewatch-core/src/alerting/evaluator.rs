//! Alert rule evaluation engine

use tracing::debug;

use crate::models::{AlertRule, MetricSample, Operator};

/// Evaluates rule conditions against metric samples
///
/// Single-shot and stateless: one call decides match/no-match for one sample.
/// A condition's `duration_seconds` is not enforced here; callers wanting
/// "must persist for N seconds" semantics re-evaluate across ticks.
pub struct AlertRuleEngine;

impl AlertRuleEngine {
    /// Create a new rule engine
    pub fn new() -> Self {
        Self
    }

    /// Evaluate a rule against a sample
    ///
    /// The condition's metric must equal the sample's metric type; the
    /// operator then applies between the sample value and the threshold
    /// using strict comparison semantics.
    pub fn evaluate(&self, rule: &AlertRule, sample: &MetricSample) -> bool {
        if rule.condition.metric != sample.metric_type {
            return false;
        }

        let matched = rule.check(sample.value);

        debug!(
            rule = %rule.name,
            metric = %sample.metric_type,
            value = sample.value,
            threshold = rule.condition.threshold,
            matched,
            "Evaluated rule"
        );

        matched
    }

    /// Render the alert message for a matched rule
    pub fn format_alert_message(&self, rule: &AlertRule, sample: &MetricSample) -> String {
        let operator_str = match rule.condition.operator {
            Operator::Gt => "exceeded",
            Operator::Lt => "fell below",
            Operator::Gte => "reached or exceeded",
            Operator::Lte => "fell to or below",
            Operator::Eq => "equals",
        };

        format!(
            "{} {} threshold of {:.2}{} on entity '{}' (current value: {:.2}{})",
            sample.metric_type,
            operator_str,
            rule.condition.threshold,
            sample.unit,
            sample.entity_id,
            sample.value,
            sample.unit,
        )
    }
}

impl Default for AlertRuleEngine {
    fn default() -> Self {
        Self::new()
    }
}
