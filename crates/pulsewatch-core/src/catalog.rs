//! Threshold and escalation catalogs
//!
//! Catalogs are explicit values injected into the engine at construction
//! time, never process-global singletons, so tests can supply isolated
//! catalogs per case.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::models::{
    AlertCondition, AlertRule, EscalationLevel, EscalationPolicy, MetricType, Operator, Severity,
    Threshold,
};

/// Maps metric types to their severity threshold triples
///
/// Every metric type a producer intends to record must be registered here
/// before rules referencing it can be catalog-resolved.
pub struct ThresholdCatalog {
    thresholds: RwLock<HashMap<MetricType, Threshold>>,
}

impl ThresholdCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            thresholds: RwLock::new(HashMap::new()),
        }
    }

    /// Create a catalog pre-loaded with the stock thresholds
    ///
    /// cpu_usage 70/90/95, memory_usage 75/90/95, disk_usage 80/90/95,
    /// response_time 2000/5000/10000 ms, error_rate 5/15/25 %.
    pub fn with_defaults() -> Self {
        let catalog = Self::new();
        for threshold in default_thresholds() {
            catalog.register(threshold);
        }
        catalog
    }

    /// Register or replace the threshold triple for a metric type
    pub fn register(&self, threshold: Threshold) {
        self.thresholds.write().insert(threshold.metric, threshold);
    }

    /// Threshold triple for a metric type
    pub fn get(&self, metric: MetricType) -> Result<Threshold> {
        self.thresholds
            .read()
            .get(&metric)
            .copied()
            .ok_or(Error::UnknownMetric(metric))
    }

    /// All registered thresholds, in stable metric order
    pub fn all(&self) -> Vec<Threshold> {
        let thresholds = self.thresholds.read();
        MetricType::ALL
            .iter()
            .filter_map(|m| thresholds.get(m).copied())
            .collect()
    }
}

impl Default for ThresholdCatalog {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Per-level escalation policies, one entry per tier
pub struct EscalationPolicySet {
    policies: RwLock<BTreeMap<EscalationLevel, EscalationPolicy>>,
}

impl EscalationPolicySet {
    /// Create an empty policy set
    pub fn new() -> Self {
        Self {
            policies: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a policy set with the stock ladder: L1 0m, L2 15m, L3 60m,
    /// L4 240m
    pub fn with_defaults() -> Self {
        let set = Self::new();
        for policy in default_policies() {
            set.register(policy);
        }
        set
    }

    /// Register or replace the policy for a tier
    pub fn register(&self, policy: EscalationPolicy) {
        self.policies.write().insert(policy.level, policy);
    }

    /// Policy for a tier, if configured
    pub fn get(&self, level: EscalationLevel) -> Option<EscalationPolicy> {
        self.policies.read().get(&level).cloned()
    }
}

impl Default for EscalationPolicySet {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Stock threshold triples
pub fn default_thresholds() -> Vec<Threshold> {
    vec![
        Threshold {
            metric: MetricType::CpuUsage,
            warning: 70.0,
            critical: 90.0,
            emergency: 95.0,
        },
        Threshold {
            metric: MetricType::MemoryUsage,
            warning: 75.0,
            critical: 90.0,
            emergency: 95.0,
        },
        Threshold {
            metric: MetricType::DiskUsage,
            warning: 80.0,
            critical: 90.0,
            emergency: 95.0,
        },
        Threshold {
            metric: MetricType::ResponseTime,
            warning: 2000.0,
            critical: 5000.0,
            emergency: 10000.0,
        },
        Threshold {
            metric: MetricType::ErrorRate,
            warning: 5.0,
            critical: 15.0,
            emergency: 25.0,
        },
    ]
}

/// Stock escalation ladder
pub fn default_policies() -> Vec<EscalationPolicy> {
    vec![
        EscalationPolicy {
            level: EscalationLevel::L1,
            delay_minutes: 0,
            contacts: vec!["oncall-primary".to_string()],
            notification_channels: Vec::new(),
            auto_escalate: true,
            require_acknowledgment: false,
        },
        EscalationPolicy {
            level: EscalationLevel::L2,
            delay_minutes: 15,
            contacts: vec!["oncall-secondary".to_string()],
            notification_channels: Vec::new(),
            auto_escalate: true,
            require_acknowledgment: true,
        },
        EscalationPolicy {
            level: EscalationLevel::L3,
            delay_minutes: 60,
            contacts: vec!["team-lead".to_string()],
            notification_channels: Vec::new(),
            auto_escalate: true,
            require_acknowledgment: true,
        },
        EscalationPolicy {
            level: EscalationLevel::L4,
            delay_minutes: 240,
            contacts: vec!["engineering-manager".to_string()],
            notification_channels: Vec::new(),
            auto_escalate: true,
            require_acknowledgment: true,
        },
    ]
}

/// Build one enabled rule per (metric, tier) from a threshold catalog
///
/// Warning-tier rules skip the escalation ladder; critical and emergency
/// rules walk it.
pub fn default_rules(catalog: &ThresholdCatalog) -> Vec<AlertRule> {
    let mut rules = Vec::new();

    for threshold in catalog.all() {
        let tiers = [
            (Severity::Warning, threshold.warning),
            (Severity::Critical, threshold.critical),
            (Severity::Emergency, threshold.emergency),
        ];

        for (severity, value) in tiers {
            let mut rule = AlertRule::new(
                format!("{} {severity}", threshold.metric),
                severity,
                AlertCondition::new(threshold.metric, Operator::Gt, value),
            );
            rule.escalation_enabled = severity >= Severity::Critical;
            rules.push(rule);
        }
    }

    rules
}
