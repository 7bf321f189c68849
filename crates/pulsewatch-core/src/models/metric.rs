//! Metric data models

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of measurement tracked per entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// CPU utilization percentage
    CpuUsage,
    /// Memory utilization percentage
    MemoryUsage,
    /// Disk utilization percentage
    DiskUsage,
    /// Response time in milliseconds
    ResponseTime,
    /// Error rate percentage
    ErrorRate,
}

impl MetricType {
    /// All known metric types, in catalog order
    pub const ALL: [MetricType; 5] = [
        MetricType::CpuUsage,
        MetricType::MemoryUsage,
        MetricType::DiskUsage,
        MetricType::ResponseTime,
        MetricType::ErrorRate,
    ];

    /// Wire/display name for the metric type
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::CpuUsage => "cpu_usage",
            MetricType::MemoryUsage => "memory_usage",
            MetricType::DiskUsage => "disk_usage",
            MetricType::ResponseTime => "response_time",
            MetricType::ErrorRate => "error_rate",
        }
    }

    /// Default unit recorded with samples of this type
    pub fn default_unit(&self) -> &'static str {
        match self {
            MetricType::CpuUsage | MetricType::MemoryUsage | MetricType::DiskUsage => "%",
            MetricType::ResponseTime => "ms",
            MetricType::ErrorRate => "%",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single classified measurement for one entity
///
/// Immutable once recorded; the store keeps the latest sample per metric type
/// plus a bounded rolling history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    /// Monitored entity this sample belongs to
    pub entity_id: String,

    /// Category of measurement
    pub metric_type: MetricType,

    /// Measured value; always finite
    pub value: f64,

    /// Unit string, e.g. "%" or "ms"
    pub unit: String,

    /// When the measurement was taken
    pub timestamp: DateTime<Utc>,
}

impl MetricSample {
    /// Create a new sample stamped with the given time
    pub fn new(
        entity_id: impl Into<String>,
        metric_type: MetricType,
        value: f64,
        unit: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            metric_type,
            value,
            unit: unit.into(),
            timestamp,
        }
    }
}

/// Coarse per-entity health classification derived from the health score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Score >= 90, no meaningful alert burden
    #[default]
    Excellent,
    /// Score >= 70
    Good,
    /// Score >= 40
    Warning,
    /// Score < 40, or any open emergency alert
    Critical,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthStatus::Excellent => "excellent",
            HealthStatus::Good => "good",
            HealthStatus::Warning => "warning",
            HealthStatus::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Point-in-time health view of one entity
///
/// Holds the latest sample per metric type together with the computed health
/// score and status tier. `last_evaluated_at` is refreshed by the scoring
/// pass, so a stalled evaluator shows up as a stale timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// Monitored entity
    pub entity_id: String,

    /// Latest sample per metric type, one slot per type
    pub metrics: HashMap<MetricType, MetricSample>,

    /// Computed health score in [0, 100]
    pub health_score: f64,

    /// Coarse classification derived from the score and open alerts
    pub overall_status: HealthStatus,

    /// When the scoring pass last touched this entity
    pub last_evaluated_at: Option<DateTime<Utc>>,
}

impl HealthSnapshot {
    /// Create an empty snapshot for an entity with no recorded metrics yet
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            metrics: HashMap::new(),
            health_score: 100.0,
            overall_status: HealthStatus::Excellent,
            last_evaluated_at: None,
        }
    }

    /// Latest sample for a metric type, if one has been recorded
    pub fn latest(&self, metric_type: MetricType) -> Option<&MetricSample> {
        self.metrics.get(&metric_type)
    }
}
