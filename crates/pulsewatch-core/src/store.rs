//! In-memory metric store
//!
//! Holds the latest and historical samples per entity behind a sharded map,
//! so producers recording against different entities never contend. Reads
//! hand out defensive copies; no lock is held across caller code.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{HealthSnapshot, HealthStatus, MetricSample, MetricType};

/// Per-entity state: the live snapshot plus bounded rolling history
struct EntityState {
    snapshot: HealthSnapshot,
    history: HashMap<MetricType, VecDeque<MetricSample>>,
}

impl EntityState {
    fn new(entity_id: &str) -> Self {
        Self {
            snapshot: HealthSnapshot::new(entity_id),
            history: HashMap::new(),
        }
    }
}

/// Stores metric samples and health snapshots per entity
///
/// Entities are created lazily on first recorded metric and never deleted.
pub struct MetricStore {
    entities: DashMap<String, EntityState>,
    history_limit: usize,
}

impl MetricStore {
    /// Create a store retaining up to `history_limit` samples per
    /// (entity, metric); zero means unbounded
    pub fn new(history_limit: usize) -> Self {
        Self {
            entities: DashMap::new(),
            history_limit,
        }
    }

    /// Record a sample for an entity
    ///
    /// Rejects non-finite values; accepted samples update the entity's
    /// latest-value slot for the metric type and append to its history.
    pub fn record(
        &self,
        entity_id: &str,
        metric_type: MetricType,
        value: f64,
        unit: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        if !value.is_finite() {
            return Err(Error::invalid_metric(format!(
                "non-finite value {value} for {metric_type} on entity {entity_id}"
            )));
        }

        let sample = MetricSample::new(entity_id, metric_type, value, unit, timestamp);

        let mut state = self
            .entities
            .entry(entity_id.to_string())
            .or_insert_with(|| EntityState::new(entity_id));

        let history = state.history.entry(metric_type).or_default();
        if self.history_limit > 0 {
            while history.len() >= self.history_limit {
                history.pop_front();
            }
        }
        history.push_back(sample.clone());

        state.snapshot.metrics.insert(metric_type, sample);

        debug!(entity_id, metric = %metric_type, value, "Recorded metric sample");

        Ok(())
    }

    /// Latest sample for an entity's metric, if one has been recorded
    pub fn latest(&self, entity_id: &str, metric_type: MetricType) -> Option<MetricSample> {
        self.entities
            .get(entity_id)
            .and_then(|state| state.snapshot.metrics.get(&metric_type).cloned())
    }

    /// Defensive copy of an entity's health snapshot
    pub fn snapshot(&self, entity_id: &str) -> Result<HealthSnapshot> {
        self.entities
            .get(entity_id)
            .map(|state| state.snapshot.clone())
            .ok_or_else(|| Error::not_found("entity", entity_id))
    }

    /// Rolling sample history for an entity's metric, oldest first
    pub fn history(&self, entity_id: &str, metric_type: MetricType) -> Vec<MetricSample> {
        self.entities
            .get(entity_id)
            .and_then(|state| {
                state
                    .history
                    .get(&metric_type)
                    .map(|h| h.iter().cloned().collect())
            })
            .unwrap_or_default()
    }

    /// Ids of all known entities
    ///
    /// Takes only short per-shard read locks to collect the id list; callers
    /// then work entity by entity without blocking unrelated entities.
    pub fn all_entities(&self) -> Vec<String> {
        self.entities.iter().map(|e| e.key().clone()).collect()
    }

    /// Write the scoring pass result back into an entity's snapshot
    pub fn apply_score(
        &self,
        entity_id: &str,
        score: f64,
        status: HealthStatus,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self
            .entities
            .get_mut(entity_id)
            .ok_or_else(|| Error::not_found("entity", entity_id))?;

        state.snapshot.health_score = score;
        state.snapshot.overall_status = status;
        state.snapshot.last_evaluated_at = Some(now);

        Ok(())
    }
}
