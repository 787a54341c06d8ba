// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! # TelemetryStore — Metric Ingestion & Health Evaluation
//!
//! Sharded in-memory time-series store. Writers take one shard's write lock
//! for a bounded append; readers snapshot a shard under its read lock, so no
//! writer blocks a reader beyond that critical section.
//!
//! ## Degraded mode
//!
//! Shards are capacity-bounded rings. On overflow the oldest points are
//! dropped and a single `degraded_mode` event is recorded for the shard;
//! subsequent reads over that shard report `partial = true` instead of
//! erroring. Health reporting must stay available precisely when other
//! things are failing, so no read path here returns an error.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, VecDeque};
use std::hash::{Hash, Hasher};
use tracing::{debug, warn};

use crate::domain::{
    CheckResult, HealthCheck, HealthReport, HealthState, MetricPoint, MetricStatistics,
    TelemetryEvent,
};

/// Capacity and sharding knobs
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub shard_count: usize,
    /// Maximum points retained per shard before the ring drops the oldest
    pub shard_capacity: usize,
    /// Maximum retained events
    pub event_capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            shard_count: 8,
            shard_capacity: 4096,
            event_capacity: 1024,
        }
    }
}

#[derive(Default)]
struct Shard {
    points: VecDeque<MetricPoint>,
    dropped: u64,
}

/// In-memory telemetry store. Construct one per deployment and pass the
/// handle around; there is no global instance.
pub struct TelemetryStore {
    shards: Vec<RwLock<Shard>>,
    events: RwLock<VecDeque<TelemetryEvent>>,
    config: TelemetryConfig,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::with_config(TelemetryConfig::default())
    }

    pub fn with_config(config: TelemetryConfig) -> Self {
        let shard_count = config.shard_count.max(1);
        let shards = (0..shard_count).map(|_| RwLock::new(Shard::default())).collect();
        Self {
            shards,
            events: RwLock::new(VecDeque::new()),
            config: TelemetryConfig {
                shard_count,
                ..config
            },
        }
    }

    fn shard_for(&self, name: &str) -> &RwLock<Shard> {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % self.shards.len()]
    }

    /// Append a metric observation
    pub fn record(
        &self,
        name: &str,
        value: f64,
        tags: BTreeMap<String, String>,
        metadata: Option<serde_json::Value>,
    ) {
        let point = MetricPoint {
            name: name.to_string(),
            value,
            tags,
            recorded_at: Utc::now(),
            metadata,
        };
        self.record_point(point);
    }

    pub fn record_point(&self, point: MetricPoint) {
        let name = point.name.clone();
        let mut entered_degraded = false;
        {
            let mut shard = self.shard_for(&name).write();
            shard.points.push_back(point);
            while shard.points.len() > self.config.shard_capacity {
                shard.points.pop_front();
                if shard.dropped == 0 {
                    entered_degraded = true;
                }
                shard.dropped += 1;
            }
        }

        if entered_degraded {
            warn!(metric = %name, "telemetry shard overflow, dropping oldest points");
            self.record_event(
                "degraded_mode",
                serde_json::json!({ "component": "telemetry", "metric": name }),
            );
        }
    }

    /// Record a discrete event (workflow milestones, degraded-mode notices)
    pub fn record_event(&self, event_type: &str, payload: serde_json::Value) {
        let mut events = self.events.write();
        events.push_back(TelemetryEvent::new(event_type, payload));
        while events.len() > self.config.event_capacity {
            events.pop_front();
        }
    }

    /// Most recent events, newest first, optionally filtered by type
    pub fn recent_events(&self, event_type: Option<&str>, limit: usize) -> Vec<TelemetryEvent> {
        let events = self.events.read();
        events
            .iter()
            .rev()
            .filter(|event| event_type.map_or(true, |t| event.event_type == t))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Matching points within the window, in append order
    pub fn query(
        &self,
        name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        tags: &BTreeMap<String, String>,
    ) -> Vec<MetricPoint> {
        let shard = self.shard_for(name).read();
        shard
            .points
            .iter()
            .filter(|point| {
                point.name == name
                    && point.recorded_at >= start
                    && point.recorded_at <= end
                    && point.matches_tags(tags)
            })
            .cloned()
            .collect()
    }

    /// Aggregate statistics over the matching window. Never errors; windows
    /// over a shard that lost points are flagged `partial`.
    pub fn statistics(
        &self,
        name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        tags: &BTreeMap<String, String>,
    ) -> MetricStatistics {
        let partial = self.shard_for(name).read().dropped > 0;
        let points = self.query(name, start, end, tags);
        if points.is_empty() {
            return MetricStatistics::empty(partial);
        }

        let mut values: Vec<f64> = points.iter().map(|p| p.value).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let p50 = percentile(&values, 50.0);

        let mut successes = 0usize;
        let mut failures = 0usize;
        for point in &points {
            match point.tags.get("status").map(String::as_str) {
                Some("success") => successes += 1,
                Some("failure") => failures += 1,
                _ => {}
            }
        }
        let success_rate = if successes + failures > 0 {
            Some(successes as f64 / (successes + failures) as f64 * 100.0)
        } else {
            None
        };

        MetricStatistics {
            count,
            mean,
            median: p50,
            min: values[0],
            max: values[count - 1],
            p50,
            p95: percentile(&values, 95.0),
            p99: percentile(&values, 99.0),
            success_rate,
            partial,
        }
    }

    /// Evaluate checks into a health report. Overall state is the worst
    /// individual check; score is the weighted average of per-check scores.
    /// Checks that resolve no value mark the report `partial` rather than
    /// failing it.
    pub fn check_health(
        &self,
        component_type: &str,
        component_id: Option<&str>,
        checks: &[HealthCheck],
    ) -> HealthReport {
        let mut results = Vec::with_capacity(checks.len());
        let mut partial = false;
        let mut weighted_score = 0.0;
        let mut total_weight = 0.0;

        for check in checks {
            let value = check.value.or_else(|| {
                check
                    .metric
                    .as_deref()
                    .and_then(|metric| self.latest_value(metric))
            });
            let Some(value) = value else {
                debug!(check = %check.name, "health check has no resolvable value");
                partial = true;
                continue;
            };

            let state = check.rule.classify(value);
            weighted_score += state.score() * check.weight;
            total_weight += check.weight;
            results.push(CheckResult {
                name: check.name.clone(),
                value,
                state,
                rule: check.rule,
            });
        }

        let state = results
            .iter()
            .map(|result| result.state)
            .max()
            // Nothing measurable: report degraded, not healthy
            .unwrap_or(HealthState::Degraded);
        let score = if total_weight > 0.0 {
            weighted_score / total_weight
        } else {
            0.0
        };

        HealthReport {
            component_type: component_type.to_string(),
            component_id: component_id.map(str::to_string),
            state,
            score,
            checks: results,
            partial,
        }
    }

    fn latest_value(&self, metric: &str) -> Option<f64> {
        let shard = self.shard_for(metric).read();
        shard
            .points
            .iter()
            .rev()
            .find(|point| point.name == metric)
            .map(|point| point.value)
    }
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Nearest-rank percentile over a sorted slice
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ThresholdRule;

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        let now = Utc::now();
        (now - chrono::Duration::minutes(5), now + chrono::Duration::minutes(5))
    }

    fn status_tag(status: &str) -> BTreeMap<String, String> {
        BTreeMap::from([("status".to_string(), status.to_string())])
    }

    #[test]
    fn success_rate_is_eighty_for_eight_of_ten() {
        let store = TelemetryStore::new();
        for _ in 0..8 {
            store.record("exec", 2.0, status_tag("success"), None);
        }
        for _ in 0..2 {
            store.record("exec", 2.0, status_tag("failure"), None);
        }

        let (start, end) = window();
        let stats = store.statistics("exec", start, end, &BTreeMap::new());
        assert_eq!(stats.count, 10);
        assert_eq!(stats.success_rate, Some(80.0));
        assert!(!stats.partial);
    }

    #[test]
    fn success_rate_absent_without_status_tags() {
        let store = TelemetryStore::new();
        store.record("latency", 12.0, BTreeMap::new(), None);

        let (start, end) = window();
        let stats = store.statistics("latency", start, end, &BTreeMap::new());
        assert_eq!(stats.success_rate, None);
    }

    #[test]
    fn statistics_aggregates_and_percentiles() {
        let store = TelemetryStore::new();
        for value in 1..=100 {
            store.record("latency", value as f64, BTreeMap::new(), None);
        }

        let (start, end) = window();
        let stats = store.statistics("latency", start, end, &BTreeMap::new());
        assert_eq!(stats.count, 100);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 100.0);
        assert_eq!(stats.mean, 50.5);
        assert_eq!(stats.p50, 50.0);
        assert_eq!(stats.p95, 95.0);
        assert_eq!(stats.p99, 99.0);
        assert_eq!(stats.median, stats.p50);
    }

    #[test]
    fn statistics_filters_by_tags() {
        let store = TelemetryStore::new();
        store.record(
            "exec",
            1.0,
            BTreeMap::from([("worker".to_string(), "developer".to_string())]),
            None,
        );
        store.record(
            "exec",
            2.0,
            BTreeMap::from([("worker".to_string(), "reviewer".to_string())]),
            None,
        );

        let (start, end) = window();
        let tags = BTreeMap::from([("worker".to_string(), "developer".to_string())]);
        let stats = store.statistics("exec", start, end, &tags);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.mean, 1.0);
    }

    #[test]
    fn memory_at_82_percent_is_degraded() {
        let store = TelemetryStore::new();
        let report = store.check_health(
            "system",
            None,
            &[HealthCheck::with_value("memory_usage", ThresholdRule::usage(), 82.0)],
        );
        assert_eq!(report.state, HealthState::Degraded);
        assert_eq!(report.score, 50.0);
        assert!(!report.partial);
    }

    #[test]
    fn overall_state_is_worst_check_and_score_is_weighted() {
        let store = TelemetryStore::new();
        let report = store.check_health(
            "executor",
            Some("exec-1"),
            &[
                HealthCheck::with_value("memory_usage", ThresholdRule::usage(), 30.0),
                HealthCheck::with_value("error_rate", ThresholdRule::usage(), 95.0),
            ],
        );
        assert_eq!(report.state, HealthState::Unhealthy);
        assert_eq!(report.score, 50.0);
        assert_eq!(report.checks.len(), 2);
    }

    #[test]
    fn health_check_resolves_latest_metric() {
        let store = TelemetryStore::new();
        store.record("memory_usage", 40.0, BTreeMap::new(), None);
        store.record("memory_usage", 82.0, BTreeMap::new(), None);

        let report = store.check_health(
            "system",
            None,
            &[HealthCheck::from_metric("memory", ThresholdRule::usage(), "memory_usage")],
        );
        assert_eq!(report.state, HealthState::Degraded);
        assert_eq!(report.checks[0].value, 82.0);
    }

    #[test]
    fn unresolvable_check_yields_partial_not_error() {
        let store = TelemetryStore::new();
        let report = store.check_health(
            "system",
            None,
            &[HealthCheck::from_metric("memory", ThresholdRule::usage(), "never_recorded")],
        );
        assert!(report.partial);
        assert!(report.checks.is_empty());
        assert_eq!(report.state, HealthState::Degraded);
    }

    #[test]
    fn shard_overflow_enters_degraded_mode() {
        let store = TelemetryStore::with_config(TelemetryConfig {
            shard_count: 1,
            shard_capacity: 5,
            event_capacity: 16,
        });
        for value in 0..10 {
            store.record("exec", value as f64, BTreeMap::new(), None);
        }

        let (start, end) = window();
        let stats = store.statistics("exec", start, end, &BTreeMap::new());
        assert_eq!(stats.count, 5);
        assert!(stats.partial);

        let degraded = store.recent_events(Some("degraded_mode"), 10);
        assert_eq!(degraded.len(), 1);
        assert_eq!(degraded[0].payload["component"], "telemetry");
    }

    #[test]
    fn recent_events_newest_first_with_filter_and_limit() {
        let store = TelemetryStore::new();
        store.record_event("workflow_started", serde_json::json!({"id": 1}));
        store.record_event("workflow_completed", serde_json::json!({"id": 1}));
        store.record_event("workflow_started", serde_json::json!({"id": 2}));

        let all = store.recent_events(None, 10);
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].event_type, "workflow_started");
        assert_eq!(all[0].payload["id"], 2);

        let started = store.recent_events(Some("workflow_started"), 1);
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].payload["id"], 2);
    }
}
