// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! Metric and event value types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single recorded metric observation. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricPoint {
    pub name: String,
    pub value: f64,
    pub tags: BTreeMap<String, String>,
    pub recorded_at: DateTime<Utc>,
    pub metadata: Option<serde_json::Value>,
}

impl MetricPoint {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            tags: BTreeMap::new(),
            recorded_at: Utc::now(),
            metadata: None,
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// True when every query tag matches this point's tags
    pub fn matches_tags(&self, query: &BTreeMap<String, String>) -> bool {
        query
            .iter()
            .all(|(key, value)| self.tags.get(key) == Some(value))
    }
}

/// Aggregated statistics over a metric window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricStatistics {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    /// Percentage in 0-100; present only when matching points carry a
    /// `status` tag with `success`/`failure` values
    pub success_rate: Option<f64>,
    /// The backing shard lost points; the window may be incomplete
    pub partial: bool,
}

impl MetricStatistics {
    pub fn empty(partial: bool) -> Self {
        Self {
            count: 0,
            mean: 0.0,
            median: 0.0,
            min: 0.0,
            max: 0.0,
            p50: 0.0,
            p95: 0.0,
            p99: 0.0,
            success_rate: None,
            partial,
        }
    }
}

/// A discrete event recorded alongside metrics (workflow milestones,
/// degraded-mode notices)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub event_type: String,
    pub payload: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

impl TelemetryEvent {
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_matching_requires_all_query_tags() {
        let point = MetricPoint::new("exec", 1.0)
            .with_tag("status", "success")
            .with_tag("worker", "developer");

        let mut query = BTreeMap::new();
        query.insert("status".to_string(), "success".to_string());
        assert!(point.matches_tags(&query));

        query.insert("worker".to_string(), "reviewer".to_string());
        assert!(!point.matches_tags(&query));

        assert!(point.matches_tags(&BTreeMap::new()));
    }
}
