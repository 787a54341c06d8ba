// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! # Router — Capability-Based Worker Selection
//!
//! Scores each candidate as a weighted sum of capability coverage
//! (proficiency-weighted), historical success rate for the work item's kind,
//! and inverse load. Unavailable workers are disqualified outright, as are
//! workers covering less than `min_coverage` (default 50%) of the required
//! tags. Ties break by lowest load, then worker id.
//!
//! Historical success rate comes from the Telemetry Store when a handle is
//! attached (`work_item.execution` points tagged by worker and kind),
//! falling back to the worker's rolling summary.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use quorum_telemetry::TelemetryStore;

use crate::domain::{ReasonerError, WorkItem, Worker, WorkerId};

/// Metric consulted for per-worker execution history
pub const EXECUTION_METRIC: &str = "work_item.execution";

#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Minimum fraction of required tags a candidate must possess
    pub min_coverage: f64,
    pub capability_weight: f64,
    pub history_weight: f64,
    pub load_weight: f64,
    /// Confidence ceiling for items declaring no requirements
    pub no_requirement_cap: f64,
    /// Lookback window for telemetry history
    pub history_window: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            min_coverage: 0.5,
            capability_weight: 0.5,
            history_weight: 0.3,
            load_weight: 0.2,
            no_requirement_cap: 60.0,
            history_window: Duration::hours(24),
        }
    }
}

/// An alternative candidate with its confidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedWorker {
    pub worker_id: WorkerId,
    pub confidence: f64,
}

/// The routing outcome. `confidence` below 70 is advisory; callers decide
/// whether to trust it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub selected: WorkerId,
    pub confidence: f64,
    /// Per-required-tag score; `None` when the item declared no requirements
    /// and matching was a guess
    pub capability_match: Option<BTreeMap<String, f64>>,
    pub alternatives: Vec<RankedWorker>,
}

pub struct Router {
    config: RouterConfig,
    telemetry: Option<Arc<TelemetryStore>>,
}

struct ScoredCandidate {
    worker_id: WorkerId,
    confidence: f64,
    capability_match: Option<BTreeMap<String, f64>>,
    load: u32,
}

impl Router {
    pub fn new() -> Self {
        Self {
            config: RouterConfig::default(),
            telemetry: None,
        }
    }

    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a telemetry handle so routing consults recorded execution
    /// history instead of only the rolling summaries
    pub fn with_telemetry(mut self, telemetry: Arc<TelemetryStore>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn route(
        &self,
        item: &WorkItem,
        candidates: &[Worker],
    ) -> Result<RoutingDecision, ReasonerError> {
        let mut scored: Vec<ScoredCandidate> = candidates
            .iter()
            .filter(|worker| worker.available)
            .filter_map(|worker| self.score(item, worker))
            .collect();

        if scored.is_empty() {
            return Err(ReasonerError::NoEligibleWorker {
                kind: item.kind.clone(),
            });
        }

        scored.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.load.cmp(&b.load))
                .then_with(|| a.worker_id.cmp(&b.worker_id))
        });

        let best = scored.remove(0);
        debug!(
            item_id = %item.id,
            worker_id = %best.worker_id,
            confidence = best.confidence,
            "routed work item"
        );

        Ok(RoutingDecision {
            selected: best.worker_id,
            confidence: best.confidence,
            capability_match: best.capability_match,
            alternatives: scored
                .into_iter()
                .map(|candidate| RankedWorker {
                    worker_id: candidate.worker_id,
                    confidence: candidate.confidence,
                })
                .collect(),
        })
    }

    /// Score one candidate; `None` when disqualified by coverage
    fn score(&self, item: &WorkItem, worker: &Worker) -> Option<ScoredCandidate> {
        let history = self.historical_success_rate(item, worker);
        let load_factor = 1.0 / (1.0 + f64::from(worker.performance.current_load));

        if item.requirements.is_empty() {
            // Nothing declared: any available worker matches, but the
            // confidence is a guess and says so.
            let confidence = ((history * self.config.history_weight
                + load_factor * self.config.load_weight)
                / (self.config.history_weight + self.config.load_weight)
                * 100.0)
                .min(self.config.no_requirement_cap);
            return Some(ScoredCandidate {
                worker_id: worker.id.clone(),
                confidence,
                capability_match: None,
                load: worker.performance.current_load,
            });
        }

        let mut capability_match = BTreeMap::new();
        let mut covered = 0usize;
        let mut proficiency_sum = 0.0;
        for tag in &item.requirements {
            match worker.capability(tag) {
                Some(capability) => {
                    covered += 1;
                    let factor = capability.proficiency_factor();
                    proficiency_sum += factor;
                    capability_match.insert(tag.clone(), factor * 100.0);
                }
                None => {
                    capability_match.insert(tag.clone(), 0.0);
                }
            }
        }

        let required = item.requirements.len();
        let coverage = covered as f64 / required as f64;
        if coverage < self.config.min_coverage {
            return None;
        }
        let capability_score = proficiency_sum / required as f64;

        let confidence = (capability_score * self.config.capability_weight
            + history * self.config.history_weight
            + load_factor * self.config.load_weight)
            * 100.0;

        Some(ScoredCandidate {
            worker_id: worker.id.clone(),
            confidence: confidence.min(100.0),
            capability_match: Some(capability_match),
            load: worker.performance.current_load,
        })
    }

    /// Success fraction in `[0, 1]` for this worker on this kind
    fn historical_success_rate(&self, item: &WorkItem, worker: &Worker) -> f64 {
        if let Some(telemetry) = &self.telemetry {
            let now = Utc::now();
            let tags = BTreeMap::from([
                ("worker".to_string(), worker.id.to_string()),
                ("kind".to_string(), item.kind.clone()),
            ]);
            let stats = telemetry.statistics(
                EXECUTION_METRIC,
                now - self.config.history_window,
                now,
                &tags,
            );
            if let Some(rate) = stats.success_rate {
                return rate / 100.0;
            }
        }
        worker.performance.success_rate
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Capability;

    fn item_with(tags: &[&str]) -> WorkItem {
        let mut item = WorkItem::new("code_review");
        for tag in tags {
            item = item.with_requirement(*tag);
        }
        item
    }

    #[test]
    fn empty_candidate_pool_is_rejected() {
        let err = Router::new().route(&item_with(&["rust"]), &[]).unwrap_err();
        assert!(matches!(err, ReasonerError::NoEligibleWorker { .. }));
    }

    #[test]
    fn unavailable_workers_are_never_selected() {
        let mut worker = Worker::new("developer", "Developer")
            .with_capability(Capability::new("rust"));
        worker.available = false;

        let err = Router::new()
            .route(&item_with(&["rust"]), &[worker])
            .unwrap_err();
        assert!(matches!(err, ReasonerError::NoEligibleWorker { .. }));
    }

    #[test]
    fn low_coverage_workers_are_excluded_not_scored_low() {
        // Covers 1 of 3 required tags: below the 50% floor
        let weak = Worker::new("generalist", "Generalist")
            .with_capability(Capability::new("rust"));
        let strong = Worker::new("specialist", "Specialist")
            .with_capability(Capability::new("rust"))
            .with_capability(Capability::new("sql"))
            .with_capability(Capability::new("docker"));

        let decision = Router::new()
            .route(&item_with(&["rust", "sql", "docker"]), &[weak, strong])
            .unwrap();

        assert_eq!(decision.selected, WorkerId::new("specialist"));
        assert!(decision.alternatives.is_empty());
    }

    #[test]
    fn proficiency_breaks_between_full_coverage_candidates() {
        let junior = Worker::new("junior", "Junior")
            .with_capability(Capability::with_proficiency("rust", 40));
        let senior = Worker::new("senior", "Senior")
            .with_capability(Capability::with_proficiency("rust", 95));

        let decision = Router::new()
            .route(&item_with(&["rust"]), &[junior, senior])
            .unwrap();

        assert_eq!(decision.selected, WorkerId::new("senior"));
        assert_eq!(decision.alternatives.len(), 1);
        assert!(decision.confidence > decision.alternatives[0].confidence);
        let matched = decision.capability_match.unwrap();
        assert_eq!(matched.get("rust"), Some(&95.0));
    }

    #[test]
    fn ties_break_by_load_then_id() {
        let mut busy = Worker::new("busy", "Busy").with_capability(Capability::new("rust"));
        busy.performance.current_load = 3;
        let idle = Worker::new("idle", "Idle").with_capability(Capability::new("rust"));

        let decision = Router::new()
            .route(&item_with(&["rust"]), &[busy, idle])
            .unwrap();
        assert_eq!(decision.selected, WorkerId::new("idle"));

        // Identical load and score: lexicographic id wins
        let a = Worker::new("alpha", "A").with_capability(Capability::new("rust"));
        let b = Worker::new("beta", "B").with_capability(Capability::new("rust"));
        let decision = Router::new().route(&item_with(&["rust"]), &[b, a]).unwrap();
        assert_eq!(decision.selected, WorkerId::new("alpha"));
    }

    #[test]
    fn no_requirements_caps_confidence_at_sixty() {
        let worker = Worker::new("anyone", "Anyone");
        let decision = Router::new()
            .route(&WorkItem::new("untyped"), &[worker])
            .unwrap();

        assert!(decision.confidence <= 60.0);
        assert!(decision.capability_match.is_none());
    }

    #[test]
    fn telemetry_history_outranks_rolling_summary() {
        let telemetry = Arc::new(TelemetryStore::new());
        // "flaky" has a perfect rolling summary but a bad recorded history
        for _ in 0..8 {
            telemetry.record(
                EXECUTION_METRIC,
                1.0,
                BTreeMap::from([
                    ("worker".to_string(), "flaky".to_string()),
                    ("kind".to_string(), "code_review".to_string()),
                    ("status".to_string(), "failure".to_string()),
                ]),
                None,
            );
        }
        for _ in 0..8 {
            telemetry.record(
                EXECUTION_METRIC,
                1.0,
                BTreeMap::from([
                    ("worker".to_string(), "steady".to_string()),
                    ("kind".to_string(), "code_review".to_string()),
                    ("status".to_string(), "success".to_string()),
                ]),
                None,
            );
        }

        let flaky = Worker::new("flaky", "Flaky").with_capability(Capability::new("rust"));
        let steady = Worker::new("steady", "Steady").with_capability(Capability::new("rust"));

        let decision = Router::new()
            .with_telemetry(telemetry)
            .route(&item_with(&["rust"]), &[flaky, steady])
            .unwrap();
        assert_eq!(decision.selected, WorkerId::new("steady"));
    }
}
