// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! # TaskReasoner — Submission Facade
//!
//! Single entry point tying together analysis, planning and routing.
//! Publishes [`CoordinationEvent`]s on the broadcast bus, records stage
//! metrics to telemetry, and keeps a bounded in-memory log of recent
//! decisions for inspection.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tracing::info;

use quorum_telemetry::TelemetryStore;

use crate::application::complexity::{ComplexityAnalyzer, ComplexityReport};
use crate::application::planner::Planner;
use crate::application::router::{Router, RoutingDecision};
use crate::domain::{CoordinationEvent, ExecutionPlan, ReasonerError, WorkItem, WorkItemId, Worker};
use crate::infrastructure::EventBus;

const DECISION_HISTORY_CAPACITY: usize = 256;

/// What the reasoner did, kept for inspection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub at: DateTime<Utc>,
    pub kind: DecisionKind,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Analysis,
    Plan,
    Route,
}

/// The outcome of a submission: per-item analyses, plus a plan when the
/// submission is multi-step or carries dependencies
#[derive(Debug, Clone)]
pub struct Submission {
    pub analyses: Vec<(WorkItemId, ComplexityReport)>,
    pub plan: Option<ExecutionPlan>,
}

pub struct TaskReasoner {
    analyzer: ComplexityAnalyzer,
    planner: Planner,
    router: Router,
    event_bus: EventBus,
    telemetry: Option<Arc<TelemetryStore>>,
    history: Mutex<VecDeque<Decision>>,
}

impl TaskReasoner {
    pub fn new(analyzer: ComplexityAnalyzer, router: Router) -> Self {
        Self {
            analyzer,
            planner: Planner::new(),
            router,
            event_bus: EventBus::default(),
            telemetry: None,
            history: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<TelemetryStore>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Analyze every submitted item and, for multi-step or dependent
    /// submissions, produce an execution plan
    pub async fn submit(&self, items: &[WorkItem]) -> Result<Submission, ReasonerError> {
        if items.is_empty() {
            return Err(ReasonerError::Validation("empty submission".into()));
        }

        let mut analyses = Vec::with_capacity(items.len());
        for item in items {
            let report = self.analyzer.analyze(item).await;
            self.event_bus.publish(CoordinationEvent::WorkItemAnalyzed {
                item_id: item.id,
                kind: item.kind.clone(),
                score: report.score,
                level: report.level.as_str().to_string(),
                timestamp: Utc::now(),
            });
            self.remember(
                DecisionKind::Analysis,
                format!("{} scored {:.0} ({})", item.kind, report.score, report.level.as_str()),
            );
            analyses.push((item.id, report));
        }

        let needs_plan = items.len() > 1 || items.iter().any(|item| !item.dependencies.is_empty());
        let plan = if needs_plan {
            let plan = self.planner.plan(items)?;
            self.event_bus.publish(CoordinationEvent::PlanProduced {
                phases: plan.phases.len(),
                items: plan.item_count(),
                timestamp: Utc::now(),
            });
            self.remember(
                DecisionKind::Plan,
                format!("{} item(s) into {} phase(s)", plan.item_count(), plan.phases.len()),
            );
            Some(plan)
        } else {
            None
        };

        if let Some(telemetry) = &self.telemetry {
            telemetry.record(
                "reasoner.submissions",
                items.len() as f64,
                BTreeMap::new(),
                None,
            );
        }

        info!(
            items = items.len(),
            planned = plan.is_some(),
            "processed submission"
        );
        Ok(Submission { analyses, plan })
    }

    /// Route one item over a candidate pool
    pub fn route(
        &self,
        item: &WorkItem,
        candidates: &[Worker],
    ) -> Result<RoutingDecision, ReasonerError> {
        let decision = self.router.route(item, candidates)?;

        self.event_bus.publish(CoordinationEvent::WorkerRouted {
            item_id: item.id,
            worker_id: decision.selected.clone(),
            confidence: decision.confidence,
            timestamp: Utc::now(),
        });
        self.remember(
            DecisionKind::Route,
            format!(
                "{} -> {} (confidence {:.0})",
                item.kind, decision.selected, decision.confidence
            ),
        );

        Ok(decision)
    }

    /// Most recent decisions, newest first
    pub fn recent_decisions(&self, limit: usize) -> Vec<Decision> {
        let history = self.history.lock();
        history.iter().rev().take(limit).cloned().collect()
    }

    fn remember(&self, kind: DecisionKind, summary: String) {
        let mut history = self.history.lock();
        history.push_back(Decision {
            at: Utc::now(),
            kind,
            summary,
        });
        while history.len() > DECISION_HISTORY_CAPACITY {
            history.pop_front();
        }
    }
}

impl Default for TaskReasoner {
    fn default() -> Self {
        Self::new(ComplexityAnalyzer::new(), Router::new())
    }
}
