// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! Domain events for the Task Reasoner
//! Published to the broadcast bus for observability and integration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::work_item::WorkItemId;
use super::worker::WorkerId;

/// Coordination domain events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinationEvent {
    /// A work item's complexity was scored
    WorkItemAnalyzed {
        item_id: WorkItemId,
        kind: String,
        score: f64,
        level: String,
        timestamp: DateTime<Utc>,
    },

    /// An execution plan was produced from a dependency DAG
    PlanProduced {
        phases: usize,
        items: usize,
        timestamp: DateTime<Utc>,
    },

    /// A work item was routed to a worker
    WorkerRouted {
        item_id: WorkItemId,
        worker_id: WorkerId,
        confidence: f64,
        timestamp: DateTime<Utc>,
    },

    /// A dispatch began; the worker's load was incremented
    DispatchStarted {
        item_id: WorkItemId,
        worker_id: WorkerId,
        timestamp: DateTime<Utc>,
    },

    /// A dispatch settled; the worker's rolling summary absorbed the outcome
    DispatchCompleted {
        item_id: WorkItemId,
        worker_id: WorkerId,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

impl CoordinationEvent {
    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            CoordinationEvent::WorkItemAnalyzed { timestamp, .. } => *timestamp,
            CoordinationEvent::PlanProduced { timestamp, .. } => *timestamp,
            CoordinationEvent::WorkerRouted { timestamp, .. } => *timestamp,
            CoordinationEvent::DispatchStarted { timestamp, .. } => *timestamp,
            CoordinationEvent::DispatchCompleted { timestamp, .. } => *timestamp,
        }
    }

    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            CoordinationEvent::WorkItemAnalyzed { .. } => "work_item_analyzed",
            CoordinationEvent::PlanProduced { .. } => "plan_produced",
            CoordinationEvent::WorkerRouted { .. } => "worker_routed",
            CoordinationEvent::DispatchStarted { .. } => "dispatch_started",
            CoordinationEvent::DispatchCompleted { .. } => "dispatch_completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = CoordinationEvent::WorkerRouted {
            item_id: WorkItemId::new(),
            worker_id: WorkerId::new("developer"),
            confidence: 87.5,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: CoordinationEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(event.event_type(), deserialized.event_type());
        assert_eq!(event.event_type(), "worker_routed");
    }
}
