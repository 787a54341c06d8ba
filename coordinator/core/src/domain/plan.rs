// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};

use super::work_item::WorkItemId;

/// How a phase's items may be dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseMode {
    Sequential,
    Parallel,
}

/// One topological layer of the dependency DAG
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub mode: PhaseMode,
    pub items: Vec<WorkItemId>,
}

impl Phase {
    pub fn new(items: Vec<WorkItemId>) -> Self {
        let mode = if items.len() > 1 {
            PhaseMode::Parallel
        } else {
            PhaseMode::Sequential
        };
        Self { mode, items }
    }
}

/// Ordered phases derived from a dependency DAG. Every item's dependencies
/// sit in strictly earlier phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub phases: Vec<Phase>,
}

impl ExecutionPlan {
    pub fn item_count(&self) -> usize {
        self.phases.iter().map(|phase| phase.items.len()).sum()
    }

    /// Zero-based phase index of an item, if planned
    pub fn phase_of(&self, id: WorkItemId) -> Option<usize> {
        self.phases
            .iter()
            .position(|phase| phase.items.contains(&id))
    }
}
