// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! Workflow execution contracts
//!
//! The coordinator plans and routes; executing a step's payload is the
//! caller's business. Callers hand in a [`StepExecutor`] and get back a
//! [`WorkflowResult`] with per-item results.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use quorum_coordinator_core::{WorkItem, WorkItemId, WorkerId};

use crate::domain::SessionId;

/// Executes one routed step. Implementations are opaque to the coordinator;
/// an error halts the workflow after the current phase settles.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute(&self, item: &WorkItem, worker: &WorkerId) -> Result<serde_json::Value>;
}

/// How a single step settled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub item_id: WorkItemId,
    pub worker_id: WorkerId,
    pub success: bool,
    pub duration_ms: u64,
}

/// Why a workflow halted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowFailure {
    /// The failing step, if the failure is attributable to one
    pub item_id: Option<WorkItemId>,
    pub reason: String,
}

/// The outcome of a coordinated workflow. Completed phases are never rolled
/// back; on failure `results` still holds everything produced before the
/// halt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub session_id: SessionId,
    pub completed_phases: usize,
    pub results: BTreeMap<WorkItemId, serde_json::Value>,
    pub steps: Vec<StepOutcome>,
    pub failure: Option<WorkflowFailure>,
    pub duration_ms: u64,
}

impl WorkflowResult {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}
