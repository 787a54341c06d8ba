// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

use super::work_item::WorkItemId;

/// Errors surfaced by the Task Reasoner. Validation and planning errors are
/// the caller's to fix and are never retried internally.
#[derive(Debug, thiserror::Error)]
pub enum ReasonerError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("dependency cycle involving {} work item(s)", unplannable.len())]
    CyclicDependency { unplannable: Vec<WorkItemId> },

    #[error("no eligible worker for kind '{kind}'")]
    NoEligibleWorker { kind: String },
}
