// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::context::TaskContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal outcome of an executed work item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Success {
        output_summary: String,
        duration_ms: u64,
    },
    Failure {
        error_category: String,
        error_message: String,
        remedy: Option<String>,
    },
}

/// A stored historical outcome. Append-only: records are never updated,
/// only superseded by newer records and eventually pruned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: RecordId,
    pub kind: String,
    pub context: TaskContext,
    pub outcome: Outcome,
    pub metadata: Option<serde_json::Value>,
    pub recorded_at: DateTime<Utc>,
}

impl ExecutionRecord {
    pub fn success(
        kind: impl Into<String>,
        context: TaskContext,
        output_summary: impl Into<String>,
        duration_ms: u64,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            kind: kind.into(),
            context,
            outcome: Outcome::Success {
                output_summary: output_summary.into(),
                duration_ms,
            },
            metadata,
            recorded_at: Utc::now(),
        }
    }

    pub fn failure(
        kind: impl Into<String>,
        context: TaskContext,
        error_category: impl Into<String>,
        error_message: impl Into<String>,
        remedy: Option<String>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            kind: kind.into(),
            context,
            outcome: Outcome::Failure {
                error_category: error_category.into(),
                error_message: error_message.into(),
                remedy,
            },
            metadata: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    pub fn has_remedy(&self) -> bool {
        matches!(
            self.outcome,
            Outcome::Failure { remedy: Some(_), .. }
        )
    }
}
