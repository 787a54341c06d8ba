// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! Domain events for the Experience Store
//! Published to the EventBus for observability and integration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::RecordId;

/// Experience Store domain events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LearnerEvent {
    /// A new outcome record was appended
    RecordStored {
        record_id: RecordId,
        kind: String,
        success: bool,
        timestamp: DateTime<Utc>,
    },

    /// Cleanup removed records that fell outside the retention policy
    RecordsPruned {
        kind: Option<String>,
        removed: usize,
        retained: usize,
        timestamp: DateTime<Utc>,
    },
}

impl LearnerEvent {
    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            LearnerEvent::RecordStored { timestamp, .. } => *timestamp,
            LearnerEvent::RecordsPruned { timestamp, .. } => *timestamp,
        }
    }

    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            LearnerEvent::RecordStored { .. } => "record_stored",
            LearnerEvent::RecordsPruned { .. } => "records_pruned",
        }
    }
}
