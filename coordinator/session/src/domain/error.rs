// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

use quorum_coordinator_core::WorkerId;

use super::session::SessionId;

/// Errors surfaced by the Collaboration Coordinator. All are caller misuse
/// or state violations; none are retried internally.
#[derive(Debug, thiserror::Error)]
pub enum CoordinationError {
    #[error("session {id} not found")]
    SessionNotFound { id: SessionId },

    #[error("session {id} is closed")]
    SessionClosed { id: SessionId },

    #[error("'{worker_id}' is not a participant of session {session_id}")]
    UnknownParticipant {
        session_id: SessionId,
        worker_id: WorkerId,
    },

    #[error("recipient '{worker_id}' is not a participant of session {session_id}")]
    InvalidRecipient {
        session_id: SessionId,
        worker_id: WorkerId,
    },

    #[error("validation failed: {0}")]
    Validation(String),
}
