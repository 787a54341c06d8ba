// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quorum_coordinator_core::WorkerId;

use super::session::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message target: one participant or every participant except the sender
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum Recipient {
    All,
    Worker { id: WorkerId },
}

impl Recipient {
    pub fn worker(id: impl Into<WorkerId>) -> Self {
        Recipient::Worker { id: id.into() }
    }
}

/// A typed message in a session log. Immutable once sent; intra-session
/// ordering is the log-append order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub session_id: SessionId,
    pub sender: WorkerId,
    pub recipient: Recipient,
    pub message_type: String,
    pub payload: serde_json::Value,
    pub in_reply_to: Option<MessageId>,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    /// Whether this message lands in `participant`'s inbox. Broadcasts reach
    /// every participant except the sender.
    pub fn addressed_to(&self, participant: &WorkerId) -> bool {
        match &self.recipient {
            Recipient::All => &self.sender != participant,
            Recipient::Worker { id } => id == participant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_excludes_the_sender() {
        let message = Message {
            id: MessageId::new(),
            session_id: SessionId::new(),
            sender: WorkerId::new("developer"),
            recipient: Recipient::All,
            message_type: "status_update".to_string(),
            payload: serde_json::json!({}),
            in_reply_to: None,
            sent_at: Utc::now(),
        };

        assert!(message.addressed_to(&WorkerId::new("reviewer")));
        assert!(!message.addressed_to(&WorkerId::new("developer")));
    }

    #[test]
    fn direct_messages_reach_only_the_target() {
        let message = Message {
            id: MessageId::new(),
            session_id: SessionId::new(),
            sender: WorkerId::new("developer"),
            recipient: Recipient::worker("reviewer"),
            message_type: "review_request".to_string(),
            payload: serde_json::json!({"pr": 42}),
            in_reply_to: None,
            sent_at: Utc::now(),
        };

        assert!(message.addressed_to(&WorkerId::new("reviewer")));
        assert!(!message.addressed_to(&WorkerId::new("tester")));
    }
}
