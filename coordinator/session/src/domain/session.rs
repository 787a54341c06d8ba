// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! Session aggregate
//!
//! A bounded collaboration context grouping participants and their ordered
//! message log. Lifecycle is `Open -> Closing -> Closed`; once closed a
//! session is immutable and retained only for audit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use quorum_coordinator_core::WorkerId;

use super::error::CoordinationError;
use super::message::{Message, MessageId, Recipient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Closing,
    Closed,
}

/// Aggregate root for a collaboration context.
///
/// # Invariants
///
/// - Messages append only while the session is `Open`.
/// - A message's recipient is `All` or one of `participants`.
/// - Each participant has an independent read cursor into the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    pub participants: Vec<WorkerId>,
    pub metadata: Option<serde_json::Value>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    log: Vec<Message>,
    read_cursors: HashMap<WorkerId, usize>,
}

impl Session {
    pub fn new(
        name: impl Into<String>,
        participants: Vec<WorkerId>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            name: name.into(),
            participants,
            metadata,
            status: SessionStatus::Open,
            created_at: Utc::now(),
            closed_at: None,
            log: Vec::new(),
            read_cursors: HashMap::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    pub fn is_participant(&self, worker: &WorkerId) -> bool {
        self.participants.contains(worker)
    }

    /// Validate and append a message. Ordering is the append order.
    pub fn append_message(
        &mut self,
        sender: WorkerId,
        recipient: Recipient,
        message_type: impl Into<String>,
        payload: serde_json::Value,
        in_reply_to: Option<MessageId>,
    ) -> Result<MessageId, CoordinationError> {
        if !self.is_open() {
            return Err(CoordinationError::SessionClosed { id: self.id });
        }
        if !self.is_participant(&sender) {
            return Err(CoordinationError::UnknownParticipant {
                session_id: self.id,
                worker_id: sender,
            });
        }
        if let Recipient::Worker { id } = &recipient {
            if !self.is_participant(id) {
                return Err(CoordinationError::InvalidRecipient {
                    session_id: self.id,
                    worker_id: id.clone(),
                });
            }
        }

        let message = Message {
            id: MessageId::new(),
            session_id: self.id,
            sender,
            recipient,
            message_type: message_type.into(),
            payload,
            in_reply_to,
            sent_at: Utc::now(),
        };
        let id = message.id;
        self.log.push(message);
        Ok(id)
    }

    /// Inbox view for one participant. `unread_only` consults the
    /// participant's cursor without advancing it.
    pub fn messages_for(
        &self,
        participant: &WorkerId,
        message_type: Option<&str>,
        unread_only: bool,
    ) -> Result<Vec<Message>, CoordinationError> {
        if !self.is_participant(participant) {
            return Err(CoordinationError::UnknownParticipant {
                session_id: self.id,
                worker_id: participant.clone(),
            });
        }

        let cursor = if unread_only {
            self.read_cursors.get(participant).copied().unwrap_or(0)
        } else {
            0
        };

        Ok(self
            .log
            .iter()
            .skip(cursor)
            .filter(|message| message.addressed_to(participant))
            .filter(|message| message_type.map_or(true, |t| message.message_type == t))
            .cloned()
            .collect())
    }

    /// Advance the participant's read cursor to the end of the log
    pub fn mark_read(&mut self, participant: &WorkerId) -> Result<(), CoordinationError> {
        if !self.is_participant(participant) {
            return Err(CoordinationError::UnknownParticipant {
                session_id: self.id,
                worker_id: participant.clone(),
            });
        }
        self.read_cursors.insert(participant.clone(), self.log.len());
        Ok(())
    }

    /// First message replying to `id`, if any has arrived
    pub fn reply_to(&self, id: MessageId) -> Option<&Message> {
        self.log
            .iter()
            .find(|message| message.in_reply_to == Some(id))
    }

    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    pub fn begin_close(&mut self) {
        if self.status == SessionStatus::Open {
            self.status = SessionStatus::Closing;
        }
    }

    pub fn finish_close(&mut self) {
        if self.status != SessionStatus::Closed {
            self.status = SessionStatus::Closed;
            self.closed_at = Some(Utc::now());
        }
    }
}
