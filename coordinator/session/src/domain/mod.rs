// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

pub mod conflict;
pub mod error;
pub mod message;
pub mod session;

pub use conflict::{Opinion, Resolution};
pub use error::CoordinationError;
pub use message::{Message, MessageId, Recipient};
pub use session::{Session, SessionId, SessionStatus};
