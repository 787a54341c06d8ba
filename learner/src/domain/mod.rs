// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

pub mod context;
pub mod events;
pub mod record;

pub use context::{ContextValue, TaskContext};
pub use events::LearnerEvent;
pub use record::{ExecutionRecord, Outcome, RecordId};
