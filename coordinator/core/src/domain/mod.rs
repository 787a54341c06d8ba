// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

pub mod error;
pub mod events;
pub mod plan;
pub mod work_item;
pub mod worker;

pub use error::ReasonerError;
pub use events::CoordinationEvent;
pub use plan::{ExecutionPlan, Phase, PhaseMode};
pub use work_item::{Priority, WorkItem, WorkItemId};
pub use worker::{Capability, PerformanceSummary, Worker, WorkerId};
