// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! Application layer for the Collaboration Coordinator

pub mod coordinator;
pub mod workflow;

pub use coordinator::{CollaborationCoordinator, CoordinatorConfig};
pub use workflow::{StepExecutor, StepOutcome, WorkflowFailure, WorkflowResult};
