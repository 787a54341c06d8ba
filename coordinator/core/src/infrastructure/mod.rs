// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! Infrastructure layer for the Task Reasoner

pub mod event_bus;
pub mod worker_registry;

pub use event_bus::{EventBus, EventBusError, EventReceiver};
pub use worker_registry::WorkerRegistry;
