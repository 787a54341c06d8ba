// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! Application layer for the Telemetry Store

pub mod store;

pub use store::{TelemetryConfig, TelemetryStore};
