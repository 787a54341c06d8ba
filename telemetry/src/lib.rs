// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0
//! Telemetry Store
//!
//! Time-series metric ingestion, statistical aggregation and threshold-based
//! health evaluation.
//!
//! # Architecture
//!
//! - **Layer:** Observability Layer
//! - **Purpose:** Answer "how is the system doing" without ever becoming a
//!   point of failure itself: reads degrade to `partial` results instead of
//!   erroring.

pub mod domain;
pub mod application;

pub use domain::*;
pub use application::*;
