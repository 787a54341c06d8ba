// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0
//! Task Reasoner
//!
//! Complexity scoring, dependency-ordered execution planning and
//! capability-based worker routing.
//!
//! # Architecture
//!
//! - **Layer:** Reasoning Layer
//! - **Purpose:** Decide what runs where, in what order, and how risky it is;
//!   consumes the Experience Store for bias and the Telemetry Store for
//!   worker history

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
pub use application::*;
pub use infrastructure::*;
