// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0
//! Experience Store
//!
//! Append-only record of task outcomes with similarity-based retrieval.
//!
//! # Architecture
//!
//! - **Layer:** Learning & Memory Layer
//! - **Purpose:** Bias future routing and planning decisions with history

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
pub use application::*;
pub use infrastructure::*;
