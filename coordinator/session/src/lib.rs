// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0
//! Collaboration Coordinator
//!
//! Session lifecycle, typed message passing, dependency-ordered workflow
//! execution and conflict resolution.
//!
//! # Architecture
//!
//! - **Layer:** Collaboration Layer
//! - **Purpose:** Bounded contexts in which workers exchange messages and
//!   execute planned work; sessions are fully independent units of
//!   concurrency

pub mod domain;
pub mod application;

pub use domain::*;
pub use application::*;
