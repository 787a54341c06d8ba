// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! Application layer for the Experience Store

pub mod store;

pub use store::{
    CleanupPolicy, EventBus, ExperienceStore, LearnerConfig, LearnerError, LearnerStats,
    NoopEventBus, Recommendation, SimilarRecord, StandardExperienceStore,
};
