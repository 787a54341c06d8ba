// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! Application layer for the Task Reasoner

pub mod complexity;
pub mod planner;
pub mod reasoner;
pub mod router;

pub use complexity::{ComplexityAnalyzer, ComplexityConfig, ComplexityLevel, ComplexityReport};
pub use planner::Planner;
pub use reasoner::{Decision, DecisionKind, Submission, TaskReasoner};
pub use router::{RankedWorker, Router, RouterConfig, RoutingDecision, EXECUTION_METRIC};
