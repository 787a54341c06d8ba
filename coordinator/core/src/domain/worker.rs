// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! Worker descriptors and their rolling performance summaries
//!
//! Worker ids are caller-chosen stable names ("developer", "reviewer"), not
//! generated UUIDs, so external agent processes can address each other
//! without a lookup step.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(pub String);

impl WorkerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WorkerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A capability tag with an optional declared proficiency (0-100)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub tag: String,
    pub proficiency: Option<u8>,
}

impl Capability {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            proficiency: None,
        }
    }

    pub fn with_proficiency(tag: impl Into<String>, proficiency: u8) -> Self {
        Self {
            tag: tag.into(),
            proficiency: Some(proficiency.min(100)),
        }
    }

    /// Proficiency as a routing factor in `[0, 1]`; undeclared counts full
    pub fn proficiency_factor(&self) -> f64 {
        self.proficiency.map_or(1.0, |p| f64::from(p) / 100.0)
    }
}

/// Rolling execution summary. Mutated only by the worker registry as
/// dispatches complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Fraction of completed dispatches that succeeded, 0-1
    pub success_rate: f64,
    pub mean_latency_ms: f64,
    pub completed_tasks: u64,
    pub current_load: u32,
}

impl Default for PerformanceSummary {
    fn default() -> Self {
        Self {
            // No history yet: assume workable until proven otherwise
            success_rate: 1.0,
            mean_latency_ms: 0.0,
            completed_tasks: 0,
            current_load: 0,
        }
    }
}

impl PerformanceSummary {
    /// Fold one completed dispatch into the rolling summary
    pub fn absorb(&mut self, success: bool, duration_ms: u64) {
        let n = self.completed_tasks as f64;
        let outcome = if success { 1.0 } else { 0.0 };
        self.success_rate = (self.success_rate * n + outcome) / (n + 1.0);
        self.mean_latency_ms = (self.mean_latency_ms * n + duration_ms as f64) / (n + 1.0);
        self.completed_tasks += 1;
    }
}

/// A registered worker. Callers never mutate this directly; load and
/// performance change only through the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub name: String,
    pub capabilities: Vec<Capability>,
    pub performance: PerformanceSummary,
    pub available: bool,
}

impl Worker {
    pub fn new(id: impl Into<WorkerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capabilities: Vec::new(),
            performance: PerformanceSummary::default(),
            available: true,
        }
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    pub fn capability(&self, tag: &str) -> Option<&Capability> {
        self.capabilities.iter().find(|c| c.tag == tag)
    }
}

impl From<String> for WorkerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
