// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use quorum_learner::TaskContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkItemId(pub Uuid);

impl WorkItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorkItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declared urgency. Ordering is by urgency: `Critical` sorts above `High`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// A unit of work submitted for analysis, planning and routing.
/// Immutable once submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    pub kind: String,
    /// Capability tags a worker must cover to take this item
    pub requirements: BTreeSet<String>,
    pub priority: Priority,
    pub context: TaskContext,
    /// Ids of items that must complete before this one starts
    pub dependencies: Vec<WorkItemId>,
    /// Optional caller-declared size estimate, 0-100
    pub size_hint: Option<u32>,
}

impl WorkItem {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            id: WorkItemId::new(),
            kind: kind.into(),
            requirements: BTreeSet::new(),
            priority: Priority::default(),
            context: TaskContext::new(),
            dependencies: Vec::new(),
            size_hint: None,
        }
    }

    pub fn with_requirement(mut self, tag: impl Into<String>) -> Self {
        self.requirements.insert(tag.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_context(mut self, context: TaskContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_dependency(mut self, id: WorkItemId) -> Self {
        self.dependencies.push(id);
        self
    }

    pub fn with_size_hint(mut self, hint: u32) -> Self {
        self.size_hint = Some(hint.min(100));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_orders_by_urgency() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn size_hint_is_clamped() {
        let item = WorkItem::new("deploy").with_size_hint(250);
        assert_eq!(item.size_hint, Some(100));
    }
}
