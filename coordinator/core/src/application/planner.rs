// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! # Planner — Dependency-Ordered Phase Layering
//!
//! Builds an [`ExecutionPlan`] by repeated topological layering: each phase
//! takes every not-yet-scheduled item whose dependencies are all already
//! scheduled. A multi-item layer is `Parallel`, a single-item layer
//! `Sequential`. A cycle yields [`ReasonerError::CyclicDependency`] and no
//! partial plan.
//!
//! Dependencies on ids outside the submitted set are treated as already
//! satisfied; the caller schedules across submissions, not this planner.

use std::collections::HashSet;
use tracing::debug;

use crate::domain::{ExecutionPlan, Phase, ReasonerError, WorkItem, WorkItemId};

#[derive(Debug, Clone, Default)]
pub struct Planner;

impl Planner {
    pub fn new() -> Self {
        Self
    }

    pub fn plan(&self, items: &[WorkItem]) -> Result<ExecutionPlan, ReasonerError> {
        if items.is_empty() {
            return Err(ReasonerError::Validation(
                "cannot plan an empty work item set".into(),
            ));
        }
        let submitted: HashSet<WorkItemId> = items.iter().map(|item| item.id).collect();
        if submitted.len() != items.len() {
            return Err(ReasonerError::Validation(
                "duplicate work item ids in submission".into(),
            ));
        }

        let mut scheduled: HashSet<WorkItemId> = HashSet::new();
        let mut remaining: Vec<&WorkItem> = items.iter().collect();
        let mut phases = Vec::new();

        while !remaining.is_empty() {
            let (ready, blocked): (Vec<&WorkItem>, Vec<&WorkItem>) =
                remaining.into_iter().partition(|item| {
                    item.dependencies
                        .iter()
                        .all(|dep| scheduled.contains(dep) || !submitted.contains(dep))
                });

            if ready.is_empty() {
                let mut unplannable: Vec<WorkItemId> =
                    blocked.iter().map(|item| item.id).collect();
                unplannable.sort();
                return Err(ReasonerError::CyclicDependency { unplannable });
            }

            // Deterministic within a phase: urgency first, then id
            let mut layer = ready;
            layer.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));

            scheduled.extend(layer.iter().map(|item| item.id));
            phases.push(Phase::new(layer.into_iter().map(|item| item.id).collect()));
            remaining = blocked;
        }

        debug!(phases = phases.len(), items = items.len(), "produced execution plan");
        Ok(ExecutionPlan { phases })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PhaseMode, Priority};

    #[test]
    fn fan_in_produces_parallel_then_sequential() {
        let a = WorkItem::new("a");
        let b = WorkItem::new("b");
        let c = WorkItem::new("c")
            .with_dependency(a.id)
            .with_dependency(b.id);

        let plan = Planner::new().plan(&[a.clone(), b.clone(), c.clone()]).unwrap();

        assert_eq!(plan.phases.len(), 2);
        assert_eq!(plan.phases[0].mode, PhaseMode::Parallel);
        assert_eq!(plan.phases[0].items.len(), 2);
        assert_eq!(plan.phases[1].mode, PhaseMode::Sequential);
        assert_eq!(plan.phases[1].items, vec![c.id]);
    }

    #[test]
    fn cycle_is_rejected_without_partial_plan() {
        let mut a = WorkItem::new("a");
        let mut b = WorkItem::new("b");
        a.dependencies.push(b.id);
        b.dependencies.push(a.id);

        let err = Planner::new().plan(&[a.clone(), b.clone()]).unwrap_err();
        match err {
            ReasonerError::CyclicDependency { unplannable } => {
                assert_eq!(unplannable.len(), 2);
            }
            other => panic!("expected CyclicDependency, got {other:?}"),
        }
    }

    #[test]
    fn self_cycle_is_rejected() {
        let mut a = WorkItem::new("a");
        a.dependencies.push(a.id);
        assert!(matches!(
            Planner::new().plan(&[a]),
            Err(ReasonerError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn unknown_dependencies_count_as_satisfied() {
        let a = WorkItem::new("a").with_dependency(WorkItemId::new());
        let plan = Planner::new().plan(&[a.clone()]).unwrap();
        assert_eq!(plan.phases.len(), 1);
        assert_eq!(plan.phases[0].items, vec![a.id]);
    }

    #[test]
    fn phases_respect_priority_ordering() {
        let low = WorkItem::new("low").with_priority(Priority::Low);
        let critical = WorkItem::new("critical").with_priority(Priority::Critical);
        let medium = WorkItem::new("medium").with_priority(Priority::Medium);

        let plan = Planner::new()
            .plan(&[low.clone(), critical.clone(), medium.clone()])
            .unwrap();

        assert_eq!(plan.phases.len(), 1);
        assert_eq!(plan.phases[0].items[0], critical.id);
        assert_eq!(plan.phases[0].items[2], low.id);
    }

    #[test]
    fn dependencies_always_land_in_earlier_phases() {
        // Chain with a diamond: a -> (b, c) -> d
        let a = WorkItem::new("a");
        let b = WorkItem::new("b").with_dependency(a.id);
        let c = WorkItem::new("c").with_dependency(a.id);
        let d = WorkItem::new("d")
            .with_dependency(b.id)
            .with_dependency(c.id);

        let items = [a, b, c, d];
        let plan = Planner::new().plan(&items).unwrap();

        for item in &items {
            let phase = plan.phase_of(item.id).unwrap();
            for dep in &item.dependencies {
                assert!(plan.phase_of(*dep).unwrap() < phase);
            }
        }
        assert_eq!(plan.item_count(), 4);
    }

    #[test]
    fn empty_submission_is_a_validation_error() {
        assert!(matches!(
            Planner::new().plan(&[]),
            Err(ReasonerError::Validation(_))
        ));
    }
}
