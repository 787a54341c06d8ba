// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! Conflict resolution by majority vote

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use quorum_coordinator_core::WorkerId;

/// One participant's position in a conflict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opinion {
    pub worker_id: WorkerId,
    pub preferred_strategy: String,
    pub rationale: Option<String>,
}

impl Opinion {
    pub fn new(worker_id: impl Into<WorkerId>, preferred_strategy: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            preferred_strategy: preferred_strategy.into(),
            rationale: None,
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }
}

/// The outcome of a majority vote over opinions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub strategy: String,
    /// winning votes / total opinions, rounded to 3 decimals
    pub confidence: f64,
    pub votes: BTreeMap<String, usize>,
    /// The vote was tied and broke to the first strategy observed
    pub tied: bool,
}

impl Resolution {
    /// Majority vote. Ties break to the first strategy observed in opinion
    /// order, deterministically.
    pub fn from_opinions(opinions: &[Opinion]) -> Option<Resolution> {
        if opinions.is_empty() {
            return None;
        }

        let mut votes: BTreeMap<String, usize> = BTreeMap::new();
        let mut observed_order: Vec<&str> = Vec::new();
        for opinion in opinions {
            if !votes.contains_key(&opinion.preferred_strategy) {
                observed_order.push(&opinion.preferred_strategy);
            }
            *votes.entry(opinion.preferred_strategy.clone()).or_insert(0) += 1;
        }

        let winning = *votes.values().max().expect("non-empty votes");
        let tied = votes.values().filter(|count| **count == winning).count() > 1;
        let strategy = observed_order
            .iter()
            .find(|strategy| votes[**strategy] == winning)
            .expect("winner was observed")
            .to_string();

        let confidence =
            (winning as f64 / opinions.len() as f64 * 1000.0).round() / 1000.0;

        Some(Resolution {
            strategy,
            confidence,
            votes,
            tied,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_of_three_manual_wins_at_point_667() {
        let opinions = [
            Opinion::new("developer", "manual"),
            Opinion::new("reviewer", "manual"),
            Opinion::new("tester", "auto-merge"),
        ];

        let resolution = Resolution::from_opinions(&opinions).unwrap();
        assert_eq!(resolution.strategy, "manual");
        assert_eq!(resolution.confidence, 0.667);
        assert!(!resolution.tied);
        assert_eq!(resolution.votes["manual"], 2);
    }

    #[test]
    fn ties_break_to_first_observed_strategy() {
        let opinions = [
            Opinion::new("developer", "rollback"),
            Opinion::new("reviewer", "hotfix"),
        ];

        let resolution = Resolution::from_opinions(&opinions).unwrap();
        assert_eq!(resolution.strategy, "rollback");
        assert_eq!(resolution.confidence, 0.5);
        assert!(resolution.tied);
    }

    #[test]
    fn no_opinions_yields_no_resolution() {
        assert!(Resolution::from_opinions(&[]).is_none());
    }
}
