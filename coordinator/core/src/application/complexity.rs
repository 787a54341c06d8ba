// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! # ComplexityAnalyzer — Work Item Scoring
//!
//! Scores a work item 0-100 as a weighted sum over declared requirement
//! count, dependency fan-in, the caller's size hint, and (when an experience
//! store handle is attached) the failure rate among similar historical
//! records of the same kind. The score bands into a level:
//! `< 25` low, `< 55` medium, `< 80` high, else very high.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use quorum_learner::ExperienceStore;

use crate::domain::WorkItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ComplexityLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 25.0 {
            ComplexityLevel::Low
        } else if score < 55.0 {
            ComplexityLevel::Medium
        } else if score < 80.0 {
            ComplexityLevel::High
        } else {
            ComplexityLevel::VeryHigh
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ComplexityLevel::Low => "low",
            ComplexityLevel::Medium => "medium",
            ComplexityLevel::High => "high",
            ComplexityLevel::VeryHigh => "very_high",
        }
    }
}

/// Scoring weights. Each factor's contribution is capped so no single factor
/// saturates the scale on its own.
#[derive(Debug, Clone)]
pub struct ComplexityConfig {
    /// Points per declared requirement tag
    pub requirement_weight: f64,
    /// Points per dependency edge
    pub dependency_weight: f64,
    /// Multiplier applied to the 0-100 size hint
    pub size_hint_weight: f64,
    /// Points at a 100% historical failure rate
    pub history_weight: f64,
    /// How many similar records to sample for the failure rate
    pub history_sample: usize,
}

impl Default for ComplexityConfig {
    fn default() -> Self {
        Self {
            requirement_weight: 10.0,
            dependency_weight: 8.0,
            size_hint_weight: 0.4,
            history_weight: 30.0,
            history_sample: 10,
        }
    }
}

/// Scored complexity with the factors that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityReport {
    pub level: ComplexityLevel,
    pub score: f64,
    pub factors: Vec<String>,
    pub recommendations: Vec<String>,
}

pub struct ComplexityAnalyzer {
    config: ComplexityConfig,
    learner: Option<Arc<dyn ExperienceStore>>,
}

impl ComplexityAnalyzer {
    pub fn new() -> Self {
        Self {
            config: ComplexityConfig::default(),
            learner: None,
        }
    }

    pub fn with_config(mut self, config: ComplexityConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach an experience store so historical failure rates bias the score
    pub fn with_learner(mut self, learner: Arc<dyn ExperienceStore>) -> Self {
        self.learner = Some(learner);
        self
    }

    pub async fn analyze(&self, item: &WorkItem) -> ComplexityReport {
        let mut score = 0.0;
        let mut factors = Vec::new();

        let requirement_points = item.requirements.len() as f64 * self.config.requirement_weight;
        if requirement_points > 0.0 {
            score += requirement_points.min(40.0);
            factors.push(format!("{} required capabilities", item.requirements.len()));
        }

        let dependency_points = item.dependencies.len() as f64 * self.config.dependency_weight;
        if dependency_points > 0.0 {
            score += dependency_points.min(24.0);
            factors.push(format!("{} dependencies", item.dependencies.len()));
        }

        if let Some(hint) = item.size_hint {
            score += f64::from(hint) * self.config.size_hint_weight;
            factors.push(format!("declared size hint {hint}"));
        }

        if let Some(failure_rate) = self.historical_failure_rate(item).await {
            score += failure_rate * self.config.history_weight;
            factors.push(format!(
                "historical failure rate {:.0}% for kind '{}'",
                failure_rate * 100.0,
                item.kind
            ));
        }

        let score = score.min(100.0);
        let level = ComplexityLevel::from_score(score);
        let recommendations = Self::recommendations(level, item);

        debug!(item_id = %item.id, score, level = level.as_str(), "analyzed work item");

        ComplexityReport {
            level,
            score,
            factors,
            recommendations,
        }
    }

    /// Failure fraction among similar records of the same kind, if the
    /// learner is attached and has evidence. Learner trouble never fails
    /// analysis.
    async fn historical_failure_rate(&self, item: &WorkItem) -> Option<f64> {
        let learner = self.learner.as_ref()?;
        let similar = learner
            .find_similar(&item.kind, &item.context, self.config.history_sample)
            .await
            .ok()?;
        if similar.is_empty() {
            return None;
        }
        let failures = similar.iter().filter(|s| !s.record.is_success()).count();
        Some(failures as f64 / similar.len() as f64)
    }

    fn recommendations(level: ComplexityLevel, item: &WorkItem) -> Vec<String> {
        let mut recommendations = Vec::new();
        match level {
            ComplexityLevel::Low | ComplexityLevel::Medium => {}
            ComplexityLevel::High => {
                recommendations.push("consider splitting into smaller work items".to_string());
            }
            ComplexityLevel::VeryHigh => {
                recommendations.push("split into smaller work items before dispatch".to_string());
                recommendations
                    .push("route to the highest-proficiency worker available".to_string());
            }
        }
        if item.requirements.len() > 3 {
            recommendations.push(
                "broad capability requirements narrow the eligible worker pool".to_string(),
            );
        }
        recommendations
    }
}

impl Default for ComplexityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
