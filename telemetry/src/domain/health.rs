// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! Threshold-based health classification
//!
//! Each check maps a measured value through a threshold rule into
//! healthy/degraded/unhealthy; a report aggregates checks with worst-of
//! status and a weighted 0-100 score.

use serde::{Deserialize, Serialize};

/// Per-check and overall health state. Ordering is severity: worst-of
/// aggregation uses `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthState {
    /// Contribution to the weighted report score
    pub fn score(self) -> f64 {
        match self {
            HealthState::Healthy => 100.0,
            HealthState::Degraded => 50.0,
            HealthState::Unhealthy => 0.0,
        }
    }
}

/// Banding rule for a measured value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThresholdRule {
    /// Usage-style metrics where high is bad (disk, memory, error rate).
    /// healthy < degraded_above, degraded < unhealthy_above, else unhealthy.
    UpperBound {
        degraded_above: f64,
        unhealthy_above: f64,
    },
    /// Rate-style metrics where low is bad (success rate).
    /// healthy >= degraded_below, degraded >= unhealthy_below, else unhealthy.
    LowerBound {
        degraded_below: f64,
        unhealthy_below: f64,
    },
}

impl ThresholdRule {
    /// Default usage bands: healthy < 70, degraded 70-90, unhealthy >= 90
    pub fn usage() -> Self {
        ThresholdRule::UpperBound {
            degraded_above: 70.0,
            unhealthy_above: 90.0,
        }
    }

    /// Default rate bands: healthy >= 90, degraded 70-90, unhealthy < 70
    pub fn rate() -> Self {
        ThresholdRule::LowerBound {
            degraded_below: 90.0,
            unhealthy_below: 70.0,
        }
    }

    pub fn classify(&self, value: f64) -> HealthState {
        match *self {
            ThresholdRule::UpperBound {
                degraded_above,
                unhealthy_above,
            } => {
                if value >= unhealthy_above {
                    HealthState::Unhealthy
                } else if value >= degraded_above {
                    HealthState::Degraded
                } else {
                    HealthState::Healthy
                }
            }
            ThresholdRule::LowerBound {
                degraded_below,
                unhealthy_below,
            } => {
                if value < unhealthy_below {
                    HealthState::Unhealthy
                } else if value < degraded_below {
                    HealthState::Degraded
                } else {
                    HealthState::Healthy
                }
            }
        }
    }
}

/// A named check to evaluate. The measured value is either supplied
/// explicitly or resolved from the latest matching metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub name: String,
    pub rule: ThresholdRule,
    /// Explicit reading; takes precedence over metric lookup
    pub value: Option<f64>,
    /// Metric name to resolve the latest value from when `value` is absent
    pub metric: Option<String>,
    /// Relative weight in the report score
    pub weight: f64,
}

impl HealthCheck {
    pub fn with_value(name: impl Into<String>, rule: ThresholdRule, value: f64) -> Self {
        Self {
            name: name.into(),
            rule,
            value: Some(value),
            metric: None,
            weight: 1.0,
        }
    }

    pub fn from_metric(name: impl Into<String>, rule: ThresholdRule, metric: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rule,
            value: None,
            metric: Some(metric.into()),
            weight: 1.0,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight.max(0.0);
        self
    }
}

/// Outcome of a single evaluated check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub value: f64,
    pub state: HealthState,
    pub rule: ThresholdRule,
}

/// On-demand health report for a component. Derived from checks; not
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub component_type: String,
    pub component_id: Option<String>,
    pub state: HealthState,
    pub score: f64,
    pub checks: Vec<CheckResult>,
    /// One or more checks could not be resolved to a value
    pub partial: bool,
}
