// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

pub mod health;
pub mod metric;

pub use health::{CheckResult, HealthCheck, HealthReport, HealthState, ThresholdRule};
pub use metric::{MetricPoint, MetricStatistics, TelemetryEvent};
