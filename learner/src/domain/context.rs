// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! Constrained key/value context attached to work items and stored records.
//!
//! Contexts are flat maps of scalars so that the similarity scoring in
//! [`TaskContext::overlap`] has well-defined key/value semantics. Nested
//! structures are deliberately not representable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single scalar context value.
///
/// Untagged on the wire: booleans, numbers and strings deserialize to the
/// natural variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Flat, ordered map of scalar context values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskContext(BTreeMap<String, ContextValue>);

impl TaskContext {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert, handy for tests and call sites.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ContextValue)> {
        self.0.iter()
    }

    /// Jaccard-style overlap over `{key: value}` pairs, in `[0, 1]`.
    ///
    /// A pair counts towards the intersection only when both contexts hold
    /// the same value for the key. The same key with two different values
    /// contributes two distinct pairs to the union. Per-key weights default
    /// to 1.0 when absent. Two empty contexts score 0.0: no evidence is not
    /// similarity.
    pub fn overlap(&self, other: &TaskContext, weights: &BTreeMap<String, f64>) -> f64 {
        let weight = |key: &str| weights.get(key).copied().unwrap_or(1.0).max(0.0);

        let mut intersection = 0.0;
        let mut union = 0.0;

        for (key, value) in &self.0 {
            union += weight(key);
            if other.0.get(key) == Some(value) {
                intersection += weight(key);
            }
        }
        for (key, value) in &other.0 {
            if self.0.get(key) == Some(value) {
                // Already counted in both sums above.
                continue;
            }
            union += weight(key);
        }

        if union == 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}

impl FromIterator<(String, ContextValue)> for TaskContext {
    fn from_iter<T: IntoIterator<Item = (String, ContextValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
