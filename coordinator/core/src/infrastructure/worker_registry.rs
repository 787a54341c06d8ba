// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! # WorkerRegistry — Keyed Worker State
//!
//! The only place worker load, availability and rolling performance change.
//! Backed by a `DashMap`, so updates to different workers proceed
//! concurrently while updates to the same worker serialize on its entry.

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::domain::{Worker, WorkerId};

#[derive(Default)]
pub struct WorkerRegistry {
    workers: DashMap<WorkerId, Worker>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self {
            workers: DashMap::new(),
        }
    }

    /// Register or replace a worker
    pub fn register(&self, worker: Worker) {
        debug!(worker_id = %worker.id, "registering worker");
        self.workers.insert(worker.id.clone(), worker);
    }

    pub fn get(&self, id: &WorkerId) -> Option<Worker> {
        self.workers.get(id).map(|entry| entry.clone())
    }

    pub fn contains(&self, id: &WorkerId) -> bool {
        self.workers.contains_key(id)
    }

    /// Point-in-time copy of every registered worker
    pub fn snapshot(&self) -> Vec<Worker> {
        let mut workers: Vec<Worker> =
            self.workers.iter().map(|entry| entry.clone()).collect();
        workers.sort_by(|a, b| a.id.cmp(&b.id));
        workers
    }

    pub fn set_available(&self, id: &WorkerId, available: bool) -> bool {
        match self.workers.get_mut(id) {
            Some(mut entry) => {
                entry.available = available;
                true
            }
            None => false,
        }
    }

    /// Mark a dispatch in flight: bumps the worker's load
    pub fn begin_dispatch(&self, id: &WorkerId) -> bool {
        match self.workers.get_mut(id) {
            Some(mut entry) => {
                entry.performance.current_load += 1;
                true
            }
            None => {
                warn!(worker_id = %id, "begin_dispatch for unregistered worker");
                false
            }
        }
    }

    /// Settle a dispatch: drops the load and folds the outcome into the
    /// rolling summary
    pub fn complete_dispatch(&self, id: &WorkerId, success: bool, duration_ms: u64) -> bool {
        match self.workers.get_mut(id) {
            Some(mut entry) => {
                entry.performance.current_load =
                    entry.performance.current_load.saturating_sub(1);
                entry.performance.absorb(success, duration_ms);
                true
            }
            None => {
                warn!(worker_id = %id, "complete_dispatch for unregistered worker");
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}
