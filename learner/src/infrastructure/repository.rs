// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! Repository interface for the Experience Store
//! Defines the contract for outcome record storage

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{ExecutionRecord, RecordId};

/// Repository for appending and retrieving execution records
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Append a new record. Records are immutable once stored.
    async fn append(&self, record: &ExecutionRecord) -> Result<RecordId>;

    /// All records for a given task kind, in insertion order
    async fn find_by_kind(&self, kind: &str) -> Result<Vec<ExecutionRecord>>;

    /// Find a record by its ID
    async fn find_by_id(&self, id: RecordId) -> Result<Option<ExecutionRecord>>;

    /// All records across every kind (for cleanup and stats)
    async fn all(&self) -> Result<Vec<ExecutionRecord>>;

    /// Delete a record (for retention cleanup)
    async fn delete(&self, id: RecordId) -> Result<()>;

    /// Total number of stored records
    async fn count(&self) -> Result<usize>;
}
