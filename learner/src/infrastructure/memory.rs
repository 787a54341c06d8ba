// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! In-memory record storage
//! Default backing store; durable backends implement the same trait

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{ExecutionRecord, RecordId};
use crate::infrastructure::repository::RecordRepository;

/// In-memory implementation of RecordRepository
///
/// Records are bucketed by kind so that kind-scoped retrieval does not scan
/// unrelated history.
pub struct InMemoryRecordRepository {
    records: Arc<RwLock<HashMap<String, Vec<ExecutionRecord>>>>,
}

impl InMemoryRecordRepository {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryRecordRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordRepository for InMemoryRecordRepository {
    async fn append(&self, record: &ExecutionRecord) -> Result<RecordId> {
        let mut records = self.records.write().await;
        records
            .entry(record.kind.clone())
            .or_default()
            .push(record.clone());
        Ok(record.id)
    }

    async fn find_by_kind(&self, kind: &str) -> Result<Vec<ExecutionRecord>> {
        let records = self.records.read().await;
        Ok(records.get(kind).cloned().unwrap_or_default())
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<ExecutionRecord>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .flatten()
            .find(|record| record.id == id)
            .cloned())
    }

    async fn all(&self) -> Result<Vec<ExecutionRecord>> {
        let records = self.records.read().await;
        Ok(records.values().flatten().cloned().collect())
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        let mut records = self.records.write().await;
        for bucket in records.values_mut() {
            if let Some(pos) = bucket.iter().position(|record| record.id == id) {
                bucket.remove(pos);
                return Ok(());
            }
        }
        anyhow::bail!("Record not found: {id}")
    }

    async fn count(&self) -> Result<usize> {
        let records = self.records.read().await;
        Ok(records.values().map(Vec::len).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskContext;

    #[tokio::test]
    async fn append_and_find_by_kind() {
        let repo = InMemoryRecordRepository::new();
        let record = ExecutionRecord::success("build", TaskContext::new(), "ok", 10, None);
        let id = repo.append(&record).await.unwrap();

        let found = repo.find_by_kind("build").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
        assert!(repo.find_by_kind("deploy").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_across_kinds() {
        let repo = InMemoryRecordRepository::new();
        let a = ExecutionRecord::success("build", TaskContext::new(), "ok", 10, None);
        let b = ExecutionRecord::success("deploy", TaskContext::new(), "ok", 20, None);
        repo.append(&a).await.unwrap();
        repo.append(&b).await.unwrap();

        repo.delete(b.id).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);
        assert!(repo.find_by_id(b.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_unknown_id_errors() {
        let repo = InMemoryRecordRepository::new();
        assert!(repo.delete(RecordId::new()).await.is_err());
    }
}
