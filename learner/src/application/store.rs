// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! # ExperienceStore — Outcome Recording & Similarity Retrieval
//!
//! Application service implementing the learning loop: every completed work
//! item is stored as an [`ExecutionRecord`], enabling similarity-based
//! retrieval when future work of the same kind arrives.
//!
//! ## Similarity
//!
//! Retrieval ranks candidates by [`TaskContext::overlap`] (weighted Jaccard
//! over `{key: value}` pairs). Candidates scoring below
//! `similarity_threshold` (default 0.7) are excluded outright rather than
//! ranked low, so callers never act on weak evidence.
//!
//! ## Durability
//!
//! Writes retry transient repository failures with exponential backoff up to
//! `retry_attempts` (default 3) before surfacing [`LearnerError::Transient`].
//! Validation errors are returned immediately and never retried.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::domain::{ExecutionRecord, LearnerEvent, RecordId, TaskContext};
use crate::infrastructure::RecordRepository;

/// Event bus trait for publishing domain events
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, event: LearnerEvent) -> Result<()>;
}

/// EventBus that drops every event; default wiring when no subscriber exists
pub struct NoopEventBus;

#[async_trait]
impl EventBus for NoopEventBus {
    async fn publish(&self, _event: LearnerEvent) -> Result<()> {
        Ok(())
    }
}

/// Errors surfaced by the Experience Store
#[derive(Debug, thiserror::Error)]
pub enum LearnerError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("store unavailable after {attempts} attempts")]
    Transient {
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },
}

/// Tuning knobs for retrieval and write retries
#[derive(Debug, Clone)]
pub struct LearnerConfig {
    /// Minimum overlap score for `find_similar` results
    pub similarity_threshold: f64,
    /// Per-key weights applied during overlap scoring; absent keys weigh 1.0
    pub key_weights: BTreeMap<String, f64>,
    /// Bounded attempt count for transient repository failures
    pub retry_attempts: u32,
    /// Base delay for exponential backoff between attempts
    pub retry_base_delay: Duration,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.7,
            key_weights: BTreeMap::new(),
            retry_attempts: 3,
            retry_base_delay: Duration::from_millis(50),
        }
    }
}

/// Retention predicates for `cleanup`. Records matching any enabled
/// predicate survive even past the age cutoff.
#[derive(Debug, Clone)]
pub struct CleanupPolicy {
    pub keep_successful: bool,
    pub keep_with_remedy: bool,
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self {
            keep_successful: true,
            keep_with_remedy: true,
        }
    }
}

/// A retrieved record with its overlap score in `[0, 1]`
#[derive(Debug, Clone)]
pub struct SimilarRecord {
    pub record: ExecutionRecord,
    pub similarity: f64,
}

/// Aggregate counts over the whole store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LearnerStats {
    pub total: usize,
    pub successes: usize,
    pub failures: usize,
    pub with_remedy: usize,
}

/// Advice derived from the best matching successful record
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub record_id: RecordId,
    pub output_summary: String,
    pub confidence: f64,
}

/// ExperienceStore interface
#[async_trait]
pub trait ExperienceStore: Send + Sync {
    /// Record a successful outcome. Best-effort durable within a bounded write.
    async fn record_success(
        &self,
        kind: &str,
        context: TaskContext,
        output_summary: &str,
        duration_ms: u64,
        metadata: Option<serde_json::Value>,
    ) -> Result<RecordId, LearnerError>;

    /// Record a failed outcome, optionally with a remedy for future retrieval
    async fn record_failure(
        &self,
        kind: &str,
        context: TaskContext,
        error_category: &str,
        error_message: &str,
        remedy: Option<String>,
    ) -> Result<RecordId, LearnerError>;

    /// Records of the same kind whose context overlap meets the threshold,
    /// sorted descending by score, ties broken by recency. Empty for unknown
    /// kinds.
    async fn find_similar(
        &self,
        kind: &str,
        context: &TaskContext,
        limit: usize,
    ) -> Result<Vec<SimilarRecord>, LearnerError>;

    /// Delete records older than the cutoff that match no retention
    /// predicate. Idempotent. Returns the number of deleted records.
    async fn cleanup(
        &self,
        older_than: DateTime<Utc>,
        policy: CleanupPolicy,
    ) -> Result<usize, LearnerError>;

    /// Aggregate counts across the store
    async fn stats(&self) -> Result<LearnerStats, LearnerError>;

    /// Best similar successful record, if any clears the threshold
    async fn recommendation(
        &self,
        kind: &str,
        context: &TaskContext,
    ) -> Result<Option<Recommendation>, LearnerError>;
}

/// Standard implementation of ExperienceStore
pub struct StandardExperienceStore {
    repo: Arc<dyn RecordRepository>,
    event_bus: Arc<dyn EventBus>,
    config: LearnerConfig,
}

impl StandardExperienceStore {
    pub fn new(repo: Arc<dyn RecordRepository>, event_bus: Arc<dyn EventBus>) -> Self {
        Self {
            repo,
            event_bus,
            config: LearnerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LearnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Retry a repository operation with exponential backoff
    async fn with_retry<T, F, Fut>(&self, op: F) -> Result<T, LearnerError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.config.retry_attempts.max(1);
        let mut last_err = None;

        for attempt in 1..=attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    debug!(attempt, error = %err, "store operation failed");
                    last_err = Some(err);
                    if attempt < attempts {
                        let delay = self.config.retry_base_delay * 2u32.pow(attempt - 1);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(LearnerError::Transient {
            attempts,
            source: last_err.unwrap_or_else(|| anyhow::anyhow!("unknown store failure")),
        })
    }

    async fn store(&self, record: ExecutionRecord) -> Result<RecordId, LearnerError> {
        let id = self.with_retry(|| self.repo.append(&record)).await?;

        // Event delivery is observability, not durability; a dead bus must
        // not fail the write.
        let event = LearnerEvent::RecordStored {
            record_id: id,
            kind: record.kind.clone(),
            success: record.is_success(),
            timestamp: Utc::now(),
        };
        if let Err(err) = self.event_bus.publish(event).await {
            warn!(record_id = %id, error = %err, "failed to publish record_stored event");
        }

        Ok(id)
    }

    fn validate_kind(kind: &str) -> Result<(), LearnerError> {
        if kind.trim().is_empty() {
            return Err(LearnerError::Validation("kind must not be empty".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ExperienceStore for StandardExperienceStore {
    async fn record_success(
        &self,
        kind: &str,
        context: TaskContext,
        output_summary: &str,
        duration_ms: u64,
        metadata: Option<serde_json::Value>,
    ) -> Result<RecordId, LearnerError> {
        Self::validate_kind(kind)?;
        let record =
            ExecutionRecord::success(kind, context, output_summary, duration_ms, metadata);
        self.store(record).await
    }

    async fn record_failure(
        &self,
        kind: &str,
        context: TaskContext,
        error_category: &str,
        error_message: &str,
        remedy: Option<String>,
    ) -> Result<RecordId, LearnerError> {
        Self::validate_kind(kind)?;
        if error_category.trim().is_empty() {
            return Err(LearnerError::Validation(
                "error_category must not be empty".into(),
            ));
        }
        let record =
            ExecutionRecord::failure(kind, context, error_category, error_message, remedy);
        self.store(record).await
    }

    async fn find_similar(
        &self,
        kind: &str,
        context: &TaskContext,
        limit: usize,
    ) -> Result<Vec<SimilarRecord>, LearnerError> {
        Self::validate_kind(kind)?;
        let candidates = self.with_retry(|| self.repo.find_by_kind(kind)).await?;

        let mut scored: Vec<SimilarRecord> = candidates
            .into_iter()
            .map(|record| {
                let similarity = context.overlap(&record.context, &self.config.key_weights);
                SimilarRecord { record, similarity }
            })
            .filter(|similar| similar.similarity >= self.config.similarity_threshold)
            .collect();

        // Descending by score, ties broken by recency
        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.record.recorded_at.cmp(&a.record.recorded_at))
        });
        scored.truncate(limit);

        Ok(scored)
    }

    async fn cleanup(
        &self,
        older_than: DateTime<Utc>,
        policy: CleanupPolicy,
    ) -> Result<usize, LearnerError> {
        let all = self.with_retry(|| self.repo.all()).await?;

        let mut removed = 0usize;
        let mut retained = 0usize;
        for record in all {
            let expired = record.recorded_at < older_than;
            let protected = (policy.keep_successful && record.is_success())
                || (policy.keep_with_remedy && record.has_remedy());
            if expired && !protected {
                self.with_retry(|| self.repo.delete(record.id)).await?;
                removed += 1;
            } else {
                retained += 1;
            }
        }

        if removed > 0 {
            let event = LearnerEvent::RecordsPruned {
                kind: None,
                removed,
                retained,
                timestamp: Utc::now(),
            };
            if let Err(err) = self.event_bus.publish(event).await {
                warn!(error = %err, "failed to publish records_pruned event");
            }
        }

        Ok(removed)
    }

    async fn stats(&self) -> Result<LearnerStats, LearnerError> {
        let all = self.with_retry(|| self.repo.all()).await?;
        let mut stats = LearnerStats {
            total: all.len(),
            ..Default::default()
        };
        for record in &all {
            if record.is_success() {
                stats.successes += 1;
            } else {
                stats.failures += 1;
                if record.has_remedy() {
                    stats.with_remedy += 1;
                }
            }
        }
        Ok(stats)
    }

    async fn recommendation(
        &self,
        kind: &str,
        context: &TaskContext,
    ) -> Result<Option<Recommendation>, LearnerError> {
        let similar = self.find_similar(kind, context, 5).await?;

        Ok(similar.into_iter().find_map(|candidate| {
            match &candidate.record.outcome {
                crate::domain::Outcome::Success { output_summary, .. } => Some(Recommendation {
                    record_id: candidate.record.id,
                    output_summary: output_summary.clone(),
                    confidence: candidate.similarity,
                }),
                crate::domain::Outcome::Failure { .. } => None,
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryRecordRepository;
    use std::sync::Mutex;

    // Mock EventBus for testing
    struct MockEventBus {
        events: Arc<Mutex<Vec<LearnerEvent>>>,
    }

    impl MockEventBus {
        fn new() -> Self {
            Self {
                events: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn get_events(&self) -> Vec<LearnerEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EventBus for MockEventBus {
        async fn publish(&self, event: LearnerEvent) -> Result<()> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    fn store_with_bus() -> (StandardExperienceStore, Arc<MockEventBus>) {
        let repo = Arc::new(InMemoryRecordRepository::new());
        let event_bus = Arc::new(MockEventBus::new());
        let store = StandardExperienceStore::new(repo, event_bus.clone());
        (store, event_bus)
    }

    fn ctx(pairs: &[(&str, &str)]) -> TaskContext {
        let mut context = TaskContext::new();
        for (key, value) in pairs {
            context.insert(*key, *value);
        }
        context
    }

    #[tokio::test]
    async fn test_record_success_publishes_event() {
        let (store, bus) = store_with_bus();

        let id = store
            .record_success("code_review", ctx(&[("language", "rust")]), "lgtm", 1200, None)
            .await
            .unwrap();

        assert!(id.0.as_u128() > 0);
        let events = bus.get_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "record_stored");
    }

    #[tokio::test]
    async fn test_empty_kind_is_validation_error() {
        let (store, _) = store_with_bus();
        let err = store
            .record_success("  ", TaskContext::new(), "x", 1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LearnerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_find_similar_respects_threshold_limit_and_order() {
        let (store, _) = store_with_bus();
        let query = ctx(&[("language", "rust"), ("framework", "axum"), ("tier", "2")]);

        // Exact match, 2/3 overlap, 1/5 overlap (below 0.7 threshold)
        store
            .record_success("deploy", query.clone(), "exact", 10, None)
            .await
            .unwrap();
        store
            .record_success(
                "deploy",
                ctx(&[("language", "rust"), ("framework", "axum"), ("tier", "9")]),
                "close",
                10,
                None,
            )
            .await
            .unwrap();
        store
            .record_success(
                "deploy",
                ctx(&[("language", "rust"), ("framework", "actix"), ("tier", "9")]),
                "far",
                10,
                None,
            )
            .await
            .unwrap();

        let store = store.with_similarity_threshold(0.4);
        let results = store.find_similar("deploy", &query, 10).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].similarity, 1.0);
        assert!(results[0].similarity > results[1].similarity);
        assert!(results.iter().all(|r| r.similarity >= 0.4));

        let limited = store.find_similar("deploy", &query, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_find_similar_unknown_kind_is_empty() {
        let (store, _) = store_with_bus();
        let results = store
            .find_similar("never_seen", &TaskContext::new(), 5)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_find_similar_ties_broken_by_recency() {
        let (store, _) = store_with_bus();
        let query = ctx(&[("language", "rust")]);

        store
            .record_success("deploy", query.clone(), "older", 10, None)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        store
            .record_success("deploy", query.clone(), "newer", 10, None)
            .await
            .unwrap();

        let results = store.find_similar("deploy", &query, 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].record.recorded_at >= results[1].record.recorded_at);
    }

    #[tokio::test]
    async fn test_cleanup_honors_retention_predicates() {
        let repo = Arc::new(InMemoryRecordRepository::new());
        let bus = Arc::new(MockEventBus::new());
        let store = StandardExperienceStore::new(repo.clone(), bus.clone());

        store
            .record_success("build", TaskContext::new(), "kept", 10, None)
            .await
            .unwrap();
        store
            .record_failure(
                "build",
                TaskContext::new(),
                "timeout",
                "slow",
                Some("bump timeout".into()),
            )
            .await
            .unwrap();
        store
            .record_failure("build", TaskContext::new(), "oom", "killed", None)
            .await
            .unwrap();

        // Cutoff in the future: everything is "old", only the unprotected
        // failure without remedy goes.
        let cutoff = Utc::now() + chrono::Duration::seconds(10);
        let removed = store.cleanup(cutoff, CleanupPolicy::default()).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(repo.count().await.unwrap(), 2);

        // Idempotent
        let removed_again = store.cleanup(cutoff, CleanupPolicy::default()).await.unwrap();
        assert_eq!(removed_again, 0);

        let pruned_events: Vec<_> = bus
            .get_events()
            .into_iter()
            .filter(|e| e.event_type() == "records_pruned")
            .collect();
        assert_eq!(pruned_events.len(), 1);
    }

    #[tokio::test]
    async fn test_stats_counts_outcomes() {
        let (store, _) = store_with_bus();
        store
            .record_success("a", TaskContext::new(), "ok", 1, None)
            .await
            .unwrap();
        store
            .record_failure("a", TaskContext::new(), "net", "down", Some("retry".into()))
            .await
            .unwrap();
        store
            .record_failure("b", TaskContext::new(), "net", "down", None)
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(
            stats,
            LearnerStats {
                total: 3,
                successes: 1,
                failures: 2,
                with_remedy: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_recommendation_prefers_best_successful_match() {
        let (store, _) = store_with_bus();
        let query = ctx(&[("language", "rust"), ("tier", "2")]);

        store
            .record_failure("deploy", query.clone(), "timeout", "slow", None)
            .await
            .unwrap();
        store
            .record_success("deploy", query.clone(), "use canary rollout", 900, None)
            .await
            .unwrap();

        let rec = store
            .recommendation("deploy", &query)
            .await
            .unwrap()
            .expect("expected a recommendation");
        assert_eq!(rec.output_summary, "use canary rollout");
        assert_eq!(rec.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried_then_surfaced() {
        use std::sync::atomic::{AtomicU32, Ordering};

        struct FlakyRepo {
            calls: AtomicU32,
            fail_first: u32,
            inner: InMemoryRecordRepository,
        }

        #[async_trait]
        impl RecordRepository for FlakyRepo {
            async fn append(&self, record: &ExecutionRecord) -> Result<RecordId> {
                let call = self.calls.fetch_add(1, Ordering::SeqCst);
                if call < self.fail_first {
                    anyhow::bail!("connection reset");
                }
                self.inner.append(record).await
            }
            async fn find_by_kind(&self, kind: &str) -> Result<Vec<ExecutionRecord>> {
                self.inner.find_by_kind(kind).await
            }
            async fn find_by_id(&self, id: RecordId) -> Result<Option<ExecutionRecord>> {
                self.inner.find_by_id(id).await
            }
            async fn all(&self) -> Result<Vec<ExecutionRecord>> {
                self.inner.all().await
            }
            async fn delete(&self, id: RecordId) -> Result<()> {
                self.inner.delete(id).await
            }
            async fn count(&self) -> Result<usize> {
                self.inner.count().await
            }
        }

        let config = LearnerConfig {
            retry_base_delay: Duration::from_millis(1),
            ..Default::default()
        };

        // Fails twice, succeeds on the third attempt
        let repo = Arc::new(FlakyRepo {
            calls: AtomicU32::new(0),
            fail_first: 2,
            inner: InMemoryRecordRepository::new(),
        });
        let store = StandardExperienceStore::new(repo, Arc::new(NoopEventBus))
            .with_config(config.clone());
        assert!(store
            .record_success("build", TaskContext::new(), "ok", 1, None)
            .await
            .is_ok());

        // Fails on every attempt
        let repo = Arc::new(FlakyRepo {
            calls: AtomicU32::new(0),
            fail_first: u32::MAX,
            inner: InMemoryRecordRepository::new(),
        });
        let store =
            StandardExperienceStore::new(repo, Arc::new(NoopEventBus)).with_config(config);
        let err = store
            .record_success("build", TaskContext::new(), "ok", 1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LearnerError::Transient { attempts: 3, .. }));
    }
}
