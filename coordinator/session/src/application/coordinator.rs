// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! # CollaborationCoordinator — Sessions, Messaging & Workflow Execution
//!
//! Owns the session map and drives dependency-ordered workflow execution
//! inside a session. Sessions are fully independent units of concurrency:
//! there is no lock shared across sessions, and a failed step halts only its
//! own session's workflow.
//!
//! ## Closing
//!
//! `close_session` moves the session to `Closing`, waits up to
//! `drain_timeout` (default 30s) for in-flight workflows to settle, then
//! finalizes `Closed`. A workflow still running past the drain finds its
//! remaining phases failing with a closed-session error; its already
//! produced results stand.

use chrono::Utc;
use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{info, warn};

use quorum_coordinator_core::{
    CoordinationEvent, ExecutionPlan, TaskReasoner, WorkItem, WorkItemId, WorkerId,
    WorkerRegistry, EXECUTION_METRIC,
};
use quorum_learner::{ExperienceStore, TaskContext};
use quorum_telemetry::TelemetryStore;

use crate::application::workflow::{StepExecutor, StepOutcome, WorkflowFailure, WorkflowResult};
use crate::domain::{
    CoordinationError, Message, MessageId, Opinion, Recipient, Resolution, Session, SessionId,
    SessionStatus,
};

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How long `close_session` waits for in-flight workflows
    pub drain_timeout: Duration,
    /// Poll cadence for `wait_for_reply` and drain waiting
    pub poll_interval: Duration,
    /// Concurrent steps per parallel phase; defaults to the participant count
    pub max_concurrency: Option<usize>,
    /// Budget for one phase to settle
    pub phase_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            drain_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(25),
            max_concurrency: None,
            phase_timeout: Duration::from_secs(60),
        }
    }
}

pub struct CollaborationCoordinator {
    sessions: DashMap<SessionId, Session>,
    in_flight: DashMap<SessionId, Arc<AtomicU32>>,
    registry: Arc<WorkerRegistry>,
    reasoner: Arc<TaskReasoner>,
    learner: Option<Arc<dyn ExperienceStore>>,
    telemetry: Option<Arc<TelemetryStore>>,
    config: CoordinatorConfig,
}

impl CollaborationCoordinator {
    pub fn new(registry: Arc<WorkerRegistry>, reasoner: Arc<TaskReasoner>) -> Self {
        Self {
            sessions: DashMap::new(),
            in_flight: DashMap::new(),
            registry,
            reasoner,
            learner: None,
            telemetry: None,
            config: CoordinatorConfig::default(),
        }
    }

    pub fn with_learner(mut self, learner: Arc<dyn ExperienceStore>) -> Self {
        self.learner = Some(learner);
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<TelemetryStore>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Open a session. Every participant must already be registered.
    pub fn create_session(
        &self,
        name: &str,
        participants: Vec<WorkerId>,
        metadata: Option<serde_json::Value>,
    ) -> Result<SessionId, CoordinationError> {
        if name.trim().is_empty() {
            return Err(CoordinationError::Validation("session name must not be empty".into()));
        }
        if participants.is_empty() {
            return Err(CoordinationError::Validation(
                "a session needs at least one participant".into(),
            ));
        }
        for participant in &participants {
            if !self.registry.contains(participant) {
                return Err(CoordinationError::Validation(format!(
                    "participant '{participant}' is not a registered worker"
                )));
            }
        }

        let session = Session::new(name, participants, metadata);
        let id = session.id;
        info!(session_id = %id, name, "created session");
        self.sessions.insert(id, session);
        Ok(id)
    }

    /// Drain and close. Idempotent on an already closed session.
    pub async fn close_session(&self, id: SessionId) -> Result<(), CoordinationError> {
        {
            let mut session = self
                .sessions
                .get_mut(&id)
                .ok_or(CoordinationError::SessionNotFound { id })?;
            if session.status == SessionStatus::Closed {
                return Ok(());
            }
            session.begin_close();
        }

        if let Some(counter) = self.in_flight.get(&id).map(|entry| entry.clone()) {
            let deadline = Instant::now() + self.config.drain_timeout;
            while counter.load(Ordering::SeqCst) > 0 && Instant::now() < deadline {
                tokio::time::sleep(self.config.poll_interval).await;
            }
            let stranded = counter.load(Ordering::SeqCst);
            if stranded > 0 {
                warn!(session_id = %id, stranded, "drain timeout elapsed, discarding pending work");
            }
        }

        if let Some(mut session) = self.sessions.get_mut(&id) {
            session.finish_close();
        }
        info!(session_id = %id, "closed session");
        Ok(())
    }

    /// Point-in-time copy for inspection
    pub fn session(&self, id: SessionId) -> Option<Session> {
        self.sessions.get(&id).map(|entry| entry.clone())
    }

    // =========================================================================
    // Messaging
    // =========================================================================

    pub fn send_message(
        &self,
        session_id: SessionId,
        from: impl Into<WorkerId>,
        to: Recipient,
        message_type: &str,
        payload: serde_json::Value,
        in_reply_to: Option<MessageId>,
    ) -> Result<MessageId, CoordinationError> {
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(CoordinationError::SessionNotFound { id: session_id })?;
        session.append_message(from.into(), to, message_type, payload, in_reply_to)
    }

    /// Non-blocking inbox read; never advances the read cursor
    pub fn get_messages(
        &self,
        session_id: SessionId,
        participant: &WorkerId,
        message_type: Option<&str>,
        unread_only: bool,
    ) -> Result<Vec<Message>, CoordinationError> {
        let session = self
            .sessions
            .get(&session_id)
            .ok_or(CoordinationError::SessionNotFound { id: session_id })?;
        session.messages_for(participant, message_type, unread_only)
    }

    pub fn mark_read(
        &self,
        session_id: SessionId,
        participant: &WorkerId,
    ) -> Result<(), CoordinationError> {
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(CoordinationError::SessionNotFound { id: session_id })?;
        session.mark_read(participant)
    }

    /// Poll the log for a reply to `message_id`, up to `timeout`. Returns
    /// `None` when the timeout elapses without one.
    pub async fn wait_for_reply(
        &self,
        session_id: SessionId,
        message_id: MessageId,
        timeout: Duration,
    ) -> Result<Option<Message>, CoordinationError> {
        let deadline = Instant::now() + timeout;
        loop {
            {
                let session = self
                    .sessions
                    .get(&session_id)
                    .ok_or(CoordinationError::SessionNotFound { id: session_id })?;
                if let Some(reply) = session.reply_to(message_id) {
                    return Ok(Some(reply.clone()));
                }
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    // =========================================================================
    // Workflow execution
    // =========================================================================

    /// Execute a plan's phases in order inside a session. Within a parallel
    /// phase, steps run concurrently bounded by the configured concurrency.
    /// Any step failure halts the workflow after its phase settles; prior
    /// results are retained, never rolled back.
    pub async fn coordinate_workflow(
        &self,
        session_id: SessionId,
        items: &[WorkItem],
        plan: &ExecutionPlan,
        executor: Arc<dyn StepExecutor>,
    ) -> Result<WorkflowResult, CoordinationError> {
        let participants = {
            let session = self
                .sessions
                .get(&session_id)
                .ok_or(CoordinationError::SessionNotFound { id: session_id })?;
            if !session.is_open() {
                return Err(CoordinationError::SessionClosed { id: session_id });
            }
            session.participants.clone()
        };

        let by_id: HashMap<WorkItemId, &WorkItem> =
            items.iter().map(|item| (item.id, item)).collect();
        for phase in &plan.phases {
            for item_id in &phase.items {
                if !by_id.contains_key(item_id) {
                    return Err(CoordinationError::Validation(format!(
                        "plan references unknown work item {item_id}"
                    )));
                }
            }
        }

        let counter = self
            .in_flight
            .entry(session_id)
            .or_insert_with(|| Arc::new(AtomicU32::new(0)))
            .clone();
        counter.fetch_add(1, Ordering::SeqCst);
        let result = self
            .run_phases(session_id, &participants, &by_id, plan, executor)
            .await;
        counter.fetch_sub(1, Ordering::SeqCst);

        self.report_workflow(session_id, &result).await;
        Ok(result)
    }

    async fn run_phases(
        &self,
        session_id: SessionId,
        participants: &[WorkerId],
        by_id: &HashMap<WorkItemId, &WorkItem>,
        plan: &ExecutionPlan,
        executor: Arc<dyn StepExecutor>,
    ) -> WorkflowResult {
        let started = Instant::now();
        let permits = self
            .config
            .max_concurrency
            .unwrap_or(participants.len())
            .max(1);
        let semaphore = Arc::new(Semaphore::new(permits));

        let mut results: BTreeMap<WorkItemId, serde_json::Value> = BTreeMap::new();
        let mut steps: Vec<StepOutcome> = Vec::new();
        let mut failure: Option<WorkflowFailure> = None;
        let mut completed_phases = 0usize;

        'phases: for (phase_index, phase) in plan.phases.iter().enumerate() {
            // A session closed mid-flight fails remaining phases without
            // invalidating what already completed.
            let closed = self
                .sessions
                .get(&session_id)
                .map_or(true, |session| session.status == SessionStatus::Closed);
            if closed {
                failure = Some(WorkflowFailure {
                    item_id: None,
                    reason: format!("session {session_id} closed during workflow"),
                });
                break 'phases;
            }

            let phase_started = Instant::now();

            // Route every step up front; routing failures halt before any
            // dispatch in this phase.
            let candidates: Vec<_> = self
                .registry
                .snapshot()
                .into_iter()
                .filter(|worker| participants.contains(&worker.id))
                .collect();
            let mut routed: Vec<(WorkItemId, WorkerId)> = Vec::with_capacity(phase.items.len());
            for item_id in &phase.items {
                let item = by_id[item_id];
                match self.reasoner.route(item, &candidates) {
                    Ok(decision) => routed.push((*item_id, decision.selected)),
                    Err(err) => {
                        failure = Some(WorkflowFailure {
                            item_id: Some(*item_id),
                            reason: err.to_string(),
                        });
                        break 'phases;
                    }
                }
            }

            // Dispatch the phase
            let mut handles = Vec::with_capacity(routed.len());
            for (item_id, worker_id) in routed {
                let item = (*by_id[&item_id]).clone();
                self.registry.begin_dispatch(&worker_id);
                self.reasoner.event_bus().publish(CoordinationEvent::DispatchStarted {
                    item_id,
                    worker_id: worker_id.clone(),
                    timestamp: Utc::now(),
                });

                let executor = executor.clone();
                let semaphore = semaphore.clone();
                let task_worker = worker_id.clone();
                let handle = tokio::spawn(async move {
                    // The semaphore is never closed
                    let _permit = semaphore.acquire_owned().await.ok();
                    let step_started = Instant::now();
                    let outcome = executor
                        .execute(&item, &task_worker)
                        .await
                        .map_err(|err| err.to_string());
                    (outcome, step_started.elapsed().as_millis() as u64)
                });
                handles.push((item_id, worker_id, handle));
            }

            let deadline = phase_started + self.config.phase_timeout;
            let mut phase_failure: Option<WorkflowFailure> = None;
            for (item_id, worker_id, mut handle) in handles {
                let remaining = deadline.saturating_duration_since(Instant::now());
                let settled = tokio::time::timeout(remaining, &mut handle).await;
                let (outcome, duration_ms) = match settled {
                    Ok(Ok((outcome, duration_ms))) => (outcome, duration_ms),
                    Ok(Err(join_err)) => (Err(format!("step panicked: {join_err}")), 0),
                    Err(_) => {
                        // A detached step would still hold its semaphore
                        // permit and race the registry accounting
                        handle.abort();
                        (
                            Err("phase timeout elapsed".to_string()),
                            self.config.phase_timeout.as_millis() as u64,
                        )
                    }
                };

                let success = outcome.is_ok();
                self.registry.complete_dispatch(&worker_id, success, duration_ms);
                self.reasoner.event_bus().publish(CoordinationEvent::DispatchCompleted {
                    item_id,
                    worker_id: worker_id.clone(),
                    success,
                    duration_ms,
                    timestamp: Utc::now(),
                });
                self.record_step(by_id[&item_id], &worker_id, success, duration_ms);
                steps.push(StepOutcome {
                    item_id,
                    worker_id,
                    success,
                    duration_ms,
                });

                match outcome {
                    Ok(value) => {
                        results.insert(item_id, value);
                    }
                    Err(reason) => {
                        // First failure wins; the rest of the phase still
                        // settles for accounting.
                        if phase_failure.is_none() {
                            phase_failure = Some(WorkflowFailure {
                                item_id: Some(item_id),
                                reason,
                            });
                        }
                    }
                }
            }

            if let Some(telemetry) = &self.telemetry {
                telemetry.record(
                    "workflow.phase_duration_ms",
                    phase_started.elapsed().as_millis() as f64,
                    BTreeMap::from([
                        ("session".to_string(), session_id.to_string()),
                        ("phase".to_string(), phase_index.to_string()),
                    ]),
                    None,
                );
            }

            if phase_failure.is_some() {
                failure = phase_failure;
                break 'phases;
            }
            completed_phases += 1;
        }

        WorkflowResult {
            session_id,
            completed_phases,
            results,
            steps,
            failure,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    fn record_step(&self, item: &WorkItem, worker_id: &WorkerId, success: bool, duration_ms: u64) {
        if let Some(telemetry) = &self.telemetry {
            let status = if success { "success" } else { "failure" };
            telemetry.record(
                EXECUTION_METRIC,
                duration_ms as f64,
                BTreeMap::from([
                    ("worker".to_string(), worker_id.to_string()),
                    ("kind".to_string(), item.kind.clone()),
                    ("status".to_string(), status.to_string()),
                ]),
                None,
            );
        }
    }

    /// Report the overall outcome to the experience store; learner trouble
    /// never fails the workflow.
    async fn report_workflow(&self, session_id: SessionId, result: &WorkflowResult) {
        let Some(learner) = &self.learner else {
            return;
        };
        let name = self
            .sessions
            .get(&session_id)
            .map(|session| session.name.clone())
            .unwrap_or_default();
        let context = TaskContext::new()
            .with("session", name.as_str())
            .with("phases_completed", result.completed_phases as i64);

        let stored = match &result.failure {
            None => {
                learner
                    .record_success(
                        "workflow",
                        context,
                        &format!("{} step(s) completed", result.steps.len()),
                        result.duration_ms,
                        None,
                    )
                    .await
            }
            Some(failure) => {
                learner
                    .record_failure("workflow", context, "step_failed", &failure.reason, None)
                    .await
            }
        };
        if let Err(err) = stored {
            warn!(session_id = %session_id, error = %err, "failed to record workflow outcome");
        }
    }

    // =========================================================================
    // Conflict resolution
    // =========================================================================

    /// Majority vote over opinions. Ties break deterministically to the
    /// first strategy observed and are flagged on the resolution.
    pub fn resolve_conflict(
        &self,
        session_id: SessionId,
        description: &str,
        opinions: &[Opinion],
    ) -> Result<Resolution, CoordinationError> {
        if !self.sessions.contains_key(&session_id) {
            return Err(CoordinationError::SessionNotFound { id: session_id });
        }
        let resolution = Resolution::from_opinions(opinions).ok_or_else(|| {
            CoordinationError::Validation("cannot resolve a conflict without opinions".into())
        })?;

        info!(
            session_id = %session_id,
            description,
            strategy = %resolution.strategy,
            confidence = resolution.confidence,
            tied = resolution.tied,
            "resolved conflict"
        );
        if let Some(telemetry) = &self.telemetry {
            telemetry.record_event(
                "conflict_resolved",
                serde_json::json!({
                    "session": session_id.to_string(),
                    "strategy": resolution.strategy,
                    "confidence": resolution.confidence,
                    "tied": resolution.tied,
                    "resolved_at": Utc::now().to_rfc3339(),
                }),
            );
        }
        Ok(resolution)
    }
}
