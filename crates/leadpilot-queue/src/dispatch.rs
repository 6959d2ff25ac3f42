//! Priority dispatcher — worker pool, handler registry, retry controller.
//!
//! Workers pull the head of the ready ordering (`priority DESC, created_at
//! ASC`, `not_before` respected) through the store's claim CAS, so a job is
//! executed by at most one worker. Handler results feed the state machine:
//! success completes, deferral requeues without burning an attempt, errors
//! go through backoff until the budget is spent and the job lands in the
//! DLQ.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use leadpilot_core::clock::Clock;
use leadpilot_core::error::{LeadPilotError, Result};

use crate::job::{Job, JobType};
use crate::retry::RetryPolicy;
use crate::store::{JobStore, StatusCounts};

/// What a handler reports back for a claimed job.
#[derive(Debug, Clone)]
pub enum HandlerOutcome {
    /// Work done, side effects recorded.
    Completed,
    /// Nothing to do (e.g. gating predicate said no). Success, not failure.
    Skipped(String),
    /// Try again later (e.g. outside email send hours). Not a failure: the
    /// job is requeued for `resume_at` without consuming an attempt.
    Deferred {
        resume_at: DateTime<Utc>,
        reason: String,
    },
}

/// A domain action invoked by the dispatcher.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn run(&self, job: &Job) -> Result<HandlerOutcome>;
}

/// The priority dispatcher: owns the handler registry and the worker pool.
pub struct Dispatcher {
    store: Arc<JobStore>,
    handlers: HashMap<JobType, Arc<dyn TaskHandler>>,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    worker_count: usize,
    poll_interval: Duration,
    shutdown_tx: watch::Sender<bool>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<JobStore>,
        policy: RetryPolicy,
        clock: Arc<dyn Clock>,
        worker_count: usize,
        poll_interval: Duration,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            store,
            handlers: HashMap::new(),
            policy,
            clock,
            worker_count,
            poll_interval,
            shutdown_tx,
        }
    }

    /// Register the handler for a job type. Last registration wins.
    pub fn register(&mut self, job_type: JobType, handler: Arc<dyn TaskHandler>) {
        self.handlers.insert(job_type, handler);
    }

    /// Ingress surface: submit a job (duplicate-safe per idempotency key).
    pub fn submit(
        &self,
        job_type: JobType,
        payload: serde_json::Value,
        idempotency_key: Option<&str>,
    ) -> Result<String> {
        self.store.submit(job_type, payload, idempotency_key)
    }

    /// Ingress surface: per-status queue statistics.
    pub fn stats(&self) -> Result<StatusCounts> {
        self.store.counts()
    }

    /// Ingress surface: replay up to `limit` DLQ jobs.
    pub fn replay_dlq(&self, limit: usize) -> Result<usize> {
        self.store.replay_dlq(limit)
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Spawn the worker pool. Each worker loops: claim → execute → report,
    /// sleeping `poll_interval` when the queue has nothing ready.
    pub fn start(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        tracing::info!(
            "⚙️ Dispatcher started: {} workers, poll every {:?}",
            self.worker_count,
            self.poll_interval
        );
        (0..self.worker_count)
            .map(|worker_id| {
                let dispatcher = Arc::clone(self);
                let mut shutdown_rx = dispatcher.shutdown_tx.subscribe();
                tokio::spawn(async move {
                    loop {
                        if *shutdown_rx.borrow() {
                            tracing::debug!("Worker {worker_id} shutting down");
                            break;
                        }
                        match dispatcher.poll_once().await {
                            Ok(true) => {} // processed one; poll again immediately
                            Ok(false) => {
                                tokio::select! {
                                    _ = tokio::time::sleep(dispatcher.poll_interval) => {}
                                    _ = shutdown_rx.changed() => {}
                                }
                            }
                            Err(e) => {
                                tracing::warn!("Worker {worker_id} poll error: {e}");
                                tokio::time::sleep(dispatcher.poll_interval).await;
                            }
                        }
                    }
                })
            })
            .collect()
    }

    /// Stop all workers after their current job.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Claim and execute at most one job. Returns whether one was processed.
    /// The unit the worker loop (and the tests) drive.
    pub async fn poll_once(&self) -> Result<bool> {
        let Some(job) = self.store.claim_next()? else {
            return Ok(false);
        };
        self.process(job).await;
        Ok(true)
    }

    async fn process(&self, job: Job) {
        tracing::debug!(
            "▶️ Job {} ({}) attempt {}/{}",
            job.id,
            job.job_type,
            job.attempts,
            job.max_attempts
        );

        let result = match self.handlers.get(&job.job_type) {
            Some(handler) => handler.run(&job).await,
            None => Err(LeadPilotError::Handler(format!(
                "no handler registered for job type '{}'",
                job.job_type
            ))),
        };

        let applied = match result {
            Ok(HandlerOutcome::Completed) => {
                tracing::info!("✅ Job {} completed ({})", job.id, job.job_type);
                self.store.complete(&job.id)
            }
            Ok(HandlerOutcome::Skipped(reason)) => {
                tracing::info!("⏭️ Job {} skipped: {reason}", job.id);
                self.store.complete(&job.id)
            }
            Ok(HandlerOutcome::Deferred { resume_at, reason }) => {
                tracing::info!("⏸️ Job {} deferred until {resume_at}: {reason}", job.id);
                self.store.defer(&job.id, resume_at)
            }
            Err(e) => self.handle_failure(&job, e),
        };

        if let Err(e) = applied {
            // The CAS lost to an out-of-band status change; surface and move on.
            tracing::warn!("Job {} state update lost a race: {e}", job.id);
        }
    }

    /// Translate a handler error into the state machine.
    fn handle_failure(&self, job: &Job, error: LeadPilotError) -> Result<()> {
        match error {
            // Hard policy rejections are quarantined for inspection rather
            // than burning the retry budget on a send that can never pass.
            LeadPilotError::RejectedByPolicy(reason) => {
                tracing::warn!("🚫 Job {} rejected by policy: {reason}", job.id);
                self.store.fail_dlq(&job.id, &reason)
            }
            // A missing lead/job reference will not heal by retrying.
            LeadPilotError::NotFound(what) => {
                tracing::warn!("Job {} references missing data: {what}", job.id);
                self.store.fail_dlq(&job.id, &format!("not found: {what}"))
            }
            // A deferral surfaced as an error: short requeue, no attempt burned.
            LeadPilotError::Deferred(reason) => {
                let resume_at = self.clock.now() + self.policy.delay_for(1);
                tracing::info!("⏸️ Job {} deferred until {resume_at}: {reason}", job.id);
                self.store.defer(&job.id, resume_at)
            }
            other => {
                let message = other.to_string();
                if self.policy.is_exhausted(job.attempts) || job.attempts >= job.max_attempts {
                    tracing::warn!(
                        "💀 Job {} moved to DLQ after {} attempts: {message}",
                        job.id,
                        job.attempts
                    );
                    self.store.fail_dlq(&job.id, &message)
                } else {
                    let delay = self.policy.delay_for(job.attempts);
                    let resume_at = self.clock.now() + delay;
                    tracing::warn!(
                        "🔄 Job {} failed (attempt {}), retry in {}s: {message}",
                        job.id,
                        job.attempts,
                        delay.num_seconds()
                    );
                    self.store.fail_requeue(&job.id, &message, resume_at)
                }
            }
        }
    }
}
