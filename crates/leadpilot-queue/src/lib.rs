//! # LeadPilot Queue
//!
//! Durable priority job queue: SQLite-backed store, priority dispatcher with
//! a worker pool, retry/backoff controller, and dead-letter quarantine.
//!
//! ## Guarantees
//! - Exactly-once admission per idempotency key — duplicate submissions
//!   return the existing job id.
//! - Single-flight execution — the `queued → processing` compare-and-set
//!   admits at most one worker per job.
//! - Bounded retries with an escalating backoff schedule, then DLQ.
//! - DLQ jobs are inert until an explicit replay re-admits them.
//!
//! ## Architecture
//! ```text
//! submit(type, payload, key?) ─▶ JobStore (rusqlite)
//!                                   │ claim_next: priority DESC, created_at ASC,
//!                                   │             not_before <= now, CAS to processing
//!                                   ▼
//!                              Dispatcher workers ──▶ TaskHandler registry
//!                                   │ Ok → completed        │
//!                                   │ Deferred → requeue (no attempt burned)
//!                                   └ Err → backoff requeue, or DLQ after max_attempts
//! ```

pub mod dispatch;
pub mod job;
pub mod retry;
pub mod store;

pub use dispatch::{Dispatcher, HandlerOutcome, TaskHandler};
pub use job::{Job, JobStatus, JobType};
pub use retry::RetryPolicy;
pub use store::{JobStore, StatusCounts};
