//! LeadPilot error taxonomy.
//!
//! Store and scheduler errors (`NotFound`, `Conflict`) always surface to the
//! caller. Handler errors are absorbed by the retry controller and translated
//! into job-state transitions — they never propagate raw to the ingress.

use thiserror::Error;

/// All errors produced by LeadPilot components.
#[derive(Debug, Error)]
pub enum LeadPilotError {
    /// A referenced job or lead does not exist. Not retried.
    #[error("not found: {0}")]
    NotFound(String),

    /// A concurrent status mutation won the race. The caller must re-read
    /// and decide — never silently overwrite.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The pacer hard-rejected a send (missing template, suppressed
    /// recipient, bump-up on email). Surfaced, not retried automatically.
    #[error("rejected by policy: {0}")]
    RejectedByPolicy(String),

    /// The pacer asked for the send to happen later (outside send hours).
    /// A scheduling event, not a failure.
    #[error("deferred: {0}")]
    Deferred(String),

    /// Any other failure during task execution. Retried per the backoff
    /// schedule up to `max_attempts`, then quarantined in the DLQ.
    #[error("handler error: {0}")]
    Handler(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("channel error: {0}")]
    Channel(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LeadPilotError>;

impl LeadPilotError {
    /// Whether the retry controller may re-queue after this error.
    /// Policy rejections and deferrals are not failures to retry.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            LeadPilotError::RejectedByPolicy(_) | LeadPilotError::Deferred(_)
        )
    }
}
