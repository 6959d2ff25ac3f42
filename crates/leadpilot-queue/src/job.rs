//! Job definitions — the unit of schedulable, retryable work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Priority assigned to job types outside the known table.
pub const DEFAULT_PRIORITY: i32 = 50;

/// The closed set of known job types, with their wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    /// P1 — reply to an inbound message.
    #[serde(rename = "engage")]
    Engage,
    /// P1 — re-engage an idle lead with a short nudge.
    #[serde(rename = "bump-up")]
    BumpUp,
    /// P1 — summarize a conversation onto the lead record.
    #[serde(rename = "summarize")]
    Summarize,
    /// P2 — execute one step of a follow-up sequence.
    #[serde(rename = "sequence-step")]
    SequenceStep,
    /// P2 — send a scheduled sequence email.
    #[serde(rename = "email-sequence")]
    EmailSequence,
    /// P2 — fire a reminder webhook.
    #[serde(rename = "webhook-reminder")]
    WebhookReminder,
}

impl JobType {
    /// Fixed priority mapping (higher = more urgent). P1 (conversational)
    /// always preempts P2 (timed/scheduled) when both are ready.
    pub fn priority(&self) -> i32 {
        match self {
            JobType::Engage => 100,
            JobType::BumpUp => 95,
            JobType::Summarize => 90,
            JobType::SequenceStep => 70,
            JobType::EmailSequence => 60,
            JobType::WebhookReminder => DEFAULT_PRIORITY,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Engage => "engage",
            JobType::BumpUp => "bump-up",
            JobType::Summarize => "summarize",
            JobType::SequenceStep => "sequence-step",
            JobType::EmailSequence => "email-sequence",
            JobType::WebhookReminder => "webhook-reminder",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "engage" => Some(JobType::Engage),
            "bump-up" => Some(JobType::BumpUp),
            "summarize" => Some(JobType::Summarize),
            "sequence-step" => Some(JobType::SequenceStep),
            "email-sequence" => Some(JobType::EmailSequence),
            "webhook-reminder" => Some(JobType::WebhookReminder),
            _ => None,
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Dlq,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Dlq => "dlq",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(JobStatus::Queued),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            "dlq" => Some(JobStatus::Dlq),
            _ => None,
        }
    }

    /// The legal state machine:
    /// `queued → processing → {completed | queued | dlq}`, plus
    /// `dlq → queued` via explicit replay. Everything else is a conflict.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Queued)
                | (JobStatus::Processing, JobStatus::Dlq)
                | (JobStatus::Dlq, JobStatus::Queued)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of schedulable work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub job_type: JobType,
    pub priority: i32,
    pub payload: serde_json::Value,
    pub status: JobStatus,
    pub attempts: u32,
    pub max_attempts: u32,
    pub idempotency_key: Option<String>,
    pub last_error: Option<String>,
    /// Not dispatchable before this instant (retry backoff, deferral).
    pub not_before: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a fresh queued job. Priority is derived from the type.
    pub fn new(
        job_type: JobType,
        payload: serde_json::Value,
        idempotency_key: Option<String>,
        max_attempts: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            job_type,
            priority: job_type.priority(),
            payload,
            status: JobStatus::Queued,
            attempts: 0,
            max_attempts,
            idempotency_key,
            last_error: None,
            not_before: None,
            created_at: now,
            started_at: None,
            completed_at: None,
        }
    }
}
