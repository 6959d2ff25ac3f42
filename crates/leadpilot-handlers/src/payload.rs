//! Typed job payloads, one per handler.

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use leadpilot_channels::kind::ChannelKind;
use leadpilot_core::error::{LeadPilotError, Result};
use leadpilot_queue::job::Job;

/// Deserialize a job's payload into the handler's shape. A malformed
/// payload is a handler error like any other; the queue retries it
/// uniformly until the budget runs out.
pub fn parse_payload<T: DeserializeOwned>(job: &Job) -> Result<T> {
    serde_json::from_value(job.payload.clone()).map_err(|e| {
        LeadPilotError::Handler(format!("malformed payload for {}: {e}", job.job_type))
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagePayload {
    pub lead_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BumpUpPayload {
    pub lead_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizePayload {
    pub lead_id: String,
}

/// One message in a follow-up sequence's remaining schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceMessage {
    pub body: String,
    /// Gap before this message, in seconds from the previous step.
    pub delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceStepPayload {
    pub lead_id: String,
    pub sequence_id: String,
    /// 1-based step number, for idempotency keys and audit.
    pub step: u32,
    pub channel: ChannelKind,
    pub body: String,
    /// Email steps carry a subject.
    #[serde(default)]
    pub subject: Option<String>,
    /// Cloud-API steps may reference an approved template.
    #[serde(default)]
    pub template_id: Option<String>,
    /// Steps still to send after this one.
    #[serde(default)]
    pub remaining: Vec<SequenceMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSequencePayload {
    pub lead_id: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookReminderPayload {
    pub url: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub payload: serde_json::Value,
}
