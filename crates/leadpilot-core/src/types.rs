//! Domain types shared across the engine.
//!
//! Leads, conversation messages, and send results are owned by external
//! collaborators — the core only reads and appends through the traits in
//! [`crate::traits`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A sales lead, as seen by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Pipeline stage label (e.g. "New", "Qualified").
    #[serde(default = "default_stage")]
    pub stage: String,
    /// Free-form attributes (summaries, tags).
    #[serde(default)]
    pub attributes: serde_json::Value,
}

fn default_stage() -> String {
    "New".into()
}

/// Message direction relative to us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// One message in a lead's conversation history, oldest-first ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub lead_id: String,
    /// Channel wire name ("wa_cloud", "wa_web", "email").
    pub channel: String,
    pub direction: Direction,
    pub body: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Result of a transport send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendOutcome {
    /// Transport-level status ("sent", "queued", ...).
    pub status: String,
    /// Provider message id, when one was issued.
    #[serde(default)]
    pub external_id: Option<String>,
}

/// The language model's decision for one engagement turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyDecision {
    pub reply: String,
    /// Model signalled the conversation should stop (handoff to a human).
    #[serde(default)]
    pub should_stop: bool,
}

/// An audit trail entry recorded after handler side effects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event kind, e.g. "EngageCompleted", "SequenceStepSent".
    pub kind: String,
    /// Entity type + id the event refers to ("lead", "job").
    pub entity_type: String,
    pub entity_id: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        kind: &str,
        entity_type: &str,
        entity_id: &str,
        payload: serde_json::Value,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: kind.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            payload,
            created_at: at,
        }
    }
}
