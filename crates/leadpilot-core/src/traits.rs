//! Collaborator traits — the seams between the engine and the outside world.
//!
//! Handlers and the pacer only ever touch these, never a concrete backend.
//! Production wires real implementations (CRM store, chat-completions
//! provider); tests wire in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{AuditEvent, Lead, MessageRecord, ReplyDecision};

/// Read/append access to leads and their conversation history.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Fetch a lead by id. `NotFound` if absent.
    async fn get_lead(&self, lead_id: &str) -> Result<Lead>;

    /// Ordered (oldest first) conversation history for a lead.
    async fn history(&self, lead_id: &str) -> Result<Vec<MessageRecord>>;

    /// Persist an outbound message record.
    async fn record_message(&self, message: MessageRecord) -> Result<()>;

    /// Persist an audit event.
    async fn record_event(&self, event: AuditEvent) -> Result<()>;

    /// Set a free-form attribute on a lead (e.g. "ai_summary").
    async fn set_lead_attribute(
        &self,
        lead_id: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<()>;
}

/// The language-model call that produces reply text.
#[async_trait]
pub trait ReplyProvider: Send + Sync {
    /// Generate a reply decision from a rendered context string.
    async fn generate(&self, context: &str) -> Result<ReplyDecision>;
}

/// Provider-defined 24h session window for the cloud API channel.
///
/// Free-form sends are only allowed while the recipient's last inbound
/// message is inside the window. The backing data (session timestamps)
/// lives with the collaborator; the default implementation is closed.
pub trait SessionWindow: Send + Sync {
    fn is_open(&self, recipient: &str, now: DateTime<Utc>) -> bool;
}

/// A session window that is never open; templates are always required.
pub struct ClosedSessionWindow;

impl SessionWindow for ClosedSessionWindow {
    fn is_open(&self, _recipient: &str, _now: DateTime<Utc>) -> bool {
        false
    }
}

/// Email suppression list (bounces, unsubscribes). Hard reject when listed.
pub trait SuppressionList: Send + Sync {
    fn is_suppressed(&self, address: &str) -> bool;
}

/// An empty suppression list.
pub struct NoSuppression;

impl SuppressionList for NoSuppression {
    fn is_suppressed(&self, _address: &str) -> bool {
        false
    }
}
