//! Channel identities and send-intent types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The closed set of outbound channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    /// Provider-mediated cloud messaging API (templated, e.g. WhatsApp
    /// Cloud API). Fixed minimum gap between sends.
    #[serde(rename = "wa_cloud")]
    CloudApi,
    /// Human-operated web-client session. One logical session per operator;
    /// every send gets a human-like jittered pause.
    #[serde(rename = "wa_web")]
    WebSession,
    /// Email. Scheduled sequence sends only — no proactive bump-ups.
    #[serde(rename = "email")]
    Email,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::CloudApi => "wa_cloud",
            ChannelKind::WebSession => "wa_web",
            ChannelKind::Email => "email",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "wa_cloud" => Some(ChannelKind::CloudApi),
            "wa_web" => Some(ChannelKind::WebSession),
            "email" => Some(ChannelKind::Email),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message form: provider-approved template, or free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageForm {
    Templated { template_id: String },
    FreeForm,
}

/// Why this send is happening; some channels restrict by purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPurpose {
    /// Direct reply in an active conversation.
    Reply,
    /// Proactive re-engagement nudge.
    BumpUp,
    /// Scheduled sequence step.
    Sequence,
}

/// What the caller wants to send, as far as policy cares.
#[derive(Debug, Clone)]
pub struct SendIntent {
    pub form: MessageForm,
    pub purpose: SendPurpose,
}

impl SendIntent {
    pub fn free_form(purpose: SendPurpose) -> Self {
        Self {
            form: MessageForm::FreeForm,
            purpose,
        }
    }

    pub fn templated(template_id: &str, purpose: SendPurpose) -> Self {
        Self {
            form: MessageForm::Templated {
                template_id: template_id.to_string(),
            },
            purpose,
        }
    }
}

/// The pacer's verdict for one send.
#[derive(Debug, Clone)]
pub enum SendAuthorization {
    /// Send, after waiting `delay`. The wait is an obligation: the pacer
    /// has already reserved the slot at `now + delay`.
    Proceed { delay: std::time::Duration },
    /// Hard policy rejection — do not send, do not retry automatically.
    Reject { reason: String },
    /// Try again at `resume_at` (e.g. outside email send hours). Not a
    /// failure; reschedule, never drop.
    Deferred {
        resume_at: DateTime<Utc>,
        reason: String,
    },
}
