//! # LeadPilot Handlers
//!
//! The domain actions the dispatcher invokes. Each handler loads what it
//! needs from the collaborator traits, asks the pacer for permission before
//! any outbound send, transmits, records the outbound message plus an audit
//! event, and reports its outcome to the scheduler.
//!
//! Handlers never talk to the job store's state machine directly — success,
//! skip, deferral and failure all flow back through
//! [`leadpilot_queue::HandlerOutcome`].

pub mod bumpup;
pub mod email_sequence;
pub mod engage;
pub mod payload;
pub mod prompt;
pub mod provider;
pub mod rules;
pub mod sequence;
pub mod summarize;
pub mod webhook;

#[cfg(test)]
pub(crate) mod testutil;

use std::sync::Arc;

use leadpilot_channels::email::Mailer;
use leadpilot_channels::pacer::ChannelPacer;
use leadpilot_channels::session::SessionHandle;
use leadpilot_channels::transport::Transport;
use leadpilot_core::clock::Clock;
use leadpilot_core::traits::{ConversationStore, ReplyProvider};
use leadpilot_core::types::MessageRecord;
use leadpilot_queue::dispatch::Dispatcher;
use leadpilot_queue::job::JobType;
use leadpilot_queue::store::JobStore;

pub use provider::OpenAiProvider;

/// The reply-gating predicate: may the engage handler send at all?
pub type GatePredicate = Arc<dyn Fn(&[MessageRecord]) -> bool + Send + Sync>;

/// Everything a handler can reach. One bundle, cloned into each handler.
pub struct HandlerDeps {
    /// Job store, for handlers that schedule follow-up work.
    pub store: Arc<JobStore>,
    pub conversations: Arc<dyn ConversationStore>,
    pub provider: Arc<dyn ReplyProvider>,
    pub pacer: Arc<ChannelPacer>,
    /// The single shared web-session actor.
    pub session: SessionHandle,
    /// Cloud messaging API transport.
    pub cloud: Arc<dyn Transport>,
    pub mailer: Arc<dyn Mailer>,
    pub http: reqwest::Client,
    pub clock: Arc<dyn Clock>,
    pub gate: GatePredicate,
}

impl HandlerDeps {
    /// The default gate: only reply when the lead spoke last.
    pub fn default_gate() -> GatePredicate {
        Arc::new(rules::reply_gate)
    }
}

/// Register every handler on the dispatcher.
pub fn register_all(dispatcher: &mut Dispatcher, deps: &Arc<HandlerDeps>) {
    dispatcher.register(
        JobType::Engage,
        Arc::new(engage::EngageHandler::new(deps.clone())),
    );
    dispatcher.register(
        JobType::BumpUp,
        Arc::new(bumpup::BumpUpHandler::new(deps.clone())),
    );
    dispatcher.register(
        JobType::Summarize,
        Arc::new(summarize::SummarizeHandler::new(deps.clone())),
    );
    dispatcher.register(
        JobType::SequenceStep,
        Arc::new(sequence::SequenceStepHandler::new(deps.clone())),
    );
    dispatcher.register(
        JobType::EmailSequence,
        Arc::new(email_sequence::EmailSequenceHandler::new(deps.clone())),
    );
    dispatcher.register(
        JobType::WebhookReminder,
        Arc::new(webhook::WebhookReminderHandler::new(deps.clone())),
    );
}
