//! Engage handler — reply to an inbound message.
//!
//! The highest-priority job in the system: an inbound message produced a
//! submission (keyed so one logical event admits one job), and this handler
//! turns it into at most one outbound reply. The gating predicate can veto
//! the send entirely; a veto is a skip, not a failure.

use std::sync::Arc;

use async_trait::async_trait;

use leadpilot_channels::kind::{ChannelKind, SendPurpose};
use leadpilot_core::error::Result;
use leadpilot_core::types::{AuditEvent, Direction, MessageRecord};
use leadpilot_queue::dispatch::{HandlerOutcome, TaskHandler};
use leadpilot_queue::job::Job;

use crate::HandlerDeps;
use crate::payload::{EngagePayload, parse_payload};
use crate::prompt;

pub struct EngageHandler {
    deps: Arc<HandlerDeps>,
}

impl EngageHandler {
    pub fn new(deps: Arc<HandlerDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl TaskHandler for EngageHandler {
    async fn run(&self, job: &Job) -> Result<HandlerOutcome> {
        let payload: EngagePayload = parse_payload(job)?;
        let deps = &self.deps;

        let lead = deps.conversations.get_lead(&payload.lead_id).await?;
        let history = deps.conversations.history(&payload.lead_id).await?;

        if !(deps.gate)(&history) {
            return Ok(HandlerOutcome::Skipped("last message was outbound".into()));
        }

        let context = prompt::engage_context(&lead, &history);
        let decision = deps.provider.generate(&context).await?;

        // All web-session sends go through the session actor, which paces
        // and serializes them.
        let outcome = deps
            .session
            .send(&lead.phone, &decision.reply, SendPurpose::Reply)
            .await?;

        let now = deps.clock.now();
        deps.conversations
            .record_message(MessageRecord {
                lead_id: lead.id.clone(),
                channel: ChannelKind::WebSession.as_str().into(),
                direction: Direction::Outbound,
                body: decision.reply.clone(),
                status: Some(outcome.status.clone()),
                external_id: outcome.external_id.clone(),
                created_at: now,
            })
            .await?;
        deps.conversations
            .record_event(AuditEvent::new(
                "EngageCompleted",
                "lead",
                &lead.id,
                serde_json::json!({
                    "reply": decision.reply,
                    "channel": ChannelKind::WebSession.as_str(),
                    "should_stop": decision.should_stop,
                }),
                now,
            ))
            .await?;

        Ok(HandlerOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register_all;
    use crate::testutil::{lead, test_env};
    use leadpilot_queue::dispatch::Dispatcher;
    use leadpilot_queue::job::{JobStatus, JobType};
    use leadpilot_queue::retry::RetryPolicy;
    use std::time::Duration;

    fn engage_job(lead_id: &str) -> Job {
        Job::new(
            JobType::Engage,
            serde_json::json!({"lead_id": lead_id}),
            None,
            5,
            chrono::Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_replies_when_lead_spoke_last() {
        let env = test_env();
        env.conversations.add_lead(lead("L1"));
        env.conversations
            .push_message("L1", Direction::Inbound, "Is the demo still available?");

        let handler = EngageHandler::new(env.deps.clone());
        let outcome = handler.run(&engage_job("L1")).await.unwrap();
        assert!(matches!(outcome, HandlerOutcome::Completed));

        // Reply went out over the session transport...
        let sent = env.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "+15550001111");

        // ...and was recorded with its audit event.
        let messages = env.conversations.messages();
        let outbound = messages.last().unwrap();
        assert_eq!(outbound.direction, Direction::Outbound);
        assert_eq!(outbound.channel, "wa_web");
        assert_eq!(outbound.status.as_deref(), Some("sent"));

        let events = env.conversations.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, "EngageCompleted");
    }

    #[tokio::test]
    async fn test_skips_when_we_spoke_last() {
        let env = test_env();
        env.conversations.add_lead(lead("L1"));
        env.conversations
            .push_message("L1", Direction::Inbound, "hello?");
        env.conversations
            .push_message("L1", Direction::Outbound, "Hi! How can I help?");

        let handler = EngageHandler::new(env.deps.clone());
        let outcome = handler.run(&engage_job("L1")).await.unwrap();
        assert!(matches!(outcome, HandlerOutcome::Skipped(_)));
        assert!(env.transport.sent().is_empty());
        assert!(env.provider.contexts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_lead_is_not_found() {
        let env = test_env();
        let handler = EngageHandler::new(env.deps.clone());
        let err = handler.run(&engage_job("ghost")).await.unwrap_err();
        assert!(matches!(err, leadpilot_core::error::LeadPilotError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_prompt_contains_conversation_tail() {
        let env = test_env();
        env.conversations.add_lead(lead("L1"));
        env.conversations
            .push_message("L1", Direction::Inbound, "what about pricing tiers");

        let handler = EngageHandler::new(env.deps.clone());
        handler.run(&engage_job("L1")).await.unwrap();

        let contexts = env.provider.contexts.lock().unwrap();
        assert_eq!(contexts.len(), 1);
        assert!(contexts[0].contains("pricing tiers"));
        assert!(contexts[0].contains("Stage: New"));
    }

    /// The full path: duplicate submission collapses to one job, the
    /// dispatcher claims it, the gate passes, the reply goes out, and the
    /// job finishes `completed`.
    #[tokio::test]
    async fn test_end_to_end_engage_flow() {
        let env = test_env();
        env.conversations.add_lead(lead("L"));
        env.conversations
            .push_message("L", Direction::Inbound, "hi, saw your ad");

        let mut dispatcher = Dispatcher::new(
            env.store.clone(),
            RetryPolicy::default(),
            env.clock.clone(),
            1,
            Duration::from_millis(10),
        );
        register_all(&mut dispatcher, &env.deps);

        let a = dispatcher
            .submit(
                JobType::Engage,
                serde_json::json!({"lead_id": "L"}),
                Some("engage_L_M1"),
            )
            .unwrap();
        let b = dispatcher
            .submit(
                JobType::Engage,
                serde_json::json!({"lead_id": "L"}),
                Some("engage_L_M1"),
            )
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(env.store.counts().unwrap().queued, 1);

        assert!(dispatcher.poll_once().await.unwrap());
        assert_eq!(env.store.get(&a).unwrap().status, JobStatus::Completed);
        assert_eq!(env.transport.sent().len(), 1);
        assert!(!dispatcher.poll_once().await.unwrap());
    }
}
