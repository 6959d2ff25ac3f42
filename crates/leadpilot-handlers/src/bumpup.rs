//! Bump-up handler — re-engage an idle lead with a short, varied nudge.
//!
//! Bump-ups ride the WhatsApp-style channels only; the email channel
//! rejects the purpose outright at the pacer.

use std::sync::Arc;

use async_trait::async_trait;

use leadpilot_channels::kind::{ChannelKind, SendPurpose};
use leadpilot_core::error::Result;
use leadpilot_core::types::{AuditEvent, Direction, MessageRecord};
use leadpilot_queue::dispatch::{HandlerOutcome, TaskHandler};
use leadpilot_queue::job::Job;

use crate::HandlerDeps;
use crate::payload::{BumpUpPayload, parse_payload};
use crate::prompt;

pub struct BumpUpHandler {
    deps: Arc<HandlerDeps>,
}

impl BumpUpHandler {
    pub fn new(deps: Arc<HandlerDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl TaskHandler for BumpUpHandler {
    async fn run(&self, job: &Job) -> Result<HandlerOutcome> {
        let payload: BumpUpPayload = parse_payload(job)?;
        let deps = &self.deps;

        let lead = deps.conversations.get_lead(&payload.lead_id).await?;
        let history = deps.conversations.history(&payload.lead_id).await?;

        // Feed the last outbound message in so the model varies the nudge.
        let last_outbound = history
            .iter()
            .rev()
            .find(|m| m.direction == Direction::Outbound);
        let context = prompt::bump_up_context(&lead, last_outbound);
        let decision = deps.provider.generate(&context).await?;

        let outcome = deps
            .session
            .send(&lead.phone, &decision.reply, SendPurpose::BumpUp)
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
                "BumpUpSent",
                "lead",
                &lead.id,
                serde_json::json!({ "reply": decision.reply }),
                now,
            ))
            .await?;

        Ok(HandlerOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{lead, test_env};
    use leadpilot_queue::job::JobType;

    fn bump_up_job(lead_id: &str) -> Job {
        Job::new(
            JobType::BumpUp,
            serde_json::json!({"lead_id": lead_id}),
            None,
            5,
            chrono::Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_nudges_over_whatsapp_never_email() {
        let env = test_env();
        env.conversations.add_lead(lead("L1"));
        env.conversations
            .push_message("L1", Direction::Outbound, "any thoughts on the proposal?");

        let handler = BumpUpHandler::new(env.deps.clone());
        let outcome = handler.run(&bump_up_job("L1")).await.unwrap();
        assert!(matches!(outcome, HandlerOutcome::Completed));

        assert_eq!(env.transport.sent().len(), 1);
        assert!(env.mailer.sent.lock().unwrap().is_empty());
        assert_eq!(env.conversations.messages().last().unwrap().channel, "wa_web");
    }

    #[tokio::test]
    async fn test_prompt_avoids_repeating_last_nudge() {
        let env = test_env();
        env.conversations.add_lead(lead("L1"));
        env.conversations
            .push_message("L1", Direction::Outbound, "any thoughts on the proposal?");
        env.conversations
            .push_message("L1", Direction::Inbound, "busy week, sorry");

        let handler = BumpUpHandler::new(env.deps.clone());
        handler.run(&bump_up_job("L1")).await.unwrap();

        let contexts = env.provider.contexts.lock().unwrap();
        assert!(contexts[0].contains("any thoughts on the proposal?"));
        assert!(contexts[0].contains("Do not repeat yourself"));
    }
}
