//! Email-sequence handler — send one scheduled sequence email.
//!
//! Email is scheduled-only: the pacer rejects suppressed recipients and
//! defers sends outside the daily window. A deferral requeues the job for
//! the window's next opening — never dropped, never counted as a failure.

use std::sync::Arc;

use async_trait::async_trait;

use leadpilot_channels::kind::{ChannelKind, SendAuthorization, SendIntent, SendPurpose};
use leadpilot_core::error::{LeadPilotError, Result};
use leadpilot_core::types::{AuditEvent, Direction, MessageRecord};
use leadpilot_queue::dispatch::{HandlerOutcome, TaskHandler};
use leadpilot_queue::job::Job;

use crate::HandlerDeps;
use crate::payload::{EmailSequencePayload, parse_payload};

pub struct EmailSequenceHandler {
    deps: Arc<HandlerDeps>,
}

impl EmailSequenceHandler {
    pub fn new(deps: Arc<HandlerDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl TaskHandler for EmailSequenceHandler {
    async fn run(&self, job: &Job) -> Result<HandlerOutcome> {
        let payload: EmailSequencePayload = parse_payload(job)?;
        let deps = &self.deps;

        let lead = deps.conversations.get_lead(&payload.lead_id).await?;
        let to = lead.email.as_deref().ok_or_else(|| {
            LeadPilotError::Handler(format!("lead {} has no email address", lead.id))
        })?;

        let intent = SendIntent::free_form(SendPurpose::Sequence);
        match deps.pacer.authorize_send(ChannelKind::Email, to, &intent) {
            SendAuthorization::Proceed { .. } => {}
            SendAuthorization::Reject { reason } => {
                return Err(LeadPilotError::RejectedByPolicy(reason));
            }
            SendAuthorization::Deferred { resume_at, reason } => {
                return Ok(HandlerOutcome::Deferred { resume_at, reason });
            }
        }

        let outcome = deps.mailer.send(to, &payload.subject, &payload.body).await?;

        let now = deps.clock.now();
        deps.conversations
            .record_message(MessageRecord {
                lead_id: lead.id.clone(),
                channel: ChannelKind::Email.as_str().into(),
                direction: Direction::Outbound,
                body: payload.body.clone(),
                status: Some(outcome.status.clone()),
                external_id: outcome.external_id.clone(),
                created_at: now,
            })
            .await?;
        deps.conversations
            .record_event(AuditEvent::new(
                "SequenceEmailSent",
                "lead",
                &lead.id,
                serde_json::json!({ "subject": payload.subject }),
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
    use chrono::{TimeZone, Utc};
    use leadpilot_queue::job::JobType;

    fn email_job() -> Job {
        Job::new(
            JobType::EmailSequence,
            serde_json::json!({
                "lead_id": "L1",
                "subject": "Your trial ends soon",
                "body": "Three days left — want a walkthrough?"
            }),
            None,
            5,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_sends_inside_window() {
        let env = test_env();
        env.conversations.add_lead(lead("L1"));

        let handler = EmailSequenceHandler::new(env.deps.clone());
        let outcome = handler.run(&email_job()).await.unwrap();
        assert!(matches!(outcome, HandlerOutcome::Completed));

        let sent = env.mailer.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "lead@example.com");
        assert_eq!(sent[0].1, "Your trial ends soon");
        assert_eq!(env.conversations.messages().last().unwrap().channel, "email");
    }

    #[tokio::test]
    async fn test_defers_outside_window() {
        let env = test_env();
        env.conversations.add_lead(lead("L1"));
        env.clock.set(Utc.with_ymd_and_hms(2025, 6, 1, 5, 0, 0).unwrap());

        let handler = EmailSequenceHandler::new(env.deps.clone());
        let outcome = handler.run(&email_job()).await.unwrap();
        match outcome {
            HandlerOutcome::Deferred { resume_at, .. } => {
                assert_eq!(
                    resume_at,
                    Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
                );
            }
            other => panic!("expected Deferred, got {other:?}"),
        }
        assert!(env.mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lead_without_address_fails() {
        let env = test_env();
        let mut no_email = lead("L1");
        no_email.email = None;
        env.conversations.add_lead(no_email);

        let handler = EmailSequenceHandler::new(env.deps.clone());
        let err = handler.run(&email_job()).await.unwrap_err();
        assert!(matches!(err, LeadPilotError::Handler(_)));
    }
}
