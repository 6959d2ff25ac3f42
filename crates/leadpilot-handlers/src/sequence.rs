//! Sequence-step handler — one step of a timed follow-up sequence.
//!
//! Stop conditions end the sequence quietly: once the lead replies, the
//! conversational jobs take over and the remaining steps are abandoned.
//! Otherwise the step is sent on its configured channel and the next step
//! schedules itself with a derived idempotency key, so re-running this job
//! can never fork the sequence.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;

use leadpilot_channels::kind::{ChannelKind, SendAuthorization, SendIntent, SendPurpose};
use leadpilot_core::error::{LeadPilotError, Result};
use leadpilot_core::types::{AuditEvent, Direction, MessageRecord, SendOutcome};
use leadpilot_queue::dispatch::{HandlerOutcome, TaskHandler};
use leadpilot_queue::job::{Job, JobType};

use crate::HandlerDeps;
use crate::payload::{SequenceStepPayload, parse_payload};

pub struct SequenceStepHandler {
    deps: Arc<HandlerDeps>,
}

impl SequenceStepHandler {
    pub fn new(deps: Arc<HandlerDeps>) -> Self {
        Self { deps }
    }

    async fn transmit(
        &self,
        payload: &SequenceStepPayload,
        phone: &str,
        email: Option<&str>,
    ) -> Result<Either<SendOutcome, HandlerOutcome>> {
        let deps = &self.deps;
        match payload.channel {
            ChannelKind::WebSession => {
                let outcome = deps
                    .session
                    .send(phone, &payload.body, SendPurpose::Sequence)
                    .await?;
                Ok(Either::Sent(outcome))
            }
            ChannelKind::CloudApi => {
                let intent = match &payload.template_id {
                    Some(template) => SendIntent::templated(template, SendPurpose::Sequence),
                    None => SendIntent::free_form(SendPurpose::Sequence),
                };
                match deps.pacer.authorize_send(ChannelKind::CloudApi, phone, &intent) {
                    SendAuthorization::Proceed { delay } => {
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                        let outcome = deps
                            .cloud
                            .send(phone, &payload.body, payload.template_id.as_deref())
                            .await?;
                        Ok(Either::Sent(outcome))
                    }
                    SendAuthorization::Reject { reason } => {
                        Err(LeadPilotError::RejectedByPolicy(reason))
                    }
                    SendAuthorization::Deferred { resume_at, reason } => {
                        Ok(Either::Outcome(HandlerOutcome::Deferred { resume_at, reason }))
                    }
                }
            }
            ChannelKind::Email => {
                let to = email.ok_or_else(|| {
                    LeadPilotError::Handler(format!(
                        "lead {} has no email address",
                        payload.lead_id
                    ))
                })?;
                let intent = SendIntent::free_form(SendPurpose::Sequence);
                match deps.pacer.authorize_send(ChannelKind::Email, to, &intent) {
                    SendAuthorization::Proceed { .. } => {
                        let subject = payload.subject.as_deref().unwrap_or("Following up");
                        let outcome = deps.mailer.send(to, subject, &payload.body).await?;
                        Ok(Either::Sent(outcome))
                    }
                    SendAuthorization::Reject { reason } => {
                        Err(LeadPilotError::RejectedByPolicy(reason))
                    }
                    SendAuthorization::Deferred { resume_at, reason } => {
                        Ok(Either::Outcome(HandlerOutcome::Deferred { resume_at, reason }))
                    }
                }
            }
        }
    }
}

enum Either<A, B> {
    Sent(A),
    Outcome(B),
}

#[async_trait]
impl TaskHandler for SequenceStepHandler {
    async fn run(&self, job: &Job) -> Result<HandlerOutcome> {
        let payload: SequenceStepPayload = parse_payload(job)?;
        let deps = &self.deps;

        let lead = deps.conversations.get_lead(&payload.lead_id).await?;
        let history = deps.conversations.history(&payload.lead_id).await?;

        // Stop condition: the lead replied since this step was scheduled.
        if matches!(history.last(), Some(m) if m.direction == Direction::Inbound) {
            return Ok(HandlerOutcome::Skipped(
                "lead replied — sequence stopped".into(),
            ));
        }

        let outcome = match self
            .transmit(&payload, &lead.phone, lead.email.as_deref())
            .await?
        {
            Either::Sent(outcome) => outcome,
            Either::Outcome(deferred) => return Ok(deferred),
        };

        let now = deps.clock.now();
        deps.conversations
            .record_message(MessageRecord {
                lead_id: lead.id.clone(),
                channel: payload.channel.as_str().into(),
                direction: Direction::Outbound,
                body: payload.body.clone(),
                status: Some(outcome.status.clone()),
                external_id: outcome.external_id.clone(),
                created_at: now,
            })
            .await?;
        deps.conversations
            .record_event(AuditEvent::new(
                "SequenceStepSent",
                "lead",
                &lead.id,
                serde_json::json!({
                    "sequence_id": payload.sequence_id,
                    "step": payload.step,
                    "channel": payload.channel.as_str(),
                }),
                now,
            ))
            .await?;

        // Self-schedule the next step, keyed so a replayed job can't fork
        // the sequence.
        if let Some((next, rest)) = payload.remaining.split_first() {
            let next_payload = SequenceStepPayload {
                step: payload.step + 1,
                body: next.body.clone(),
                remaining: rest.to_vec(),
                ..payload.clone()
            };
            let key = format!(
                "seq_{}_{}_{}",
                payload.sequence_id,
                payload.lead_id,
                payload.step + 1
            );
            let value = serde_json::to_value(&next_payload)
                .map_err(|e| LeadPilotError::Handler(format!("encode next step: {e}")))?;
            deps.store.submit_scheduled(
                JobType::SequenceStep,
                value,
                Some(&key),
                now + Duration::seconds(next.delay_secs as i64),
            )?;
            tracing::debug!(
                "Scheduled sequence {} step {} in {}s",
                payload.sequence_id,
                payload.step + 1,
                next.delay_secs
            );
        }

        Ok(HandlerOutcome::Completed)
    }
}
