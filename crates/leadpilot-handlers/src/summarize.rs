//! Summarize handler — distill a conversation onto the lead record.
//!
//! No outbound send, so no pacing involved.

use std::sync::Arc;

use async_trait::async_trait;

use leadpilot_core::error::Result;
use leadpilot_core::types::AuditEvent;
use leadpilot_queue::dispatch::{HandlerOutcome, TaskHandler};
use leadpilot_queue::job::Job;

use crate::HandlerDeps;
use crate::payload::{SummarizePayload, parse_payload};
use crate::prompt;

pub struct SummarizeHandler {
    deps: Arc<HandlerDeps>,
}

impl SummarizeHandler {
    pub fn new(deps: Arc<HandlerDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl TaskHandler for SummarizeHandler {
    async fn run(&self, job: &Job) -> Result<HandlerOutcome> {
        let payload: SummarizePayload = parse_payload(job)?;
        let deps = &self.deps;

        // Touch the lead first so a dangling reference fails fast.
        let lead = deps.conversations.get_lead(&payload.lead_id).await?;
        let history = deps.conversations.history(&payload.lead_id).await?;
        if history.is_empty() {
            return Ok(HandlerOutcome::Skipped("no conversation to summarize".into()));
        }

        let context = prompt::summary_context(&history);
        let decision = deps.provider.generate(&context).await?;

        deps.conversations
            .set_lead_attribute(
                &lead.id,
                "ai_summary",
                serde_json::Value::String(decision.reply.clone()),
            )
            .await?;
        deps.conversations
            .record_event(AuditEvent::new(
                "ConversationSummarized",
                "lead",
                &lead.id,
                serde_json::json!({ "summary": decision.reply }),
                deps.clock.now(),
            ))
            .await?;

        Ok(HandlerOutcome::Completed)
    }
}
