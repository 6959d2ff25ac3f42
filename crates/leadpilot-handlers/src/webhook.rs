//! Webhook-reminder handler — POST a reminder payload to a callback URL.

use std::sync::Arc;

use async_trait::async_trait;

use leadpilot_channels::transport::post_webhook;
use leadpilot_core::error::Result;
use leadpilot_queue::dispatch::{HandlerOutcome, TaskHandler};
use leadpilot_queue::job::Job;

use crate::HandlerDeps;
use crate::payload::{WebhookReminderPayload, parse_payload};

pub struct WebhookReminderHandler {
    deps: Arc<HandlerDeps>,
}

impl WebhookReminderHandler {
    pub fn new(deps: Arc<HandlerDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl TaskHandler for WebhookReminderHandler {
    async fn run(&self, job: &Job) -> Result<HandlerOutcome> {
        let payload: WebhookReminderPayload = parse_payload(job)?;
        // Non-2xx and connection failures surface as channel errors; the
        // queue's backoff takes it from there.
        post_webhook(
            &self.deps.http,
            &payload.url,
            &payload.headers,
            &payload.payload,
        )
        .await?;
        Ok(HandlerOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_env;
    use leadpilot_core::error::LeadPilotError;
    use leadpilot_queue::job::JobType;

    #[tokio::test]
    async fn test_unreachable_endpoint_is_retryable_error() {
        let env = test_env();
        let job = Job::new(
            JobType::WebhookReminder,
            serde_json::json!({
                "url": "http://127.0.0.1:9/reminder",
                "payload": { "lead_id": "L1", "kind": "call_back" }
            }),
            None,
            5,
            chrono::Utc::now(),
        );
        let handler = WebhookReminderHandler::new(env.deps.clone());
        let err = handler.run(&job).await.unwrap_err();
        assert!(matches!(err, LeadPilotError::Channel(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_missing_url_is_handler_error() {
        let env = test_env();
        let job = Job::new(
            JobType::WebhookReminder,
            serde_json::json!({ "payload": {} }),
            None,
            5,
            chrono::Utc::now(),
        );
        let handler = WebhookReminderHandler::new(env.deps.clone());
        let err = handler.run(&job).await.unwrap_err();
        assert!(matches!(err, LeadPilotError::Handler(_)));
    }
}
