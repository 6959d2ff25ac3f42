//! OpenAI-compatible reply provider.
//!
//! Works against any chat-completions endpoint; providers differ only by
//! base URL and API key. The model is instructed to answer with a strict
//! JSON object `{ "reply": ..., "should_stop": ... }`.

use async_trait::async_trait;
use serde_json::json;

use leadpilot_core::config::ProviderConfig;
use leadpilot_core::error::{LeadPilotError, Result};
use leadpilot_core::traits::ReplyProvider;
use leadpilot_core::types::ReplyDecision;

const SYSTEM_PROMPT: &str = "\
You are an AI sales assistant.

Rules:
- Reply under 40 words
- Ask only ONE question
- No emojis
- Be polite
Return JSON only:
{ \"reply\": \"...\", \"should_stop\": false }";

pub struct OpenAiProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ReplyProvider for OpenAiProvider {
    async fn generate(&self, context: &str) -> Result<ReplyDecision> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": context }
            ],
            "temperature": self.config.temperature,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .timeout(std::time::Duration::from_secs(60))
            .send()
            .await
            .map_err(|e| LeadPilotError::Provider(format!("Chat request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LeadPilotError::Provider(format!(
                "Chat API error {status}: {text}"
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LeadPilotError::Provider(format!("Invalid chat response: {e}")))?;
        let content = value["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LeadPilotError::Provider("Chat response had no content".into()))?;

        serde_json::from_str(content)
            .map_err(|e| LeadPilotError::Provider(format!("Reply was not valid JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_parsing_shape() {
        let decision: ReplyDecision =
            serde_json::from_str(r#"{ "reply": "Sure — what time works?", "should_stop": false }"#)
                .unwrap();
        assert!(!decision.should_stop);
        assert!(decision.reply.contains("what time"));

        // should_stop defaults to false when the model omits it.
        let decision: ReplyDecision = serde_json::from_str(r#"{ "reply": "Done." }"#).unwrap();
        assert!(!decision.should_stop);
    }
}
