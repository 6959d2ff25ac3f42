//! Outbound transports — the things that actually move bytes.
//!
//! Transports are intentionally thin: policy lives in the pacer, retries in
//! the queue. Everything here either succeeds with a provider message id or
//! fails with a `Channel` error for the retry controller to classify.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;

use leadpilot_core::config::CloudApiConfig;
use leadpilot_core::error::{LeadPilotError, Result};
use leadpilot_core::types::SendOutcome;

/// A channel transport: deliver `body` to `recipient`, optionally through a
/// provider-approved template.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        body: &str,
        template_id: Option<&str>,
    ) -> Result<SendOutcome>;
}

/// Cloud messaging API transport (Graph-style `/messages` endpoint).
pub struct CloudApiTransport {
    config: CloudApiConfig,
    client: reqwest::Client,
}

impl CloudApiTransport {
    pub fn new(config: CloudApiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Transport for CloudApiTransport {
    async fn send(
        &self,
        recipient: &str,
        body: &str,
        template_id: Option<&str>,
    ) -> Result<SendOutcome> {
        let url = format!(
            "https://graph.facebook.com/v21.0/{}/messages",
            self.config.phone_number_id
        );

        let payload = match template_id {
            Some(template) => serde_json::json!({
                "messaging_product": "whatsapp",
                "recipient_type": "individual",
                "to": recipient,
                "type": "template",
                "template": { "name": template, "language": { "code": "en" } }
            }),
            None => serde_json::json!({
                "messaging_product": "whatsapp",
                "recipient_type": "individual",
                "to": recipient,
                "type": "text",
                "text": { "preview_url": false, "body": body }
            }),
        };

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.access_token),
            )
            .json(&payload)
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| LeadPilotError::Channel(format!("Cloud API request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LeadPilotError::Channel(format!(
                "Cloud API error {status}: {error_text}"
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LeadPilotError::Channel(format!("Invalid Cloud API response: {e}")))?;
        let external_id = result["messages"][0]["id"].as_str().map(String::from);

        tracing::debug!("WhatsApp cloud message sent → {recipient}");
        Ok(SendOutcome {
            status: "sent".into(),
            external_id,
        })
    }
}

/// POST a JSON payload to a webhook URL with optional custom headers.
pub async fn post_webhook(
    client: &reqwest::Client,
    url: &str,
    headers: &[(String, String)],
    payload: &serde_json::Value,
) -> Result<SendOutcome> {
    let mut request = client
        .post(url)
        .json(payload)
        .timeout(std::time::Duration::from_secs(30));
    for (key, value) in headers {
        request = request.header(key.as_str(), value.as_str());
    }

    let response = request
        .send()
        .await
        .map_err(|e| LeadPilotError::Channel(format!("Webhook send failed: {e}")))?;

    if response.status().is_success() {
        tracing::info!("🌐 Webhook delivered to {url}");
        Ok(SendOutcome {
            status: "sent".into(),
            external_id: None,
        })
    } else {
        Err(LeadPilotError::Channel(format!(
            "Webhook error {}",
            response.status()
        )))
    }
}

/// In-memory transport for tests and dry runs: records every send and trips
/// a flag if two sends ever overlap.
pub struct StubTransport {
    sent: Mutex<Vec<(String, String)>>,
    counter: AtomicU64,
    in_flight: AtomicBool,
    overlap: AtomicBool,
}

impl StubTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            counter: AtomicU64::new(0),
            in_flight: AtomicBool::new(false),
            overlap: AtomicBool::new(false),
        }
    }

    /// Everything sent so far, in order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Did two sends ever run concurrently?
    pub fn saw_overlap(&self) -> bool {
        self.overlap.load(Ordering::SeqCst)
    }
}

impl Default for StubTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(
        &self,
        recipient: &str,
        body: &str,
        _template_id: Option<&str>,
    ) -> Result<SendOutcome> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlap.store(true, Ordering::SeqCst);
        }
        // Hold the slot long enough for a concurrent send to collide.
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        self.in_flight.store(false, Ordering::SeqCst);

        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), body.to_string()));
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(SendOutcome {
            status: "sent".into(),
            external_id: Some(format!("stub_{n}")),
        })
    }
}
