//! Shared in-memory fakes for handler tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use leadpilot_channels::email::Mailer;
use leadpilot_channels::pacer::ChannelPacer;
use leadpilot_channels::session::spawn_session_worker;
use leadpilot_channels::transport::StubTransport;
use leadpilot_core::clock::ManualClock;
use leadpilot_core::config::PacingConfig;
use leadpilot_core::error::{LeadPilotError, Result};
use leadpilot_core::traits::{ConversationStore, ReplyProvider};
use leadpilot_core::types::{AuditEvent, Direction, Lead, MessageRecord, ReplyDecision, SendOutcome};
use leadpilot_queue::store::JobStore;

use crate::HandlerDeps;

pub(crate) struct MemoryConversationStore {
    leads: Mutex<HashMap<String, Lead>>,
    messages: Mutex<Vec<MessageRecord>>,
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self {
            leads: Mutex::new(HashMap::new()),
            messages: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn add_lead(&self, lead: Lead) {
        self.leads.lock().unwrap().insert(lead.id.clone(), lead);
    }

    pub fn push_message(&self, lead_id: &str, direction: Direction, body: &str) {
        let mut messages = self.messages.lock().unwrap();
        let created_at = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
            + chrono::Duration::seconds(messages.len() as i64);
        messages.push(MessageRecord {
            lead_id: lead_id.into(),
            channel: "wa_web".into(),
            direction,
            body: body.into(),
            status: None,
            external_id: None,
            created_at,
        });
    }

    pub fn messages(&self) -> Vec<MessageRecord> {
        self.messages.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn lead(&self, lead_id: &str) -> Option<Lead> {
        self.leads.lock().unwrap().get(lead_id).cloned()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn get_lead(&self, lead_id: &str) -> Result<Lead> {
        self.lead(lead_id)
            .ok_or_else(|| LeadPilotError::NotFound(format!("lead {lead_id}")))
    }

    async fn history(&self, lead_id: &str) -> Result<Vec<MessageRecord>> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.lead_id == lead_id)
            .cloned()
            .collect())
    }

    async fn record_message(&self, message: MessageRecord) -> Result<()> {
        self.messages.lock().unwrap().push(message);
        Ok(())
    }

    async fn record_event(&self, event: AuditEvent) -> Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }

    async fn set_lead_attribute(
        &self,
        lead_id: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        let mut leads = self.leads.lock().unwrap();
        let lead = leads
            .get_mut(lead_id)
            .ok_or_else(|| LeadPilotError::NotFound(format!("lead {lead_id}")))?;
        if !lead.attributes.is_object() {
            lead.attributes = serde_json::json!({});
        }
        lead.attributes[key] = value;
        Ok(())
    }
}

pub(crate) struct ScriptedProvider {
    decision: ReplyDecision,
    pub contexts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn replying(reply: &str) -> Self {
        Self {
            decision: ReplyDecision {
                reply: reply.into(),
                should_stop: false,
            },
            contexts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ReplyProvider for ScriptedProvider {
    async fn generate(&self, context: &str) -> Result<ReplyDecision> {
        self.contexts.lock().unwrap().push(context.to_string());
        Ok(self.decision.clone())
    }
}

pub(crate) struct StubMailer {
    pub sent: Mutex<Vec<(String, String, String)>>,
}

impl StubMailer {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Mailer for StubMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<SendOutcome> {
        self.sent
            .lock()
            .unwrap()
            .push((to.into(), subject.into(), body.into()));
        Ok(SendOutcome {
            status: "sent".into(),
            external_id: None,
        })
    }
}

pub(crate) struct TestEnv {
    pub deps: Arc<HandlerDeps>,
    pub store: Arc<JobStore>,
    pub conversations: Arc<MemoryConversationStore>,
    pub provider: Arc<ScriptedProvider>,
    pub transport: Arc<StubTransport>,
    pub mailer: Arc<StubMailer>,
    pub clock: Arc<ManualClock>,
}

/// Build a full handler environment with zeroed web pacing (tests exercise
/// policy and ordering, not wall time) and daytime email hours.
pub(crate) fn test_env() -> TestEnv {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    ));
    let store = Arc::new(JobStore::open_in_memory(clock.clone(), 5).unwrap());
    let conversations = Arc::new(MemoryConversationStore::new());
    let provider = Arc::new(ScriptedProvider::replying(
        "Thanks for reaching out — does Tuesday work?",
    ));
    let transport = Arc::new(StubTransport::new());
    let mailer = Arc::new(StubMailer::new());

    let pacing = PacingConfig {
        web_base_delay_secs: 0,
        web_jitter_secs: 0,
        cloud_min_gap_secs: 0,
        ..PacingConfig::default()
    };
    let pacer = Arc::new(ChannelPacer::new(pacing, clock.clone()));
    let session = spawn_session_worker(pacer.clone(), transport.clone());

    let deps = Arc::new(HandlerDeps {
        store: store.clone(),
        conversations: conversations.clone(),
        provider: provider.clone(),
        pacer,
        session,
        cloud: transport.clone(),
        mailer: mailer.clone(),
        http: reqwest::Client::new(),
        clock: clock.clone(),
        gate: HandlerDeps::default_gate(),
    });

    TestEnv {
        deps,
        store,
        conversations,
        provider,
        transport,
        mailer,
        clock,
    }
}

pub(crate) fn lead(id: &str) -> Lead {
    Lead {
        id: id.into(),
        phone: "+15550001111".into(),
        email: Some("lead@example.com".into()),
        name: Some("Avery".into()),
        stage: "New".into(),
        attributes: serde_json::Value::Null,
    }
}
