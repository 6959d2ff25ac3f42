//! SQLite-backed conversation store for the standalone binary.
//!
//! The engine only sees the `ConversationStore` trait; in a larger
//! deployment this is the CRM. The standalone binary ships this minimal
//! backend so ingest → engage → reply works end to end out of the box.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params};

use leadpilot_core::error::{LeadPilotError, Result};
use leadpilot_core::traits::ConversationStore;
use leadpilot_core::types::{AuditEvent, Direction, Lead, MessageRecord};

pub struct SqliteCrm {
    conn: Mutex<Connection>,
}

impl SqliteCrm {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| LeadPilotError::Store(format!("CRM open: {e}")))?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS leads (
                id TEXT PRIMARY KEY,
                phone TEXT NOT NULL,
                email TEXT,
                name TEXT,
                stage TEXT NOT NULL DEFAULT 'New',
                attributes TEXT NOT NULL DEFAULT '{}'
            );

            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                lead_id TEXT NOT NULL,
                channel TEXT NOT NULL,
                direction TEXT NOT NULL,
                body TEXT NOT NULL,
                status TEXT,
                external_id TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                entity_type TEXT NOT NULL,
                entity_id TEXT NOT NULL,
                payload TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
         ",
        )
        .map_err(|e| LeadPilotError::Store(format!("CRM migration: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create or update a lead record.
    pub fn upsert_lead(&self, lead: &Lead) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO leads (id, phone, email, name, stage, attributes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                lead.id,
                lead.phone,
                lead.email,
                lead.name,
                lead.stage,
                lead.attributes.to_string(),
            ],
        )
        .map_err(|e| LeadPilotError::Store(format!("Upsert lead: {e}")))?;
        Ok(())
    }

    /// Record an inbound message, returning its row id (used to key the
    /// engage submission so one inbound event admits one job).
    pub fn record_inbound(&self, lead_id: &str, channel: &str, body: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO messages (lead_id, channel, direction, body, created_at)
             VALUES (?1, ?2, 'inbound', ?3, ?4)",
            params![lead_id, channel, body, ts(Utc::now())],
        )
        .map_err(|e| LeadPilotError::Store(format!("Record inbound: {e}")))?;
        Ok(conn.last_insert_rowid())
    }
}

#[async_trait]
impl ConversationStore for SqliteCrm {
    async fn get_lead(&self, lead_id: &str) -> Result<Lead> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, phone, email, name, stage, attributes FROM leads WHERE id = ?1",
            params![lead_id],
            |row| {
                let attributes: String = row.get(5)?;
                Ok(Lead {
                    id: row.get(0)?,
                    phone: row.get(1)?,
                    email: row.get(2)?,
                    name: row.get(3)?,
                    stage: row.get(4)?,
                    attributes: serde_json::from_str(&attributes).unwrap_or_default(),
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                LeadPilotError::NotFound(format!("lead {lead_id}"))
            }
            other => LeadPilotError::Store(format!("Get lead: {other}")),
        })
    }

    async fn history(&self, lead_id: &str) -> Result<Vec<MessageRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT lead_id, channel, direction, body, status, external_id, created_at
                 FROM messages WHERE lead_id = ?1 ORDER BY id ASC",
            )
            .map_err(|e| LeadPilotError::Store(format!("Prepare history: {e}")))?;
        let rows = stmt
            .query_map(params![lead_id], |row| {
                let direction: String = row.get(2)?;
                let created_at: String = row.get(6)?;
                Ok(MessageRecord {
                    lead_id: row.get(0)?,
                    channel: row.get(1)?,
                    direction: if direction == "inbound" {
                        Direction::Inbound
                    } else {
                        Direction::Outbound
                    },
                    body: row.get(3)?,
                    status: row.get(4)?,
                    external_id: row.get(5)?,
                    created_at: parse_ts(&created_at),
                })
            })
            .map_err(|e| LeadPilotError::Store(format!("History: {e}")))?;
        let mut messages = Vec::new();
        for row in rows {
            messages.push(row.map_err(|e| LeadPilotError::Store(format!("History row: {e}")))?);
        }
        Ok(messages)
    }

    async fn record_message(&self, message: MessageRecord) -> Result<()> {
        let direction = match message.direction {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        };
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO messages (lead_id, channel, direction, body, status, external_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                message.lead_id,
                message.channel,
                direction,
                message.body,
                message.status,
                message.external_id,
                ts(message.created_at),
            ],
        )
        .map_err(|e| LeadPilotError::Store(format!("Record message: {e}")))?;
        Ok(())
    }

    async fn record_event(&self, event: AuditEvent) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO events (kind, entity_type, entity_id, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.kind,
                event.entity_type,
                event.entity_id,
                event.payload.to_string(),
                ts(event.created_at),
            ],
        )
        .map_err(|e| LeadPilotError::Store(format!("Record event: {e}")))?;
        Ok(())
    }

    async fn set_lead_attribute(
        &self,
        lead_id: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        let mut lead = self.get_lead(lead_id).await?;
        if !lead.attributes.is_object() {
            lead.attributes = serde_json::json!({});
        }
        lead.attributes[key] = value;
        self.upsert_lead(&lead)
    }
}

fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_default()
}
