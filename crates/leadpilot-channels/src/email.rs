//! Email policy pieces and the SMTP mailer.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Timelike, Utc};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use leadpilot_core::config::{PacingConfig, SmtpConfig};
use leadpilot_core::error::{LeadPilotError, Result};
use leadpilot_core::types::SendOutcome;

/// Email delivery seam — lets handlers run against a stub in tests.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<SendOutcome>;
}

/// Daily send-hours window, UTC hours `[open, close)`.
///
/// Windows may wrap midnight (`open > close`), e.g. 22 → 6.
#[derive(Debug, Clone, Copy)]
pub struct SendHours {
    pub open_hour: u32,
    pub close_hour: u32,
}

impl SendHours {
    pub fn from_config(config: &PacingConfig) -> Self {
        Self {
            open_hour: config.email_open_hour,
            close_hour: config.email_close_hour,
        }
    }

    /// Is `t` inside the window?
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        let hour = t.hour();
        if self.open_hour <= self.close_hour {
            hour >= self.open_hour && hour < self.close_hour
        } else {
            hour >= self.open_hour || hour < self.close_hour
        }
    }

    /// The next instant at or after `t` when the window opens.
    /// Returns `t` itself when already inside.
    pub fn next_open(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        if self.contains(t) {
            return t;
        }
        let today_open = t
            .date_naive()
            .and_hms_opt(self.open_hour, 0, 0)
            .unwrap_or_else(|| t.date_naive().and_hms_opt(0, 0, 0).unwrap())
            .and_utc();
        if today_open > t {
            today_open
        } else {
            today_open + Duration::days(1)
        }
    }
}

/// SMTP mailer over lettre's async transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<SendOutcome> {
        self.send_mail(to, subject, body).await
    }
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let from: Mailbox = config
            .from_email
            .parse()
            .map_err(|e| LeadPilotError::Config(format!("Bad from address: {e}")))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| LeadPilotError::Channel(format!("SMTP relay: {e}")))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self { transport, from })
    }

    /// Send one plain-text email.
    pub async fn send_mail(&self, to: &str, subject: &str, body: &str) -> Result<SendOutcome> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| LeadPilotError::Channel(format!("Bad recipient address: {e}")))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| LeadPilotError::Channel(format!("Build email: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| LeadPilotError::Channel(format!("SMTP send: {e}")))?;

        tracing::debug!("📧 Email sent: {subject}");
        Ok(SendOutcome {
            status: "sent".into(),
            external_id: None,
        })
    }
}
