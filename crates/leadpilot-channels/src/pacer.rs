//! Channel pacer — per-channel send-rate policy.
//!
//! Called immediately before any transport invocation. Policies:
//! - **CloudApi**: fixed minimum gap per recipient; free-form text only
//!   inside the provider's 24h session window, otherwise a template ref is
//!   mandatory (absent both → reject, not delay).
//! - **WebSession**: human-like pause before every send, base ± uniform
//!   jitter. Combined with the single session actor this keeps inter-send
//!   gaps above the floor.
//! - **Email**: scheduled sends only (bump-ups rejected), suppression list
//!   is a hard reject, outside send hours is a deferral.
//!
//! Authorizations *reserve* their slot: the granted send instant becomes
//! the channel's last-send mark at authorization time, so two concurrent
//! authorizers stack their gaps instead of both passing the interval check.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use leadpilot_core::clock::Clock;
use leadpilot_core::config::PacingConfig;
use leadpilot_core::traits::{ClosedSessionWindow, NoSuppression, SessionWindow, SuppressionList};

use crate::email::SendHours;
use crate::kind::{ChannelKind, MessageForm, SendAuthorization, SendIntent, SendPurpose};

/// Decides when a send may proceed and what pause to apply.
pub struct ChannelPacer {
    config: PacingConfig,
    send_hours: SendHours,
    clock: Arc<dyn Clock>,
    session_window: Arc<dyn SessionWindow>,
    suppression: Arc<dyn SuppressionList>,
    /// Reserved send instants, keyed per channel (+ recipient for CloudApi).
    reservations: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl ChannelPacer {
    pub fn new(config: PacingConfig, clock: Arc<dyn Clock>) -> Self {
        let send_hours = SendHours::from_config(&config);
        Self {
            config,
            send_hours,
            clock,
            session_window: Arc::new(ClosedSessionWindow),
            suppression: Arc::new(NoSuppression),
            reservations: Mutex::new(HashMap::new()),
        }
    }

    /// Wire a real session-window source (default: always closed).
    pub fn with_session_window(mut self, window: Arc<dyn SessionWindow>) -> Self {
        self.session_window = window;
        self
    }

    /// Wire a real suppression list (default: empty).
    pub fn with_suppression(mut self, list: Arc<dyn SuppressionList>) -> Self {
        self.suppression = list;
        self
    }

    /// Authorize one send. `Proceed { delay }` obligates the caller to wait
    /// `delay` before invoking the transport.
    pub fn authorize_send(
        &self,
        channel: ChannelKind,
        recipient: &str,
        intent: &SendIntent,
    ) -> SendAuthorization {
        match channel {
            ChannelKind::CloudApi => self.authorize_cloud(recipient, intent),
            ChannelKind::WebSession => self.authorize_web(),
            ChannelKind::Email => self.authorize_email(recipient, intent),
        }
    }

    fn authorize_cloud(&self, recipient: &str, intent: &SendIntent) -> SendAuthorization {
        let now = self.clock.now();
        if matches!(intent.form, MessageForm::FreeForm)
            && !self.session_window.is_open(recipient, now)
        {
            return SendAuthorization::Reject {
                reason: "template required outside 24h session window".into(),
            };
        }

        let min_gap = Duration::seconds(self.config.cloud_min_gap_secs as i64);
        let key = format!("wa_cloud:{recipient}");
        let mut reservations = self.reservations.lock().unwrap();
        let scheduled = match reservations.get(&key) {
            Some(last) if *last + min_gap > now => *last + min_gap,
            _ => now,
        };
        reservations.insert(key, scheduled);

        let delay = (scheduled - now).to_std().unwrap_or_default();
        SendAuthorization::Proceed { delay }
    }

    fn authorize_web(&self) -> SendAuthorization {
        let now = self.clock.now();
        let base = self.config.web_base_delay_secs as f64;
        let jitter_max = self.config.web_jitter_secs as f64;
        let jitter = if jitter_max > 0.0 {
            rand::thread_rng().gen_range(-jitter_max..=jitter_max)
        } else {
            0.0
        };
        let delay_secs = (base + jitter).max(0.0);
        let delay = StdDuration::from_secs_f64(delay_secs);

        self.reservations.lock().unwrap().insert(
            ChannelKind::WebSession.as_str().to_string(),
            now + Duration::milliseconds((delay_secs * 1000.0) as i64),
        );
        SendAuthorization::Proceed { delay }
    }

    fn authorize_email(&self, recipient: &str, intent: &SendIntent) -> SendAuthorization {
        if intent.purpose == SendPurpose::BumpUp {
            return SendAuthorization::Reject {
                reason: "bump-ups are not permitted on email".into(),
            };
        }
        if self.suppression.is_suppressed(recipient) {
            return SendAuthorization::Reject {
                reason: format!("recipient {recipient} is on the suppression list"),
            };
        }
        let now = self.clock.now();
        if !self.send_hours.contains(now) {
            let resume_at = self.send_hours.next_open(now);
            return SendAuthorization::Deferred {
                resume_at,
                reason: "outside email send hours".into(),
            };
        }
        SendAuthorization::Proceed {
            delay: StdDuration::ZERO,
        }
    }
}
