//! # LeadPilot Channels
//!
//! Per-channel send policy and delivery plumbing:
//! - the **pacer** decides *when* a send may proceed (minimum gaps,
//!   human-like jitter, template/session-window rules, email send hours),
//! - the **session actor** serializes every send on the single shared
//!   operator session,
//! - the **transports** move the bytes (cloud messaging API, SMTP, webhook).
//!
//! Pacing is a property of the destination channel, never of job priority.
//! Channels are a closed set — adding one means adding a variant and its
//! policy row, not an open-ended registry.

pub mod email;
pub mod kind;
pub mod pacer;
pub mod session;
pub mod transport;

pub use email::{Mailer, SendHours, SmtpMailer};
pub use kind::{ChannelKind, MessageForm, SendAuthorization, SendIntent, SendPurpose};
pub use pacer::ChannelPacer;
pub use session::{SessionHandle, spawn_session_worker};
pub use transport::{CloudApiTransport, StubTransport, Transport, post_webhook};
