//! Shared operator-session actor.
//!
//! The web-client channel is one physical session per operator — shared
//! mutable browser state that must never see two sends in flight. Instead of
//! sharing a connection across workers, the session is an owned actor: a
//! dedicated task drains an mpsc queue, pacing and transmitting one send at
//! a time. Job workers block on a oneshot for their turn.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use leadpilot_core::error::{LeadPilotError, Result};
use leadpilot_core::types::SendOutcome;

use crate::kind::{ChannelKind, SendAuthorization, SendIntent, SendPurpose};
use crate::pacer::ChannelPacer;
use crate::transport::Transport;

struct SessionRequest {
    recipient: String,
    body: String,
    purpose: SendPurpose,
    reply: oneshot::Sender<Result<SendOutcome>>,
}

/// Cloneable handle to the session actor.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionRequest>,
}

impl SessionHandle {
    /// Queue a send on the shared session and wait for its outcome.
    pub async fn send(
        &self,
        recipient: &str,
        body: &str,
        purpose: SendPurpose,
    ) -> Result<SendOutcome> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionRequest {
                recipient: recipient.to_string(),
                body: body.to_string(),
                purpose,
                reply,
            })
            .await
            .map_err(|_| LeadPilotError::Channel("session worker is gone".into()))?;
        rx.await
            .map_err(|_| LeadPilotError::Channel("session worker dropped the request".into()))?
    }
}

/// Spawn the single-session worker. All web-session sends must go through
/// the returned handle.
pub fn spawn_session_worker(
    pacer: Arc<ChannelPacer>,
    transport: Arc<dyn Transport>,
) -> SessionHandle {
    let (tx, mut rx) = mpsc::channel::<SessionRequest>(64);
    tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            let result = process(&pacer, transport.as_ref(), &request).await;
            let _ = request.reply.send(result);
        }
        tracing::debug!("Session worker stopped");
    });
    SessionHandle { tx }
}

async fn process(
    pacer: &ChannelPacer,
    transport: &dyn Transport,
    request: &SessionRequest,
) -> Result<SendOutcome> {
    let intent = SendIntent::free_form(request.purpose);
    match pacer.authorize_send(ChannelKind::WebSession, &request.recipient, &intent) {
        SendAuthorization::Proceed { delay } => {
            if !delay.is_zero() {
                tracing::debug!(
                    "⌛ Session pacing: waiting {:.1}s before send",
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
            }
            transport.send(&request.recipient, &request.body, None).await
        }
        SendAuthorization::Reject { reason } => Err(LeadPilotError::RejectedByPolicy(reason)),
        SendAuthorization::Deferred { reason, .. } => Err(LeadPilotError::Deferred(reason)),
    }
}
