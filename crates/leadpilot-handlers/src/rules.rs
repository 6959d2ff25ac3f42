//! Reply gating rules.

use leadpilot_core::types::{Direction, MessageRecord};

/// May the engage handler send an automated reply right now?
///
/// Only when the most recent message in the conversation is inbound.
/// If we spoke last, replying again would double-message the lead.
pub fn reply_gate(history: &[MessageRecord]) -> bool {
    matches!(
        history.last(),
        Some(message) if message.direction == Direction::Inbound
    )
}
