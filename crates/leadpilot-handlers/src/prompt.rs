//! Prompt context builders for the reply provider.

use leadpilot_core::types::{Direction, Lead, MessageRecord};

/// How many trailing messages go into the engage context.
const CONTEXT_WINDOW: usize = 5;

/// Context for a direct reply: lead identity, pipeline stage, and the tail
/// of the conversation.
pub fn engage_context(lead: &Lead, history: &[MessageRecord]) -> String {
    let who = lead.name.as_deref().unwrap_or(&lead.phone);
    let mut context = format!("Lead: {who}\nStage: {}\n\nConversation:\n", lead.stage);
    let tail_start = history.len().saturating_sub(CONTEXT_WINDOW);
    for message in &history[tail_start..] {
        context.push_str(&format!("{}: {}\n", direction_label(message), message.body));
    }
    context
}

/// Context for a bump-up nudge: short, varied, never repeating the last
/// outbound message.
pub fn bump_up_context(lead: &Lead, last_outbound: Option<&MessageRecord>) -> String {
    let previous = last_outbound.map(|m| m.body.as_str()).unwrap_or("None");
    format!(
        "Lead: {}\nPrevious message: {previous}\n\
         Generate a different, friendly 35-word follow-up. Do not repeat yourself.",
        lead.phone
    )
}

/// Context for a whole-conversation summary.
pub fn summary_context(history: &[MessageRecord]) -> String {
    let conversation = history
        .iter()
        .map(|m| format!("{}: {}", direction_label(m), m.body))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Summarize this conversation in 3-5 sentences:\n{conversation}")
}

fn direction_label(message: &MessageRecord) -> &'static str {
    match message.direction {
        Direction::Inbound => "INBOUND",
        Direction::Outbound => "OUTBOUND",
    }
}
