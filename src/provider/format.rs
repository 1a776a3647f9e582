//! Provider formatting helpers shared by the adapters.

use crate::types::{ChatMessage, Role};

/// Instruction appended for providers without a native JSON mode.
pub(crate) const JSON_ONLY_INSTRUCTION: &str =
    "Respond with a single valid JSON object and nothing else.";

/// Split a transcript into the joined system prompt and the remaining turns.
///
/// Adjacent turns with the same role are merged, since the hosted chat APIs
/// that keep the system prompt out of band also require alternating roles.
pub(crate) fn split_system(messages: &[ChatMessage]) -> (Option<String>, Vec<ChatMessage>) {
    let system_parts: Vec<&str> = messages
        .iter()
        .filter(|m| m.is_system())
        .map(|m| m.content.as_str())
        .collect();
    let system = (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));

    let mut turns: Vec<ChatMessage> = Vec::new();
    for msg in messages.iter().filter(|m| !m.is_system()) {
        match turns.last_mut() {
            Some(last) if last.role == msg.role => {
                last.content.push_str("\n\n");
                last.content.push_str(&msg.content);
            }
            _ => turns.push(msg.clone()),
        }
    }
    (system, turns)
}

/// Wire name for a role in OpenAI-shaped APIs (also used by Ollama).
pub(crate) fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}
