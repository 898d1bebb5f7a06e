//! Generative Reply Providers
//!
//! Chat-message model shared by the HTTP generative providers, and the
//! prompt builders that turn a [`PersonalizationContext`] into a message
//! list. The only provider shipped today is [`OllamaGenerator`].

use sdk::types::PersonalizationContext;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod ollama;

pub use ollama::OllamaGenerator;

/// Number of recent conversation turns sent along with a prompt
const HISTORY_WINDOW: usize = 10;

/// Message in a conversation sent to a provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

/// Build the message list for a reply shaped by the personalization context.
///
/// The newest user turn is usually the prompt itself, so it is not repeated
/// from history.
pub fn reply_messages(prompt: &str, context: &PersonalizationContext) -> Vec<Message> {
    let mut system = String::from("You are Concierge, a concise personal assistant.");
    if !context.communication_style.is_empty() {
        system.push_str(&format!(
            " Answer in a {} style.",
            context.communication_style
        ));
    }
    if !context.language.is_empty() && !context.language.eq_ignore_ascii_case("en") {
        system.push_str(&format!(
            " Answer in the language with code '{}'.",
            context.language
        ));
    }

    let mut messages = vec![Message::system(system)];

    let mut turns: &[_] = &context.history;
    if let Some(last) = turns.last() {
        if last.is_user && last.content.trim() == prompt.trim() {
            turns = &turns[..turns.len() - 1];
        }
    }
    let start = turns.len().saturating_sub(HISTORY_WINDOW);
    messages.extend(turns[start..].iter().map(|turn| {
        if turn.is_user {
            Message::user(turn.content.clone())
        } else {
            Message::assistant(turn.content.clone())
        }
    }));

    messages.push(Message::user(prompt));
    messages
}
