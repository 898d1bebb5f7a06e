//! Conversation History
//!
//! Append-only record of user and agent turns for one agent instance. Turns
//! are never edited or reordered; the only removal is a full clear.

use sdk::types::ConversationTurn;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user turn, returning its id
    pub fn push_user(&mut self, content: impl Into<String>, metadata: Option<String>) -> String {
        let turn = ConversationTurn::user(Self::next_id(), content);
        self.push(turn, metadata)
    }

    /// Append an agent turn, returning its id
    pub fn push_agent(&mut self, content: impl Into<String>, metadata: Option<String>) -> String {
        let turn = ConversationTurn::agent(Self::next_id(), content);
        self.push(turn, metadata)
    }

    fn push(&mut self, turn: ConversationTurn, metadata: Option<String>) -> String {
        let turn = match metadata {
            Some(metadata) => turn.with_metadata(metadata),
            None => turn,
        };
        let id = turn.id.clone();
        self.turns.push(turn);
        id
    }

    fn next_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// The last `count` turns, oldest first
    pub fn recent(&self, count: usize) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(count);
        &self.turns[start..]
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
