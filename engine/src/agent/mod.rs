//! Agent
//!
//! The orchestrator that ties classification, planning, execution and reply
//! composition together, plus the state it owns: conversation history,
//! user preferences and a lifecycle status.

pub mod core;
pub mod handle;
pub mod history;
pub mod preferences;

pub use self::core::{AgentCore, AgentStatus, Collaborators, CommandOutcome, PipelineError};
pub use handle::AgentHandle;
pub use history::ConversationHistory;
pub use preferences::{PreferenceStore, UserPreference};
