//! Agent Handle
//!
//! Runs an [`AgentCore`] on its own task and feeds it through a bounded
//! queue. Requests from every clone of the handle are served one at a time
//! in arrival order, so turns never interleave and preference writes never
//! race. Each request carries a oneshot sender for its reply.
//!
//! The actor stops once every handle is dropped.

use sdk::errors::{EngineError, PersistenceError};
use sdk::types::{ConversationTurn, Integration};
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::core::{AgentCore, AgentStatus, CommandOutcome};
use super::preferences::UserPreference;
use crate::intent::IntentStats;

type Reply<T> = oneshot::Sender<T>;

enum Request {
    Process {
        text: String,
        reply: Reply<CommandOutcome>,
    },
    History {
        limit: Option<usize>,
        reply: Reply<Vec<ConversationTurn>>,
    },
    ClearHistory {
        reply: Reply<()>,
    },
    Status {
        reply: Reply<AgentStatus>,
    },
    Preferences {
        reply: Reply<UserPreference>,
    },
    LearningCounters {
        reply: Reply<HashMap<String, u64>>,
    },
    IntentStats {
        reply: Reply<IntentStats>,
    },
    SetStyle {
        style: String,
        reply: Reply<Result<(), PersistenceError>>,
    },
    SetLanguage {
        language: String,
        reply: Reply<Result<(), PersistenceError>>,
    },
    SetIntegration {
        integration: Integration,
        enabled: bool,
        reply: Reply<Result<(), PersistenceError>>,
    },
}

/// Cloneable front door to a running agent
#[derive(Clone)]
pub struct AgentHandle {
    tx: mpsc::Sender<Request>,
}

impl AgentHandle {
    /// Move `core` onto a new task with a queue of `capacity` requests
    pub fn spawn(core: AgentCore, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let task = tokio::spawn(run(core, rx));
        (Self { tx }, task)
    }

    async fn call<T>(&self, build: impl FnOnce(Reply<T>) -> Request) -> Result<T, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| EngineError::QueueClosed)?;
        rx.await.map_err(|_| EngineError::QueueClosed)
    }

    /// Queue a command and wait for its outcome
    pub async fn process_command(&self, text: impl Into<String>) -> Result<CommandOutcome, EngineError> {
        let text = text.into();
        self.call(|reply| Request::Process { text, reply }).await
    }

    pub async fn history(&self) -> Result<Vec<ConversationTurn>, EngineError> {
        self.call(|reply| Request::History { limit: None, reply })
            .await
    }

    /// The last `count` turns, oldest first
    pub async fn recent_history(&self, count: usize) -> Result<Vec<ConversationTurn>, EngineError> {
        self.call(|reply| Request::History {
            limit: Some(count),
            reply,
        })
        .await
    }

    pub async fn clear_history(&self) -> Result<(), EngineError> {
        self.call(|reply| Request::ClearHistory { reply }).await
    }

    pub async fn status(&self) -> Result<AgentStatus, EngineError> {
        self.call(|reply| Request::Status { reply }).await
    }

    pub async fn preferences(&self) -> Result<UserPreference, EngineError> {
        self.call(|reply| Request::Preferences { reply }).await
    }

    pub async fn learning_counters(&self) -> Result<HashMap<String, u64>, EngineError> {
        self.call(|reply| Request::LearningCounters { reply }).await
    }

    pub async fn intent_stats(&self) -> Result<IntentStats, EngineError> {
        self.call(|reply| Request::IntentStats { reply }).await
    }

    pub async fn set_communication_style(&self, style: impl Into<String>) -> Result<(), EngineError> {
        let style = style.into();
        self.call(|reply| Request::SetStyle { style, reply }).await??;
        Ok(())
    }

    pub async fn set_language(&self, language: impl Into<String>) -> Result<(), EngineError> {
        let language = language.into();
        self.call(|reply| Request::SetLanguage { language, reply })
            .await??;
        Ok(())
    }

    pub async fn set_integration_enabled(
        &self,
        integration: Integration,
        enabled: bool,
    ) -> Result<(), EngineError> {
        self.call(|reply| Request::SetIntegration {
            integration,
            enabled,
            reply,
        })
        .await??;
        Ok(())
    }
}

/// Actor loop. A dropped reply receiver is not an error.
async fn run(mut core: AgentCore, mut rx: mpsc::Receiver<Request>) {
    info!("Agent started");

    while let Some(request) = rx.recv().await {
        match request {
            Request::Process { text, reply } => {
                let outcome = core.process_command(&text).await;
                let _ = reply.send(outcome);
            }
            Request::History { limit, reply } => {
                let turns = match limit {
                    Some(count) => core.recent_history(count),
                    None => core.history(),
                };
                let _ = reply.send(turns.to_vec());
            }
            Request::ClearHistory { reply } => {
                core.clear_history();
                let _ = reply.send(());
            }
            Request::Status { reply } => {
                let _ = reply.send(core.status());
            }
            Request::Preferences { reply } => {
                let _ = reply.send(core.preferences().clone());
            }
            Request::LearningCounters { reply } => {
                let _ = reply.send(core.learning_counters().clone());
            }
            Request::IntentStats { reply } => {
                let _ = reply.send(core.intent_stats().clone());
            }
            Request::SetStyle { style, reply } => {
                let _ = reply.send(core.set_communication_style(&style).await);
            }
            Request::SetLanguage { language, reply } => {
                let _ = reply.send(core.set_language(&language).await);
            }
            Request::SetIntegration {
                integration,
                enabled,
                reply,
            } => {
                let _ = reply.send(core.set_integration_enabled(integration, enabled).await);
            }
        }
        debug!("Agent request served");
    }

    info!("Agent stopped");
}
