//! Agent Core
//!
//! The orchestrator. For each command it:
//!
//! 1. Appends the user turn (tagged with its sentiment when available)
//! 2. Classifies the text into an intent
//! 3. Plans and executes the workflow under a personalization snapshot
//! 4. Optionally translates the reply into the preferred language
//! 5. Bumps the learning counter for the command's pattern on success
//! 6. Appends the agent turn
//! 7. Persists the durable preference fields and returns to `Ready`
//!
//! Step failures are ordinary replies. Only a registry conflict or a failed
//! preference save puts the agent into `ErrorOccurred`. A failed save does
//! not undo a workflow that already ran: its result stays in the outcome and
//! the fault is reported next to it.
//!
//! The stored preferences own the enabled integration set; the agent pushes
//! it into the integration provider at startup and on every change.
//!
//! All methods take `&mut self`; use [`AgentHandle`](super::AgentHandle) to
//! share one agent between tasks.

use sdk::collaborators::{GenerativeProvider, IntegrationProvider, LanguageProvider};
use sdk::errors::{ConciergeErrorExt, EngineError, PersistenceError};
use sdk::types::{ConversationTurn, Integration};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::history::ConversationHistory;
use super::preferences::{PreferenceStore, UserPreference};
use crate::config::Config;
use crate::intent::{Intent, IntentClassifier, IntentStats};
use crate::message_bus::{Event, MessageBus};
use crate::workflow::{RegistryError, Workflow, WorkflowExecutor, WorkflowPlanner, WorkflowRegistry, WorkflowResult};

const ERROR_METADATA: &str = "Error";

/// Agent lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Ready,
    Processing,
    ErrorOccurred,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Ready => write!(f, "ready"),
            AgentStatus::Processing => write!(f, "processing"),
            AgentStatus::ErrorOccurred => write!(f, "error"),
        }
    }
}

/// Faults of the pipeline itself, as opposed to failed steps
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Failed to save preferences: {0}")]
    Persistence(#[from] PersistenceError),
}

impl ConciergeErrorExt for PipelineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Registry(_) => "Another request is still running. Try again",
            Self::Persistence(e) => e.user_hint(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Registry(_) => true,
            Self::Persistence(e) => e.is_recoverable(),
        }
    }
}

/// External services the agent drives
#[derive(Clone)]
pub struct Collaborators {
    pub language: Arc<dyn LanguageProvider>,
    pub generator: Arc<dyn GenerativeProvider>,
    pub integrations: Arc<dyn IntegrationProvider>,
}

/// What a processed command produced
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    /// Text shown to the user
    pub reply: String,
    pub success: bool,
    pub intent: Intent,

    /// Absent when the workflow never ran
    pub result: Option<WorkflowResult>,

    /// Pipeline fault reported next to the reply, e.g. a failed save
    pub fault: Option<String>,
}

/// Agent Core that orchestrates the command pipeline
pub struct AgentCore {
    classifier: IntentClassifier,
    planner: WorkflowPlanner,
    executor: WorkflowExecutor,
    language: Arc<dyn LanguageProvider>,
    generator: Arc<dyn GenerativeProvider>,
    integrations: Arc<dyn IntegrationProvider>,
    preferences: PreferenceStore,
    history: ConversationHistory,
    intent_stats: IntentStats,
    status: AgentStatus,
    translate_replies: bool,
    storage_key: String,
    bus: Option<Arc<MessageBus>>,
}

impl AgentCore {
    /// Create a new agent core
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` when the classifier table is invalid.
    pub fn new(
        config: &Config,
        collaborators: Collaborators,
        preferences: PreferenceStore,
    ) -> Result<Self, EngineError> {
        let classifier = IntentClassifier::new(&config.classifier, Arc::clone(&collaborators.language))?;
        let executor = WorkflowExecutor::new(
            Arc::clone(&collaborators.integrations),
            Arc::clone(&collaborators.generator),
            WorkflowRegistry::new(),
            config.agent.upcoming_days,
        );

        let core = Self {
            classifier,
            planner: WorkflowPlanner::new(config.agent.event_duration_mins),
            executor,
            language: collaborators.language,
            generator: collaborators.generator,
            integrations: collaborators.integrations,
            preferences,
            history: ConversationHistory::new(),
            intent_stats: IntentStats::default(),
            status: AgentStatus::Ready,
            translate_replies: config.agent.translate_replies,
            storage_key: config.agent.storage_key.clone(),
            bus: None,
        };
        core.apply_integrations();
        Ok(core)
    }

    /// Push the stored enabled set into the integration provider
    fn apply_integrations(&self) {
        let current = self.preferences.current();
        for integration in Integration::ALL {
            self.integrations
                .set_enabled(integration, current.is_enabled(integration));
        }
        debug!("Integrations applied: {:?}", current.enabled_integrations);
    }

    /// Publish pipeline events on `bus`
    pub fn with_bus(mut self, bus: Arc<MessageBus>) -> Self {
        self.executor = self.executor.with_bus(Arc::clone(&bus));
        self.bus = Some(bus);
        self
    }

    /// Process one command end to end
    pub async fn process_command(&mut self, text: &str) -> CommandOutcome {
        info!("Command received ({} chars)", text.len());
        self.publish(Event::CommandReceived {
            text: text.to_string(),
        })
        .await;
        self.set_status(AgentStatus::Processing);

        let sentiment = match self.language.analyze_sentiment(text).await {
            Ok(sentiment) => Some(format!("sentiment: {}", sentiment)),
            Err(e) => {
                debug!("Sentiment analysis failed: {}", e);
                None
            }
        };
        self.history.push_user(text, sentiment);

        let intent = self.classifier.classify(text).await;
        self.intent_stats.record(intent.intent_type);
        info!(
            "Intent classified: {} (confidence {:.2}, pattern {:?})",
            intent.intent_type, intent.confidence, intent.pattern
        );

        let result = match self.run_workflow(&intent).await {
            Ok(result) => result,
            Err(e) => {
                let reply = self.record_fault(&PipelineError::from(e));
                return CommandOutcome {
                    reply: reply.clone(),
                    success: false,
                    intent,
                    result: None,
                    fault: Some(reply),
                };
            }
        };

        self.history
            .push_agent(result.message.clone(), Some(result.metadata.clone()));
        let fault = match self.save_preferences().await {
            Ok(()) => {
                self.set_status(AgentStatus::Ready);
                None
            }
            Err(e) => Some(self.record_fault(&PipelineError::from(e))),
        };

        CommandOutcome {
            reply: result.message.clone(),
            success: result.success,
            intent,
            result: Some(result),
            fault,
        }
    }

    async fn run_workflow(&mut self, intent: &Intent) -> Result<WorkflowResult, RegistryError> {
        let steps = self.planner.plan(intent);
        debug!("Planned {} steps for {}", steps.len(), intent.intent_type);

        let context = self.preferences.context(self.history.turns());
        let workflow = Workflow::new(intent.intent_type, steps, context);
        let mut result = self.executor.execute(&workflow).await?;

        if result.success {
            result.message = self.translate_reply(result.message).await;
            if let Some(pattern) = &intent.pattern {
                let count = self.preferences.record_pattern(pattern);
                debug!("Learning counter {} = {}", pattern, count);
            }
        }

        Ok(result)
    }

    /// Append an error turn and enter `ErrorOccurred`, returning the error reply
    fn record_fault(&mut self, e: &PipelineError) -> String {
        error!("Command pipeline failed: {}", e);
        let reply = format!("I encountered an error: {}", e);
        self.history
            .push_agent(reply.clone(), Some(ERROR_METADATA.to_string()));
        self.set_status(AgentStatus::ErrorOccurred);
        reply
    }

    /// Translate a reply when enabled and the user prefers another language
    async fn translate_reply(&self, reply: String) -> String {
        let language = &self.preferences.current().language;
        if !self.translate_replies || language.eq_ignore_ascii_case("en") {
            return reply;
        }

        match self.generator.translate(&reply, language).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!("Translation to {} failed, keeping original: {}", language, e);
                reply
            }
        }
    }

    async fn save_preferences(&self) -> Result<(), PersistenceError> {
        self.preferences.save().await?;
        debug!("Preferences saved under {}", self.storage_key);
        self.publish(Event::PreferencesSaved {
            storage_key: self.storage_key.clone(),
        })
        .await;
        Ok(())
    }

    fn set_status(&mut self, status: AgentStatus) {
        if self.status != status {
            debug!("Agent status {} -> {}", self.status, status);
            self.status = status;
        }
    }

    async fn publish(&self, event: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(event).await;
        }
    }

    pub fn history(&self) -> &[ConversationTurn] {
        self.history.turns()
    }

    /// The last `count` turns, oldest first
    pub fn recent_history(&self, count: usize) -> &[ConversationTurn] {
        self.history.recent(count)
    }

    /// Classification counts since the agent started
    pub fn intent_stats(&self) -> &IntentStats {
        &self.intent_stats
    }

    pub fn clear_history(&mut self) {
        info!("Clearing conversation history ({} turns)", self.history.len());
        self.history.clear();
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    pub fn preferences(&self) -> &UserPreference {
        self.preferences.current()
    }

    pub fn learning_counters(&self) -> &HashMap<String, u64> {
        &self.preferences.current().learning_counters
    }

    /// Number of workflows currently executing
    pub fn in_flight_count(&self) -> usize {
        self.executor.registry().len()
    }

    /// Change the reply style and persist it
    pub async fn set_communication_style(&mut self, style: &str) -> Result<(), PersistenceError> {
        self.preferences.set_communication_style(style);
        self.save_preferences().await
    }

    /// Change the preferred language and persist it
    pub async fn set_language(&mut self, language: &str) -> Result<(), PersistenceError> {
        self.preferences.set_language(language);
        self.save_preferences().await
    }

    /// Switch an integration on or off and persist the change
    pub async fn set_integration_enabled(
        &mut self,
        integration: Integration,
        enabled: bool,
    ) -> Result<(), PersistenceError> {
        if self.preferences.set_integration_enabled(integration, enabled) {
            info!(
                "{} integration {}",
                integration.display_name(),
                if enabled { "enabled" } else { "disabled" }
            );
        }
        self.integrations.set_enabled(integration, enabled);
        self.save_preferences().await
    }
}
