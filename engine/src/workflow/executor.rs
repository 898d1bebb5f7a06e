//! Workflow Executor
//!
//! Runs a workflow's steps one after another against the collaborators,
//! turning each collaborator result into a short human-readable fragment.
//!
//! Execution is all-or-nothing: the first failing step stops the workflow
//! and the fragments gathered so far are discarded. The workflow stays in
//! the in-flight registry for exactly as long as it runs.

use sdk::collaborators::{GenerativeProvider, IntegrationProvider};
use sdk::types::PersonalizationContext;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::registry::{RegistryError, WorkflowRegistry};
use super::types::{Step, StepError, Workflow, WorkflowError, WorkflowResult, WorkflowState};
use crate::message_bus::{Event, MessageBus};
use crate::response::{CommunicationStyle, ResponseComposer};

const DEFAULT_WEATHER_LOCATION: &str = "current location";

/// Executes planned workflows
pub struct WorkflowExecutor {
    integrations: Arc<dyn IntegrationProvider>,
    generator: Arc<dyn GenerativeProvider>,
    registry: WorkflowRegistry,
    composer: ResponseComposer,
    upcoming_days: u32,
    bus: Option<Arc<MessageBus>>,
}

impl WorkflowExecutor {
    pub fn new(
        integrations: Arc<dyn IntegrationProvider>,
        generator: Arc<dyn GenerativeProvider>,
        registry: WorkflowRegistry,
        upcoming_days: u32,
    ) -> Self {
        Self {
            integrations,
            generator,
            registry,
            composer: ResponseComposer::new(),
            upcoming_days,
            bus: None,
        }
    }

    /// Publish lifecycle events on `bus`
    pub fn with_bus(mut self, bus: Arc<MessageBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn registry(&self) -> &WorkflowRegistry {
        &self.registry
    }

    /// Execute a workflow.
    ///
    /// Step failures are reported inside the returned [`WorkflowResult`];
    /// the only error is a workflow id that is already running.
    pub async fn execute(&self, workflow: &Workflow) -> Result<WorkflowResult, RegistryError> {
        let _guard = self.registry.register(workflow)?;

        info!(
            "Workflow {} started: {} with {} steps",
            workflow.id,
            workflow.intent_type,
            workflow.steps.len()
        );
        self.publish(Event::WorkflowStarted {
            workflow_id: workflow.id.clone(),
            intent: workflow.intent_type.to_string(),
            steps: workflow.steps.len(),
        })
        .await;

        let result = match self.run_steps(workflow).await {
            Ok(fragments) => {
                let style = CommunicationStyle::from_style(&workflow.context.communication_style);
                let message = self
                    .composer
                    .compose(&fragments, workflow.intent_type, style);
                info!("Workflow {} completed", workflow.id);
                self.publish(Event::WorkflowCompleted {
                    workflow_id: workflow.id.clone(),
                    message: message.clone(),
                })
                .await;
                WorkflowResult::completed(workflow.id.clone(), message, fragments)
            }
            Err(e) => {
                warn!("Workflow {} failed: {}", workflow.id, e);
                self.publish(Event::WorkflowFailed {
                    workflow_id: workflow.id.clone(),
                    error: e.to_string(),
                })
                .await;
                WorkflowResult::failed(workflow.id.clone(), e)
            }
        };

        Ok(result)
    }

    async fn run_steps(&self, workflow: &Workflow) -> Result<Vec<String>, WorkflowError> {
        let mut state = WorkflowState::Created;
        debug!("Workflow {} -> {:?}", workflow.id, state);

        if workflow.steps.is_empty() {
            state = WorkflowState::Failed;
            debug!("Workflow {} -> {:?}", workflow.id, state);
            return Err(WorkflowError::EmptyPlan);
        }

        let mut fragments = Vec::with_capacity(workflow.steps.len());
        for (index, step) in workflow.steps.iter().enumerate() {
            state = WorkflowState::Running(index);
            debug!("Workflow {} -> {:?} ({})", workflow.id, state, step);

            match self.run_step(step, &workflow.context).await {
                Ok(fragment) => fragments.push(fragment),
                Err(source) => {
                    state = WorkflowState::Failed;
                    debug!("Workflow {} -> {:?}", workflow.id, state);
                    return Err(WorkflowError::StepFailed {
                        step: step.name(),
                        source,
                    });
                }
            }
        }

        state = WorkflowState::Completed;
        debug!("Workflow {} -> {:?}", workflow.id, state);
        Ok(fragments)
    }

    /// Run one step through exactly one collaborator call
    async fn run_step(
        &self,
        step: &Step,
        context: &PersonalizationContext,
    ) -> Result<String, StepError> {
        match step {
            Step::CreateCalendarEvent {
                title,
                when,
                duration_mins,
            } => {
                let created = self
                    .integrations
                    .create_calendar_event(title, *when, *duration_mins)
                    .await?;
                Ok(if created {
                    format!("Created calendar event: {}", title)
                } else {
                    "Failed to create event".to_string()
                })
            }
            Step::ListUpcomingEvents => {
                let events = self
                    .integrations
                    .list_upcoming_events(self.upcoming_days)
                    .await?;
                let noun = if events.len() == 1 { "event" } else { "events" };
                Ok(format!("Found {} upcoming {}", events.len(), noun))
            }
            Step::CreateReminder { title, due } => {
                let created = self.integrations.create_reminder(title, *due, None).await?;
                Ok(if created {
                    format!("Created reminder: {}", title)
                } else {
                    "Failed to create reminder".to_string()
                })
            }
            Step::FetchInformation { query, location } => {
                self.fetch_information(query, location.as_deref(), context)
                    .await
            }
            Step::FindContact { name } => {
                let contact = self.integrations.find_contact(name).await?;
                Ok(match contact {
                    Some(contact) => {
                        let mut fragment = format!("Found contact: {}", contact.name);
                        if let Some(phone) = &contact.phone {
                            fragment.push_str(&format!(" ({})", phone));
                        } else if let Some(email) = &contact.email {
                            fragment.push_str(&format!(" <{}>", email));
                        }
                        fragment
                    }
                    None => format!("No contact found for {}", name),
                })
            }
            Step::GenerateReply { prompt } => Ok(self.generator.generate(prompt, context).await?),
        }
    }

    async fn fetch_information(
        &self,
        query: &str,
        location: Option<&str>,
        context: &PersonalizationContext,
    ) -> Result<String, StepError> {
        let lowered = query.to_lowercase();

        if lowered.contains("weather") {
            let report = self
                .integrations
                .fetch_weather(location.unwrap_or(DEFAULT_WEATHER_LOCATION))
                .await?;
            return Ok(format!(
                "The weather is {} with a temperature of {}°F",
                report.condition, report.temperature
            ));
        }

        if lowered.contains("news") || lowered.contains("headline") {
            let headlines = self.integrations.fetch_news_headlines().await?;
            if headlines.is_empty() {
                return Ok("No headlines available right now".to_string());
            }
            let mut fragment = "Here are the latest headlines:".to_string();
            for headline in headlines {
                fragment.push_str(&format!("\n• {} ({})", headline.title, headline.source));
            }
            return Ok(fragment);
        }

        Ok(self.generator.generate(query, context).await?)
    }

    async fn publish(&self, event: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(event).await;
        }
    }
}
