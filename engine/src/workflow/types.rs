//! Workflow data model

use chrono::{DateTime, Local};
use sdk::errors::{ConciergeErrorExt, IntegrationError, ProviderError};
use sdk::types::PersonalizationContext;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::intent::IntentType;

/// A single action against one collaborator. Immutable once planned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    CreateCalendarEvent {
        title: String,
        when: DateTime<Local>,
        duration_mins: i64,
    },
    CreateReminder {
        title: String,
        due: Option<DateTime<Local>>,
    },
    FetchInformation {
        query: String,
        location: Option<String>,
    },
    GenerateReply {
        prompt: String,
    },
    FindContact {
        name: String,
    },
    ListUpcomingEvents,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::CreateCalendarEvent { .. } => "create_calendar_event",
            Step::CreateReminder { .. } => "create_reminder",
            Step::FetchInformation { .. } => "fetch_information",
            Step::GenerateReply { .. } => "generate_reply",
            Step::FindContact { .. } => "find_contact",
            Step::ListUpcomingEvents => "list_upcoming_events",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One command's planned steps plus the context they run under
#[derive(Debug, Clone)]
pub struct Workflow {
    pub id: String,
    pub intent_type: IntentType,
    pub steps: Vec<Step>,
    pub context: PersonalizationContext,
}

impl Workflow {
    /// Create a workflow with a fresh unique id
    pub fn new(intent_type: IntentType, steps: Vec<Step>, context: PersonalizationContext) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            intent_type,
            steps,
            context,
        }
    }
}

/// Execution state, traced as a workflow runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Created,
    Running(usize),
    Completed,
    Failed,
}

/// Failure of a single step's collaborator call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepError {
    #[error(transparent)]
    Integration(#[from] IntegrationError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Why a workflow did not complete
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("{source}")]
    StepFailed {
        step: &'static str,
        #[source]
        source: StepError,
    },

    #[error("no actionable steps for this request")]
    EmptyPlan,
}

impl ConciergeErrorExt for WorkflowError {
    fn user_hint(&self) -> &str {
        match self {
            Self::StepFailed {
                source: StepError::Integration(e),
                ..
            } => e.user_hint(),
            Self::StepFailed {
                source: StepError::Provider(e),
                ..
            } => e.user_hint(),
            Self::EmptyPlan => "Try rephrasing the request with more detail",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::StepFailed {
                source: StepError::Integration(e),
                ..
            } => e.is_recoverable(),
            Self::StepFailed {
                source: StepError::Provider(e),
                ..
            } => e.is_recoverable(),
            Self::EmptyPlan => true,
        }
    }
}

/// Outcome of executing a workflow
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowResult {
    pub workflow_id: String,
    pub success: bool,
    pub message: String,
    pub metadata: String,

    /// One fragment per step, only on success
    pub fragments: Vec<String>,

    pub error: Option<WorkflowError>,
}

impl WorkflowResult {
    pub fn completed(workflow_id: impl Into<String>, message: String, fragments: Vec<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            success: true,
            message,
            metadata: format!("{} steps completed", fragments.len()),
            fragments,
            error: None,
        }
    }

    pub fn failed(workflow_id: impl Into<String>, error: WorkflowError) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            success: false,
            message: format!("Failed to complete workflow: {}", error),
            metadata: "Error".to_string(),
            fragments: Vec::new(),
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_failure_displays_underlying_error() {
        let err = WorkflowError::StepFailed {
            step: "create_calendar_event",
            source: IntegrationError::NotEnabled("Calendar".to_string()).into(),
        };
        assert_eq!(err.to_string(), "Calendar integration is not enabled");

        let result = WorkflowResult::failed("wf", err);
        assert_eq!(
            result.message,
            "Failed to complete workflow: Calendar integration is not enabled"
        );
        assert_eq!(result.metadata, "Error");
        assert!(result.fragments.is_empty());
        assert!(!result.success);
    }

    #[test]
    fn test_completed_metadata_counts_steps() {
        let result = WorkflowResult::completed(
            "wf",
            "Done!".to_string(),
            vec!["a".to_string(), "b".to_string()],
        );
        assert!(result.success);
        assert_eq!(result.metadata, "2 steps completed");
        assert!(result.error.is_none());
    }

    #[test]
    fn test_workflow_ids_are_unique() {
        let a = Workflow::new(IntentType::General, vec![], PersonalizationContext::default());
        let b = Workflow::new(IntentType::General, vec![], PersonalizationContext::default());
        assert_ne!(a.id, b.id);
    }
}
