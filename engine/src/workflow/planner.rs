//! Workflow Planner
//!
//! Maps an [`Intent`] to its ordered step list. Planning has no side effects
//! and never fails; an intent without enough data may produce an empty plan.

use super::types::Step;
use crate::intent::{Intent, IntentType};

const DEFAULT_EVENT_TITLE: &str = "New Event";
const DEFAULT_TASK_TITLE: &str = "New Task";
const DEFAULT_QUERY: &str = "general information";
const DEFAULT_PROMPT: &str = "Help me with this request";
const DEFAULT_EVENT_DURATION_MINS: i64 = 60;

#[derive(Debug, Clone)]
pub struct WorkflowPlanner {
    event_duration_mins: i64,
}

impl WorkflowPlanner {
    pub fn new(event_duration_mins: i64) -> Self {
        Self {
            event_duration_mins,
        }
    }

    /// Plan the steps for an intent
    pub fn plan(&self, intent: &Intent) -> Vec<Step> {
        let entities = &intent.entities;

        match intent.intent_type {
            IntentType::Scheduling => {
                let mut steps = Vec::with_capacity(2);
                if let Some(when) = entities.datetime {
                    steps.push(Step::CreateCalendarEvent {
                        title: entities
                            .title
                            .clone()
                            .unwrap_or_else(|| DEFAULT_EVENT_TITLE.to_string()),
                        when,
                        duration_mins: self.event_duration_mins,
                    });
                }
                steps.push(Step::ListUpcomingEvents);
                steps
            }
            IntentType::TaskManagement => vec![Step::CreateReminder {
                title: entities
                    .title
                    .clone()
                    .unwrap_or_else(|| DEFAULT_TASK_TITLE.to_string()),
                due: entities.datetime,
            }],
            IntentType::Communication => entities
                .person
                .iter()
                .map(|name| Step::FindContact { name: name.clone() })
                .collect(),
            IntentType::InformationRetrieval => vec![Step::FetchInformation {
                query: entities
                    .query
                    .clone()
                    .unwrap_or_else(|| DEFAULT_QUERY.to_string()),
                location: entities.location.clone(),
            }],
            IntentType::General => vec![Step::GenerateReply {
                prompt: entities
                    .prompt
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
            }],
        }
    }
}

impl Default for WorkflowPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_DURATION_MINS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Entities;
    use chrono::{Local, TimeZone};

    fn intent(intent_type: IntentType, entities: Entities) -> Intent {
        Intent {
            intent_type,
            entities,
            confidence: 1.0,
            pattern: None,
            language: None,
        }
    }

    #[test]
    fn test_scheduling_with_datetime_plans_two_steps() {
        let when = Local.with_ymd_and_hms(2030, 1, 2, 14, 0, 0).unwrap();
        let steps = WorkflowPlanner::default().plan(&intent(
            IntentType::Scheduling,
            Entities {
                title: Some("team meeting".to_string()),
                datetime: Some(when),
                ..Default::default()
            },
        ));

        assert_eq!(
            steps,
            vec![
                Step::CreateCalendarEvent {
                    title: "team meeting".to_string(),
                    when,
                    duration_mins: 60,
                },
                Step::ListUpcomingEvents,
            ]
        );
    }

    #[test]
    fn test_scheduling_without_datetime_only_lists() {
        let steps = WorkflowPlanner::default().plan(&intent(IntentType::Scheduling, Entities::default()));
        assert_eq!(steps, vec![Step::ListUpcomingEvents]);
    }

    #[test]
    fn test_defaults_fill_missing_entities() {
        let planner = WorkflowPlanner::new(30);

        assert_eq!(
            planner.plan(&intent(IntentType::TaskManagement, Entities::default())),
            vec![Step::CreateReminder {
                title: "New Task".to_string(),
                due: None,
            }]
        );
        assert_eq!(
            planner.plan(&intent(IntentType::InformationRetrieval, Entities::default())),
            vec![Step::FetchInformation {
                query: "general information".to_string(),
                location: None,
            }]
        );
        assert_eq!(
            planner.plan(&intent(IntentType::General, Entities::default())),
            vec![Step::GenerateReply {
                prompt: "Help me with this request".to_string(),
            }]
        );
    }

    #[test]
    fn test_communication_needs_a_person() {
        let planner = WorkflowPlanner::default();

        assert!(planner
            .plan(&intent(IntentType::Communication, Entities::default()))
            .is_empty());
        assert_eq!(
            planner.plan(&intent(
                IntentType::Communication,
                Entities {
                    person: Some("John".to_string()),
                    ..Default::default()
                },
            )),
            vec![Step::FindContact {
                name: "John".to_string()
            }]
        );
    }

    #[test]
    fn test_event_duration_comes_from_planner() {
        let when = Local.with_ymd_and_hms(2030, 1, 2, 9, 30, 0).unwrap();
        let steps = WorkflowPlanner::new(15).plan(&intent(
            IntentType::Scheduling,
            Entities {
                datetime: Some(when),
                ..Default::default()
            },
        ));

        assert!(matches!(
            &steps[0],
            Step::CreateCalendarEvent { title, duration_mins: 15, .. } if title == "New Event"
        ));
    }
}
