//! Local integrations
//!
//! An in-process [`IntegrationProvider`]: calendar events and reminders are
//! kept in memory for the life of the process, contacts, weather and news
//! come from the `[integrations]` config section. Every operation first
//! checks that its integration is switched on. Nothing is on until the agent
//! applies the stored preferences.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local};
use sdk::collaborators::IntegrationProvider;
use sdk::errors::IntegrationError;
use sdk::types::{CalendarEvent, Contact, Headline, Integration, Reminder, WeatherReport};
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, info};

use crate::config::IntegrationsConfig;

#[derive(Debug, Default)]
struct Store {
    events: Vec<CalendarEvent>,
    reminders: Vec<Reminder>,
}

/// In-memory integration provider
pub struct LocalIntegrations {
    enabled: RwLock<BTreeSet<Integration>>,
    store: Mutex<Store>,
    contacts: Vec<Contact>,
    weather: WeatherReport,
    headlines: Vec<Headline>,
}

impl LocalIntegrations {
    pub fn new(config: &IntegrationsConfig) -> Self {
        Self {
            enabled: RwLock::new(BTreeSet::new()),
            store: Mutex::new(Store::default()),
            contacts: config.contacts.clone(),
            weather: WeatherReport {
                temperature: config.weather_temperature,
                condition: config.weather_condition.clone(),
            },
            headlines: config.headlines.clone(),
        }
    }

    pub fn is_enabled(&self, integration: Integration) -> bool {
        self.enabled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&integration)
    }

    fn require(&self, integration: Integration) -> Result<(), IntegrationError> {
        if self.is_enabled(integration) {
            Ok(())
        } else {
            debug!("{} integration is disabled", integration.display_name());
            Err(IntegrationError::NotEnabled(
                integration.display_name().to_string(),
            ))
        }
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl IntegrationProvider for LocalIntegrations {
    fn set_enabled(&self, integration: Integration, enabled: bool) {
        let mut set = self.enabled.write().unwrap_or_else(PoisonError::into_inner);
        let changed = if enabled {
            set.insert(integration)
        } else {
            set.remove(&integration)
        };
        if changed {
            debug!(
                "{} integration {}",
                integration.display_name(),
                if enabled { "on" } else { "off" }
            );
        }
    }

    async fn create_calendar_event(
        &self,
        title: &str,
        start: DateTime<Local>,
        duration_mins: i64,
    ) -> Result<bool, IntegrationError> {
        self.require(Integration::Calendar)?;
        if title.trim().is_empty() || duration_mins <= 0 {
            return Ok(false);
        }

        self.store().events.push(CalendarEvent {
            title: title.to_string(),
            start,
            duration_mins,
        });
        info!("Calendar event created: {} at {}", title, start);
        Ok(true)
    }

    async fn list_upcoming_events(&self, days: u32) -> Result<Vec<CalendarEvent>, IntegrationError> {
        self.require(Integration::Calendar)?;

        let now = Local::now();
        let horizon = now + Duration::days(i64::from(days));
        let mut events: Vec<CalendarEvent> = self
            .store()
            .events
            .iter()
            .filter(|e| e.end() >= now && e.start <= horizon)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.start);
        Ok(events)
    }

    async fn create_reminder(
        &self,
        title: &str,
        due: Option<DateTime<Local>>,
        notes: Option<&str>,
    ) -> Result<bool, IntegrationError> {
        self.require(Integration::Reminders)?;
        if title.trim().is_empty() {
            return Ok(false);
        }

        self.store().reminders.push(Reminder {
            title: title.to_string(),
            due,
            notes: notes.map(str::to_string),
            completed: false,
        });
        info!("Reminder created: {}", title);
        Ok(true)
    }

    async fn list_incomplete_reminders(&self) -> Result<Vec<Reminder>, IntegrationError> {
        self.require(Integration::Reminders)?;
        Ok(self
            .store()
            .reminders
            .iter()
            .filter(|r| !r.completed)
            .cloned()
            .collect())
    }

    async fn find_contact(&self, name: &str) -> Result<Option<Contact>, IntegrationError> {
        self.require(Integration::Contacts)?;
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(None);
        }
        Ok(self
            .contacts
            .iter()
            .find(|c| c.name.to_lowercase().contains(&needle))
            .cloned())
    }

    async fn fetch_weather(&self, location: &str) -> Result<WeatherReport, IntegrationError> {
        self.require(Integration::Weather)?;
        debug!("Weather requested for {}", location);
        Ok(self.weather.clone())
    }

    async fn fetch_news_headlines(&self) -> Result<Vec<Headline>, IntegrationError> {
        self.require(Integration::News)?;
        Ok(self.headlines.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> IntegrationsConfig {
        IntegrationsConfig {
            contacts: vec![Contact {
                name: "John Smith".to_string(),
                phone: Some("555-0100".to_string()),
                email: None,
            }],
            headlines: vec![Headline {
                title: "Local team wins".to_string(),
                source: "Daily".to_string(),
            }],
            ..Default::default()
        }
    }

    fn all_enabled() -> LocalIntegrations {
        let integrations = LocalIntegrations::new(&config());
        for integration in Integration::ALL {
            integrations.set_enabled(integration, true);
        }
        integrations
    }

    #[tokio::test]
    async fn test_disabled_integration_rejected() {
        let integrations = LocalIntegrations::new(&config());
        integrations.set_enabled(Integration::Weather, true);

        let err = integrations
            .create_calendar_event("x", Local::now(), 30)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Calendar integration is not enabled");
        assert!(integrations.fetch_weather("here").await.is_ok());
    }

    #[test]
    fn test_nothing_enabled_until_applied() {
        let integrations = LocalIntegrations::new(&config());
        assert!(Integration::ALL.iter().all(|i| !integrations.is_enabled(*i)));
    }

    #[tokio::test]
    async fn test_toggle_at_runtime() {
        let integrations = all_enabled();
        integrations.set_enabled(Integration::News, false);
        assert!(integrations.fetch_news_headlines().await.is_err());

        integrations.set_enabled(Integration::News, true);
        assert_eq!(integrations.fetch_news_headlines().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upcoming_events_window() {
        let integrations = all_enabled();
        let now = Local::now();

        integrations
            .create_calendar_event("soon", now + Duration::hours(2), 60)
            .await
            .unwrap();
        integrations
            .create_calendar_event("later", now + Duration::days(30), 60)
            .await
            .unwrap();
        integrations
            .create_calendar_event("past", now - Duration::days(2), 60)
            .await
            .unwrap();

        let upcoming = integrations.list_upcoming_events(7).await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].title, "soon");
    }

    #[tokio::test]
    async fn test_reminders() {
        let integrations = all_enabled();
        assert!(integrations
            .create_reminder("call John", None, Some("about lunch"))
            .await
            .unwrap());
        assert!(!integrations.create_reminder("  ", None, None).await.unwrap());

        let open = integrations.list_incomplete_reminders().await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].notes.as_deref(), Some("about lunch"));
    }

    #[tokio::test]
    async fn test_contact_lookup_is_case_insensitive() {
        let integrations = all_enabled();
        let found = integrations.find_contact("john").await.unwrap();
        assert_eq!(found.map(|c| c.name), Some("John Smith".to_string()));
        assert!(integrations.find_contact("Alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_weather_from_config() {
        let report = all_enabled().fetch_weather("current location").await.unwrap();
        assert_eq!(report.condition, "Sunny");
        assert_eq!(report.temperature, 72.0);
    }
}
