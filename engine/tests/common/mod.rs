//! Test doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use concierge_engine::agent::{AgentCore, Collaborators, PreferenceStore, UserPreference};
use concierge_engine::config::Config;
use sdk::collaborators::{
    GenerativeProvider, IntegrationProvider, LanguageProvider, PreferencePersistence,
};
use sdk::errors::{IntegrationError, PersistenceError, ProviderError};
use sdk::types::{
    CalendarEvent, Contact, Headline, Integration, NamedEntity, PersonalizationContext,
    PreferenceRecord, Reminder, Sentiment, WeatherReport,
};

/// Language provider returning canned answers
#[derive(Default)]
pub struct ScriptedLanguage {
    pub entities: Vec<NamedEntity>,
    pub datetime: Option<DateTime<Local>>,
    pub sentiment: Option<Sentiment>,
    pub fail: bool,
}

impl ScriptedLanguage {
    pub fn with_datetime(datetime: DateTime<Local>) -> Self {
        Self {
            datetime: Some(datetime),
            ..Default::default()
        }
    }

    fn check(&self) -> Result<(), ProviderError> {
        if self.fail {
            Err(ProviderError::Unavailable("scripted failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LanguageProvider for ScriptedLanguage {
    async fn detect_language(&self, _text: &str) -> Result<String, ProviderError> {
        self.check()?;
        Ok("en".to_string())
    }

    async fn extract_named_entities(&self, _text: &str) -> Result<Vec<NamedEntity>, ProviderError> {
        self.check()?;
        Ok(self.entities.clone())
    }

    async fn detect_date_time(
        &self,
        _text: &str,
    ) -> Result<Option<DateTime<Local>>, ProviderError> {
        self.check()?;
        Ok(self.datetime)
    }

    async fn analyze_sentiment(&self, _text: &str) -> Result<Sentiment, ProviderError> {
        self.check()?;
        self.sentiment
            .ok_or_else(|| ProviderError::InvalidResponse("no sentiment scripted".to_string()))
    }
}

/// Integration double with a fixed calendar of three upcoming events
pub struct MockIntegrations {
    enabled: Mutex<BTreeSet<Integration>>,
    calls: Mutex<Vec<String>>,
    created_events: AtomicUsize,
}

impl MockIntegrations {
    pub fn all_enabled() -> Self {
        Self {
            enabled: Mutex::new(Integration::ALL.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
            created_events: AtomicUsize::new(0),
        }
    }

    pub fn is_enabled(&self, integration: Integration) -> bool {
        self.enabled.lock().unwrap().contains(&integration)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn created_events(&self) -> usize {
        self.created_events.load(Ordering::SeqCst)
    }

    fn call(&self, integration: Integration, name: &str) -> Result<(), IntegrationError> {
        self.calls.lock().unwrap().push(name.to_string());
        if self.enabled.lock().unwrap().contains(&integration) {
            Ok(())
        } else {
            Err(IntegrationError::NotEnabled(
                integration.display_name().to_string(),
            ))
        }
    }
}

#[async_trait]
impl IntegrationProvider for MockIntegrations {
    fn set_enabled(&self, integration: Integration, enabled: bool) {
        let mut set = self.enabled.lock().unwrap();
        if enabled {
            set.insert(integration);
        } else {
            set.remove(&integration);
        }
    }

    async fn create_calendar_event(
        &self,
        _title: &str,
        _start: DateTime<Local>,
        _duration_mins: i64,
    ) -> Result<bool, IntegrationError> {
        self.call(Integration::Calendar, "create_calendar_event")?;
        self.created_events.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn list_upcoming_events(&self, days: u32) -> Result<Vec<CalendarEvent>, IntegrationError> {
        self.call(Integration::Calendar, "list_upcoming_events")?;
        let now = Local::now();
        Ok((1..=3)
            .map(|i| CalendarEvent {
                title: format!("event {}", i),
                start: now + Duration::hours(i * 24 * i64::from(days) / 4),
                duration_mins: 30,
            })
            .collect())
    }

    async fn create_reminder(
        &self,
        title: &str,
        _due: Option<DateTime<Local>>,
        _notes: Option<&str>,
    ) -> Result<bool, IntegrationError> {
        self.call(Integration::Reminders, "create_reminder")?;
        Ok(!title.is_empty())
    }

    async fn list_incomplete_reminders(&self) -> Result<Vec<Reminder>, IntegrationError> {
        self.call(Integration::Reminders, "list_incomplete_reminders")?;
        Ok(Vec::new())
    }

    async fn find_contact(&self, name: &str) -> Result<Option<Contact>, IntegrationError> {
        self.call(Integration::Contacts, "find_contact")?;
        Ok(name.eq_ignore_ascii_case("john").then(|| Contact {
            name: "John Smith".to_string(),
            phone: Some("555-0100".to_string()),
            email: None,
        }))
    }

    async fn fetch_weather(&self, _location: &str) -> Result<WeatherReport, IntegrationError> {
        self.call(Integration::Weather, "fetch_weather")?;
        Ok(WeatherReport {
            temperature: 72.0,
            condition: "Sunny".to_string(),
        })
    }

    async fn fetch_news_headlines(&self) -> Result<Vec<Headline>, IntegrationError> {
        self.call(Integration::News, "fetch_news_headlines")?;
        Ok(vec![Headline {
            title: "Markets rally".to_string(),
            source: "Wire".to_string(),
        }])
    }
}

/// Generator that echoes its prompt and records every prompt it saw
#[derive(Default)]
pub struct EchoGenerator {
    pub prompts: Mutex<Vec<String>>,
    pub fail_translation: bool,
}

#[async_trait]
impl GenerativeProvider for EchoGenerator {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(
        &self,
        prompt: &str,
        _context: &PersonalizationContext,
    ) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(format!("echo: {}", prompt))
    }

    async fn classify_intent(&self, _text: &str) -> Result<String, ProviderError> {
        Ok("general".to_string())
    }

    async fn summarize(&self, text: &str, max_length: usize) -> Result<String, ProviderError> {
        Ok(text.chars().take(max_length).collect())
    }

    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ProviderError> {
        if self.fail_translation {
            return Err(ProviderError::Timeout);
        }
        Ok(format!("[{}] {}", target_language, text))
    }
}

/// Persistence double kept in memory
#[derive(Default)]
pub struct MemoryPersistence {
    pub record: Mutex<Option<PreferenceRecord>>,
    pub fail_save: AtomicBool,
    pub saves: AtomicUsize,
}

impl MemoryPersistence {
    pub fn stored(&self) -> Option<PreferenceRecord> {
        self.record.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PreferencePersistence for MemoryPersistence {
    async fn load(&self) -> Result<Option<PreferenceRecord>, PersistenceError> {
        Ok(self.stored())
    }

    async fn save(&self, record: &PreferenceRecord) -> Result<(), PersistenceError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(PersistenceError::Database("disk full".to_string()));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.record.lock().unwrap() = Some(record.clone());
        Ok(())
    }
}

/// Defaults for a fresh preference record
pub fn default_preferences(style: &str) -> UserPreference {
    UserPreference::new(
        "en",
        style,
        Integration::ALL.iter().map(|i| i.as_str().to_string()),
    )
}

/// Defaults with some integrations switched off
pub fn preferences_without(style: &str, disabled: &[Integration]) -> UserPreference {
    UserPreference::new(
        "en",
        style,
        Integration::ALL
            .iter()
            .filter(|i| !disabled.contains(*i))
            .map(|i| i.as_str().to_string()),
    )
}

/// Build an agent over the given doubles with the default configuration
pub async fn agent_with(
    language: Arc<dyn LanguageProvider>,
    generator: Arc<dyn GenerativeProvider>,
    integrations: Arc<dyn IntegrationProvider>,
    persistence: Arc<MemoryPersistence>,
    style: &str,
) -> AgentCore {
    agent_with_config(
        &Config::default_config(),
        language,
        generator,
        integrations,
        persistence,
        style,
    )
    .await
}

pub async fn agent_with_config(
    config: &Config,
    language: Arc<dyn LanguageProvider>,
    generator: Arc<dyn GenerativeProvider>,
    integrations: Arc<dyn IntegrationProvider>,
    persistence: Arc<MemoryPersistence>,
    style: &str,
) -> AgentCore {
    agent_with_preferences(
        config,
        language,
        generator,
        integrations,
        persistence,
        default_preferences(style),
    )
    .await
}

pub async fn agent_with_preferences(
    config: &Config,
    language: Arc<dyn LanguageProvider>,
    generator: Arc<dyn GenerativeProvider>,
    integrations: Arc<dyn IntegrationProvider>,
    persistence: Arc<MemoryPersistence>,
    defaults: UserPreference,
) -> AgentCore {
    let store = PreferenceStore::load(persistence, defaults).await;
    AgentCore::new(
        config,
        Collaborators {
            language,
            generator,
            integrations,
        },
        store,
    )
    .unwrap()
}
