//! Collaborator contracts
//!
//! The engine never talks to an external service directly. Every side effect
//! goes through one of the traits below, so the command pipeline can be driven
//! by real services, the in-process adapters shipped with the engine, or test
//! doubles.

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::errors::{IntegrationError, PersistenceError, ProviderError};
use crate::types::{
    CalendarEvent, Contact, Headline, Integration, NamedEntity, PersonalizationContext,
    PreferenceRecord, Reminder, Sentiment, WeatherReport,
};

/// Language capabilities: detection, tagging, date parsing, sentiment
#[async_trait]
pub trait LanguageProvider: Send + Sync {
    /// Detect the language of `text`, returning an ISO 639-1 code
    async fn detect_language(&self, text: &str) -> Result<String, ProviderError>;

    /// Tag named entities in `text`, in order of appearance
    async fn extract_named_entities(&self, text: &str) -> Result<Vec<NamedEntity>, ProviderError>;

    /// Find the first date/time expression in `text`
    async fn detect_date_time(&self, text: &str)
        -> Result<Option<DateTime<Local>>, ProviderError>;

    /// Score the overall sentiment of `text`
    async fn analyze_sentiment(&self, text: &str) -> Result<Sentiment, ProviderError>;
}

/// Generative-reply provider
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "ollama")
    fn name(&self) -> &str;

    /// Generate a reply for `prompt`, shaped by the personalization context
    async fn generate(
        &self,
        prompt: &str,
        context: &PersonalizationContext,
    ) -> Result<String, ProviderError>;

    /// Ask the provider for a free-form intent label
    async fn classify_intent(&self, text: &str) -> Result<String, ProviderError>;

    /// Summarize `text` to at most `max_length` characters
    async fn summarize(&self, text: &str, max_length: usize) -> Result<String, ProviderError>;

    /// Translate `text` into `target_language`
    async fn translate(&self, text: &str, target_language: &str)
        -> Result<String, ProviderError>;
}

/// Integration provider, one capability per external system.
///
/// Every method checks that its integration is enabled and fails with
/// `IntegrationError::NotEnabled` otherwise. The enabled set is driven by the
/// agent from the stored preferences through [`set_enabled`](Self::set_enabled).
#[async_trait]
pub trait IntegrationProvider: Send + Sync {
    /// Switch an integration on or off
    fn set_enabled(&self, integration: Integration, enabled: bool);

    async fn create_calendar_event(
        &self,
        title: &str,
        start: DateTime<Local>,
        duration_mins: i64,
    ) -> Result<bool, IntegrationError>;

    async fn list_upcoming_events(&self, days: u32) -> Result<Vec<CalendarEvent>, IntegrationError>;

    async fn create_reminder(
        &self,
        title: &str,
        due: Option<DateTime<Local>>,
        notes: Option<&str>,
    ) -> Result<bool, IntegrationError>;

    async fn list_incomplete_reminders(&self) -> Result<Vec<Reminder>, IntegrationError>;

    async fn find_contact(&self, name: &str) -> Result<Option<Contact>, IntegrationError>;

    async fn fetch_weather(&self, location: &str) -> Result<WeatherReport, IntegrationError>;

    async fn fetch_news_headlines(&self) -> Result<Vec<Headline>, IntegrationError>;
}

/// Preference persistence keyed by a fixed storage identifier
#[async_trait]
pub trait PreferencePersistence: Send + Sync {
    /// Load the stored record.
    ///
    /// Implementations return `Ok(None)` both when nothing was stored and
    /// when the stored payload cannot be decoded.
    async fn load(&self) -> Result<Option<PreferenceRecord>, PersistenceError>;

    /// Store the record, replacing any previous one
    async fn save(&self, record: &PreferenceRecord) -> Result<(), PersistenceError>;
}
