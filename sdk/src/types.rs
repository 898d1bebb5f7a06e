//! Boundary types exchanged with collaborators

use chrono::{DateTime, Duration, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Kind of a named entity reported by the language provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Person,
    Location,
    Organization,
}

/// A single tagged span from named-entity recognition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntity {
    pub kind: EntityKind,
    pub text: String,
}

impl NamedEntity {
    pub fn new(kind: EntityKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Sentiment label from the language provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Neutral => write!(f, "neutral"),
            Sentiment::Negative => write!(f, "negative"),
        }
    }
}

/// External systems the integration provider can talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Integration {
    Calendar,
    Reminders,
    Contacts,
    Weather,
    News,
}

impl Integration {
    pub const ALL: [Integration; 5] = [
        Integration::Calendar,
        Integration::Reminders,
        Integration::Contacts,
        Integration::Weather,
        Integration::News,
    ];

    /// Stable identifier used in configuration and preference records
    pub fn as_str(&self) -> &'static str {
        match self {
            Integration::Calendar => "calendar",
            Integration::Reminders => "reminders",
            Integration::Contacts => "contacts",
            Integration::Weather => "weather",
            Integration::News => "news",
        }
    }

    /// Human-readable service name used in error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Integration::Calendar => "Calendar",
            Integration::Reminders => "Reminders",
            Integration::Contacts => "Contacts",
            Integration::Weather => "Weather",
            Integration::News => "News",
        }
    }
}

impl fmt::Display for Integration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Integration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Integration::ALL
            .into_iter()
            .find(|i| i.as_str() == key)
            .ok_or_else(|| {
                format!(
                    "Unknown integration '{}'. Must be one of: calendar, reminders, contacts, weather, news",
                    s
                )
            })
    }
}

/// Calendar event as returned by `list_upcoming_events`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    pub start: DateTime<Local>,
    pub duration_mins: i64,
}

impl CalendarEvent {
    pub fn end(&self) -> DateTime<Local> {
        self.start + Duration::minutes(self.duration_mins)
    }
}

/// Reminder as returned by `list_incomplete_reminders`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub title: String,
    pub due: Option<DateTime<Local>>,
    pub notes: Option<String>,
    pub completed: bool,
}

/// Address-book entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Current conditions from the weather service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Temperature in degrees Fahrenheit
    pub temperature: f64,
    pub condition: String,
}

/// A single news headline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub source: String,
}

/// Durable part of the user's preferences.
///
/// Learning counters are intentionally absent: only these three fields are
/// written to and read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub preferred_language: String,
    pub preferred_communication_style: String,
    #[serde(default)]
    pub enabled_integrations: Vec<String>,
}

/// One entry of the conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: String,
    pub content: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

impl ConversationTurn {
    /// Create a turn authored by the user
    pub fn user(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            is_user: true,
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    /// Create a turn authored by the agent
    pub fn agent(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            is_user: false,
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    /// Attach metadata to the turn
    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }
}

/// Snapshot of everything used to personalize a single response.
///
/// Rebuilt for every command; never written back.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersonalizationContext {
    pub language: String,
    pub communication_style: String,
    pub history: Vec<ConversationTurn>,
    pub learning_counters: HashMap<String, u64>,
}
