//! Intent data model

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Closed set of purposes a command can be classified into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Scheduling,
    TaskManagement,
    Communication,
    InformationRetrieval,
    General,
}

impl IntentType {
    pub const ALL: [IntentType; 5] = [
        IntentType::Scheduling,
        IntentType::TaskManagement,
        IntentType::Communication,
        IntentType::InformationRetrieval,
        IntentType::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentType::Scheduling => "scheduling",
            IntentType::TaskManagement => "task_management",
            IntentType::Communication => "communication",
            IntentType::InformationRetrieval => "information_retrieval",
            IntentType::General => "general",
        }
    }
}

impl fmt::Display for IntentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured data pulled out of a command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<DateTime<Local>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub person: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Classified purpose of a user command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub intent_type: IntentType,
    pub entities: Entities,

    /// Always within [0.0, 1.0]
    pub confidence: f64,

    /// Learning pattern tag, when a prefix rule matched
    pub pattern: Option<String>,

    /// Language reported by the language provider (informational)
    pub language: Option<String>,
}

/// Running count of classified commands per intent type
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntentStats {
    pub total: u64,
    pub distribution: HashMap<IntentType, u64>,
}

impl IntentStats {
    pub fn record(&mut self, intent_type: IntentType) {
        self.total += 1;
        *self.distribution.entry(intent_type).or_insert(0) += 1;
    }

    pub fn count(&self, intent_type: IntentType) -> u64 {
        self.distribution.get(&intent_type).copied().unwrap_or(0)
    }
}
