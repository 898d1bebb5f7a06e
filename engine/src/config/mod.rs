//! Configuration management
//!
//! This module handles loading, validation, and management of the Concierge
//! configuration. Configuration is stored in TOML format at
//! ~/.concierge/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level and data directory
//! - **agent**: Preference storage key, defaults, workflow tuning
//! - **integrations**: Default enabled integrations and local service data
//! - **generator**: Generative-reply provider endpoint
//! - **classifier**: Intent keyword table, pattern tags, title heuristics
//!
//! # Examples
//!
//! ```no_run
//! use concierge_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Data dir: {:?}", config.core.data_dir);
//! println!("Reply model: {}", config.generator.model);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use sdk::types::{Contact, Headline, Integration};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::intent::IntentType;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    pub core: CoreConfig,

    /// Orchestrator settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Integration settings
    #[serde(default)]
    pub integrations: IntegrationsConfig,

    /// Generative-reply provider settings
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Intent classification table
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// Orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Fixed identifier the preference record is stored under
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Language used when no preference record exists
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Communication style used when no preference record exists
    #[serde(default = "default_style")]
    pub default_style: String,

    /// Window for `ListUpcomingEvents`, in days
    #[serde(default = "default_upcoming_days")]
    pub upcoming_days: u32,

    /// Duration given to newly created calendar events, in minutes
    #[serde(default = "default_event_duration_mins")]
    pub event_duration_mins: i64,

    /// Translate replies into the preferred language when it is not English
    #[serde(default)]
    pub translate_replies: bool,

    /// Capacity of the pending command queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            default_language: default_language(),
            default_style: default_style(),
            upcoming_days: default_upcoming_days(),
            event_duration_mins: default_event_duration_mins(),
            translate_replies: false,
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Integration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationsConfig {
    /// Integrations enabled in a fresh preference record
    #[serde(default = "default_enabled_integrations")]
    pub enabled: Vec<String>,

    /// Condition reported by the local weather service
    #[serde(default = "default_weather_condition")]
    pub weather_condition: String,

    /// Temperature (°F) reported by the local weather service
    #[serde(default = "default_weather_temperature")]
    pub weather_temperature: f64,

    /// Headlines served by the local news service
    #[serde(default)]
    pub headlines: Vec<Headline>,

    /// Address book served by the local contacts service
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_integrations(),
            weather_condition: default_weather_condition(),
            weather_temperature: default_weather_temperature(),
            headlines: Vec::new(),
            contacts: Vec::new(),
        }
    }
}

/// Generative-reply provider configuration (Ollama chat API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Base URL for the Ollama API
    #[serde(default = "default_generator_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_generator_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_generator_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: default_generator_base_url(),
            model: default_generator_model(),
            timeout_secs: default_generator_timeout(),
        }
    }
}

/// One keyword rule of the classification table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRule {
    /// Intent selected when the rule matches
    pub intent: IntentType,

    /// Whole-word keywords, matched against the lower-cased input
    pub keywords: Vec<String>,

    /// Also match when a date/time entity was extracted
    #[serde(default)]
    pub match_datetime: bool,
}

/// Prefix rule producing a learning pattern tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRule {
    /// Prefix matched against the lower-cased, trimmed input
    pub prefix: String,

    /// Learning pattern tag
    pub tag: String,

    /// Intent forced when this prefix matches, ahead of the keyword rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<IntentType>,
}

/// Intent classification table.
///
/// Rules are evaluated in order and the first match wins; `General` is the
/// implicit fallback and may not appear as a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_rules")]
    pub rules: Vec<IntentRule>,

    #[serde(default = "default_patterns")]
    pub patterns: Vec<PatternRule>,

    /// Leading phrases stripped when extracting a title
    #[serde(default = "default_lead_phrases")]
    pub lead_phrases: Vec<String>,

    /// Words that end a title
    #[serde(default = "default_temporal_markers")]
    pub temporal_markers: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            patterns: default_patterns(),
            lead_phrases: default_lead_phrases(),
            temporal_markers: default_temporal_markers(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.concierge")
}

fn default_storage_key() -> String {
    "user_preferences".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_style() -> String {
    "conversational".to_string()
}

fn default_upcoming_days() -> u32 {
    7
}

fn default_event_duration_mins() -> i64 {
    60
}

fn default_queue_capacity() -> usize {
    32
}

fn default_enabled_integrations() -> Vec<String> {
    Integration::ALL
        .iter()
        .map(|i| i.as_str().to_string())
        .collect()
}

fn default_weather_condition() -> String {
    "Sunny".to_string()
}

fn default_weather_temperature() -> f64 {
    72.0
}

fn default_generator_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_generator_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_generator_timeout() -> u64 {
    120
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn default_rules() -> Vec<IntentRule> {
    vec![
        IntentRule {
            intent: IntentType::Scheduling,
            keywords: words(&[
                "schedule",
                "calendar",
                "meeting",
                "appointment",
                "remind",
                "event",
            ]),
            match_datetime: true,
        },
        IntentRule {
            intent: IntentType::TaskManagement,
            keywords: words(&[
                "task", "todo", "reminder", "complete", "finish", "create", "add",
            ]),
            match_datetime: false,
        },
        IntentRule {
            intent: IntentType::Communication,
            keywords: words(&["message", "text", "call", "email", "send", "contact"]),
            match_datetime: false,
        },
        IntentRule {
            intent: IntentType::InformationRetrieval,
            keywords: words(&[
                "what", "when", "where", "who", "how", "why", "find", "search", "tell me",
            ]),
            match_datetime: false,
        },
    ]
}

fn default_patterns() -> Vec<PatternRule> {
    vec![
        PatternRule {
            prefix: "remind me".to_string(),
            tag: "reminder_request".to_string(),
            intent: Some(IntentType::TaskManagement),
        },
        PatternRule {
            prefix: "schedule".to_string(),
            tag: "schedule_request".to_string(),
            intent: None,
        },
        PatternRule {
            prefix: "send".to_string(),
            tag: "send_request".to_string(),
            intent: None,
        },
        PatternRule {
            prefix: "what".to_string(),
            tag: "information_request".to_string(),
            intent: None,
        },
        PatternRule {
            prefix: "tell me".to_string(),
            tag: "information_request".to_string(),
            intent: None,
        },
    ]
}

fn default_lead_phrases() -> Vec<String> {
    words(&[
        "remind me to",
        "remind me about",
        "remind me",
        "schedule",
        "create",
        "add",
        "set up",
        "book",
    ])
}

fn default_temporal_markers() -> Vec<String> {
    words(&[
        "today", "tomorrow", "tonight", "at", "on", "next", "this", "by", "every", "from",
    ])
}

impl Config {
    /// Load configuration from the default location (~/.concierge/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Self::default_config();

        // Serialize before processing so the file keeps the portable "~" path
        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.concierge/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".concierge").join("config.toml"))
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            core: CoreConfig {
                log_level: default_log_level(),
                data_dir: default_data_dir(),
            },
            agent: AgentConfig::default(),
            integrations: IntegrationsConfig::default(),
            generator: GeneratorConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }

    /// Path of the SQLite database inside the data directory
    pub fn database_path(&self) -> PathBuf {
        self.core.data_dir.join("concierge.db")
    }

    /// Validate and process configuration
    ///
    /// This method:
    /// - Validates log level, agent tuning and integration names
    /// - Validates and normalizes the classifier table
    /// - Expands ~ in the data directory and creates it
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.agent.storage_key.trim().is_empty() {
            return Err(EngineError::Config(
                "storage_key must not be empty".to_string(),
            ));
        }
        if self.agent.upcoming_days == 0 {
            return Err(EngineError::Config(
                "upcoming_days must be at least 1".to_string(),
            ));
        }
        if self.agent.event_duration_mins <= 0 {
            return Err(EngineError::Config(
                "event_duration_mins must be positive".to_string(),
            ));
        }
        if self.agent.queue_capacity == 0 {
            return Err(EngineError::Config(
                "queue_capacity must be at least 1".to_string(),
            ));
        }

        for name in &self.integrations.enabled {
            name.parse::<Integration>().map_err(EngineError::Config)?;
        }

        self.classifier.validate_and_normalize()?;

        self.core.data_dir = expand_path(&self.core.data_dir)?;

        if !self.core.data_dir.exists() {
            fs::create_dir_all(&self.core.data_dir).map_err(|e| {
                EngineError::Config(format!("Failed to create data directory: {}", e))
            })?;
        }

        Ok(())
    }
}

impl ClassifierConfig {
    /// Reject unusable tables and lower-case every keyword and phrase
    pub fn validate_and_normalize(&mut self) -> Result<(), EngineError> {
        for rule in &mut self.rules {
            if rule.intent == IntentType::General {
                return Err(EngineError::Config(
                    "classifier rules may not target 'general'; it is the fallback".to_string(),
                ));
            }
            if rule.keywords.is_empty() && !rule.match_datetime {
                return Err(EngineError::Config(format!(
                    "classifier rule for '{}' has no keywords",
                    rule.intent
                )));
            }
            for keyword in &mut rule.keywords {
                *keyword = keyword.trim().to_lowercase();
                if keyword.is_empty() {
                    return Err(EngineError::Config(format!(
                        "classifier rule for '{}' contains an empty keyword",
                        rule.intent
                    )));
                }
            }
        }

        for pattern in &mut self.patterns {
            pattern.prefix = pattern.prefix.trim().to_lowercase();
            if pattern.prefix.is_empty() || pattern.tag.trim().is_empty() {
                return Err(EngineError::Config(
                    "classifier patterns need a non-empty prefix and tag".to_string(),
                ));
            }
        }

        for phrase in self
            .lead_phrases
            .iter_mut()
            .chain(self.temporal_markers.iter_mut())
        {
            *phrase = phrase.trim().to_lowercase();
        }
        self.lead_phrases.retain(|p| !p.is_empty());
        self.temporal_markers.retain(|m| !m.is_empty());

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = Config::default_config();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.agent.storage_key, "user_preferences");
        assert_eq!(config.agent.default_style, "conversational");
        assert_eq!(config.integrations.enabled.len(), 5);
        assert_eq!(config.classifier.rules.len(), 4);
        assert_eq!(config.classifier.rules[0].intent, IntentType::Scheduling);
        assert!(config.classifier.rules[0].match_datetime);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test");
        let expanded = expand_path(&path).unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(expanded, home.join("test"));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let path = PathBuf::from("/absolute/path");
        let expanded = expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default_config();
        let toml_string = toml::to_string(&config).unwrap();

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(config.core.log_level, deserialized.core.log_level);
        assert_eq!(config.classifier, deserialized.classifier);
    }

    #[test]
    fn test_minimal_toml_fills_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let toml = format!(
            "[core]\nlog_level = \"debug\"\ndata_dir = {:?}\n",
            temp.path().join("data")
        );

        let config = Config::from_toml_str(&toml).unwrap();
        assert_eq!(config.core.log_level, "debug");
        assert_eq!(config.agent.upcoming_days, 7);
        assert_eq!(config.generator.model, "llama3.1:8b");
        assert!(config.core.data_dir.exists());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let result = Config::from_toml_str("[core]\nlog_level = \"loud\"\n");
        assert!(matches!(result, Err(EngineError::Config(msg)) if msg.contains("loud")));
    }

    #[test]
    fn test_unknown_integration_rejected() {
        let mut config = Config::default_config();
        config.integrations.enabled.push("fax".to_string());
        assert!(config.validate_and_process().is_err());
    }

    #[test]
    fn test_general_rule_rejected() {
        let mut classifier = ClassifierConfig::default();
        classifier.rules.push(IntentRule {
            intent: IntentType::General,
            keywords: vec!["hello".to_string()],
            match_datetime: false,
        });
        assert!(classifier.validate_and_normalize().is_err());
    }

    #[test]
    fn test_keywords_are_normalized() {
        let mut classifier = ClassifierConfig {
            rules: vec![IntentRule {
                intent: IntentType::Communication,
                keywords: vec!["  Ping ".to_string()],
                match_datetime: false,
            }],
            patterns: vec![],
            lead_phrases: vec!["Remind Me".to_string(), "  ".to_string()],
            temporal_markers: vec![],
        };
        classifier.validate_and_normalize().unwrap();
        assert_eq!(classifier.rules[0].keywords, vec!["ping"]);
        assert_eq!(classifier.lead_phrases, vec!["remind me"]);
    }
}
