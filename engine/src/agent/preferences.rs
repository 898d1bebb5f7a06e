//! Preference Store
//!
//! Holds the user's preferences in memory and writes the durable part of
//! them through a [`PreferencePersistence`] collaborator.
//!
//! Learning counters live only in memory: they are not part of the stored
//! record, so a fresh store always starts with no counters.

use sdk::collaborators::PreferencePersistence;
use sdk::errors::PersistenceError;
use sdk::types::{ConversationTurn, Integration, PersonalizationContext, PreferenceRecord};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// In-memory user preferences
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPreference {
    pub language: String,
    pub communication_style: String,
    pub enabled_integrations: BTreeSet<String>,
    pub learning_counters: HashMap<String, u64>,
}

impl UserPreference {
    pub fn new(
        language: impl Into<String>,
        communication_style: impl Into<String>,
        enabled_integrations: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            language: language.into(),
            communication_style: communication_style.into(),
            enabled_integrations: enabled_integrations.into_iter().collect(),
            learning_counters: HashMap::new(),
        }
    }

    /// Build from a stored record. Counters start empty.
    pub fn from_record(record: PreferenceRecord) -> Self {
        Self::new(
            record.preferred_language,
            record.preferred_communication_style,
            record.enabled_integrations,
        )
    }

    /// The durable subset of these preferences
    pub fn to_record(&self) -> PreferenceRecord {
        PreferenceRecord {
            preferred_language: self.language.clone(),
            preferred_communication_style: self.communication_style.clone(),
            enabled_integrations: self.enabled_integrations.iter().cloned().collect(),
        }
    }

    pub fn is_enabled(&self, integration: Integration) -> bool {
        self.enabled_integrations.contains(integration.as_str())
    }

    /// Integrations currently switched on, skipping unknown names
    pub fn integrations(&self) -> Vec<Integration> {
        self.enabled_integrations
            .iter()
            .filter_map(|name| name.parse().ok())
            .collect()
    }
}

/// Preferences plus their persistence collaborator
pub struct PreferenceStore {
    current: UserPreference,
    persistence: Arc<dyn PreferencePersistence>,
}

impl PreferenceStore {
    /// Load stored preferences, falling back to `defaults`.
    ///
    /// Missing or undecodable records and storage errors all yield the
    /// defaults; loading never fails.
    pub async fn load(persistence: Arc<dyn PreferencePersistence>, defaults: UserPreference) -> Self {
        let current = match persistence.load().await {
            Ok(Some(record)) => {
                debug!("Loaded stored preferences");
                UserPreference::from_record(record)
            }
            Ok(None) => {
                info!("No stored preferences, using defaults");
                defaults
            }
            Err(e) => {
                warn!("Failed to load preferences, using defaults: {}", e);
                defaults
            }
        };

        Self {
            current,
            persistence,
        }
    }

    pub fn current(&self) -> &UserPreference {
        &self.current
    }

    /// Bump the counter for a learning pattern
    pub fn record_pattern(&mut self, pattern: &str) -> u64 {
        let counter = self
            .current
            .learning_counters
            .entry(pattern.to_string())
            .or_insert(0);
        *counter += 1;
        *counter
    }

    pub fn set_communication_style(&mut self, style: impl Into<String>) {
        self.current.communication_style = style.into();
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.current.language = language.into();
    }

    /// Switch an integration on or off. Returns whether anything changed.
    pub fn set_integration_enabled(&mut self, integration: Integration, enabled: bool) -> bool {
        let name = integration.as_str().to_string();
        if enabled {
            self.current.enabled_integrations.insert(name)
        } else {
            self.current.enabled_integrations.remove(&name)
        }
    }

    /// Persist the durable fields
    pub async fn save(&self) -> Result<(), PersistenceError> {
        self.persistence.save(&self.current.to_record()).await
    }

    /// Snapshot for shaping a single reply
    pub fn context(&self, history: &[ConversationTurn]) -> PersonalizationContext {
        PersonalizationContext {
            language: self.current.language.clone(),
            communication_style: self.current.communication_style.clone(),
            history: history.to_vec(),
            learning_counters: self.current.learning_counters.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryPersistence {
        record: Mutex<Option<PreferenceRecord>>,
        broken: bool,
    }

    #[async_trait]
    impl PreferencePersistence for MemoryPersistence {
        async fn load(&self) -> Result<Option<PreferenceRecord>, PersistenceError> {
            if self.broken {
                return Err(PersistenceError::Database("disk on fire".to_string()));
            }
            Ok(self.record.lock().unwrap().clone())
        }

        async fn save(&self, record: &PreferenceRecord) -> Result<(), PersistenceError> {
            *self.record.lock().unwrap() = Some(record.clone());
            Ok(())
        }
    }

    fn defaults() -> UserPreference {
        UserPreference::new("en", "conversational", vec!["calendar".to_string()])
    }

    #[tokio::test]
    async fn test_defaults_when_nothing_stored() {
        let store = PreferenceStore::load(Arc::new(MemoryPersistence::default()), defaults()).await;
        assert_eq!(store.current(), &defaults());
    }

    #[tokio::test]
    async fn test_defaults_when_storage_fails() {
        let persistence = MemoryPersistence {
            broken: true,
            ..Default::default()
        };
        let store = PreferenceStore::load(Arc::new(persistence), defaults()).await;
        assert_eq!(store.current().language, "en");
    }

    #[tokio::test]
    async fn test_save_and_reload_drops_counters() {
        let persistence = Arc::new(MemoryPersistence::default());
        let mut store = PreferenceStore::load(
            Arc::clone(&persistence) as Arc<dyn PreferencePersistence>,
            defaults(),
        )
        .await;

        store.set_language("fr");
        store.set_communication_style("formal");
        store.set_integration_enabled(Integration::Weather, true);
        assert_eq!(store.record_pattern("schedule_request"), 1);
        assert_eq!(store.record_pattern("schedule_request"), 2);
        store.save().await.unwrap();

        let reloaded = PreferenceStore::load(persistence, defaults()).await;
        let current = reloaded.current();
        assert_eq!(current.language, "fr");
        assert_eq!(current.communication_style, "formal");
        assert!(current.is_enabled(Integration::Weather));
        assert!(current.is_enabled(Integration::Calendar));
        // counters are not part of the stored record
        assert!(current.learning_counters.is_empty());
    }

    #[test]
    fn test_toggle_reports_change() {
        let mut pref = defaults();
        pref.enabled_integrations.insert("bogus".to_string());
        assert_eq!(pref.integrations(), vec![Integration::Calendar]);

        let mut store = PreferenceStore {
            current: defaults(),
            persistence: Arc::new(MemoryPersistence::default()),
        };
        assert!(!store.set_integration_enabled(Integration::Calendar, true));
        assert!(store.set_integration_enabled(Integration::Calendar, false));
        assert!(!store.current().is_enabled(Integration::Calendar));
    }
}
