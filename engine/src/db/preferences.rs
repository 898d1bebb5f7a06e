/// Preference persistence
///
/// Stores the JSON-encoded `PreferenceRecord` under a single storage key.
/// A payload that no longer decodes is logged and reported as "nothing
/// stored" so the caller falls back to defaults.
use async_trait::async_trait;
use chrono::Utc;
use sdk::collaborators::PreferencePersistence;
use sdk::errors::PersistenceError;
use sdk::types::PreferenceRecord;
use sqlx::SqlitePool;
use tracing::{debug, warn};

/// SQLite-backed preference persistence
#[derive(Debug, Clone)]
pub struct SqlitePreferenceStore {
    pool: SqlitePool,
    storage_key: String,
}

impl SqlitePreferenceStore {
    pub fn new(pool: SqlitePool, storage_key: impl Into<String>) -> Self {
        Self {
            pool,
            storage_key: storage_key.into(),
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Remove the stored record, if any
    pub async fn clear(&self) -> Result<(), PersistenceError> {
        sqlx::query("DELETE FROM preferences WHERE storage_key = ?")
            .bind(&self.storage_key)
            .execute(&self.pool)
            .await
            .map_err(|e| PersistenceError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl PreferencePersistence for SqlitePreferenceStore {
    async fn load(&self) -> Result<Option<PreferenceRecord>, PersistenceError> {
        let payload: Option<String> =
            sqlx::query_scalar("SELECT payload FROM preferences WHERE storage_key = ?")
                .bind(&self.storage_key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| PersistenceError::Database(e.to_string()))?;

        let Some(payload) = payload else {
            debug!("No preference record under {}", self.storage_key);
            return Ok(None);
        };

        match serde_json::from_str(&payload) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(
                    "Stored preferences under {} could not be decoded, ignoring: {}",
                    self.storage_key, e
                );
                Ok(None)
            }
        }
    }

    async fn save(&self, record: &PreferenceRecord) -> Result<(), PersistenceError> {
        let payload =
            serde_json::to_string(record).map_err(|e| PersistenceError::Encode(e.to_string()))?;

        sqlx::query(
            "INSERT INTO preferences (storage_key, payload, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(storage_key) DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at",
        )
        .bind(&self.storage_key)
        .bind(payload)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| PersistenceError::Database(e.to_string()))?;

        debug!("Preference record saved under {}", self.storage_key);
        Ok(())
    }
}
