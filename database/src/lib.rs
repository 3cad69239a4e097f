use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, info, warn};
use xbird_core::{
    CredentialStore, ExtensionSettings, SettingsStore, StorageError, CREDENTIAL_KEY,
    LEGACY_CREDENTIAL_KEY,
};


pub const MIN_CREDENTIAL_LENGTH: usize = 32;

const INTENSITY_KEY: &str = "brainrotIntensity";
const MOOD_KEY: &str = "defaultMood";
const ENABLED_KEY: &str = "extensionEnabled";

/// Checks a Hugging Face API key before it is stored. Returns the trimmed key.
pub fn validate_credential(key: &str) -> Result<String, StorageError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(StorageError::InvalidCredential {
            reason: "API key is required".to_string(),
        });
    }
    if key.len() < MIN_CREDENTIAL_LENGTH {
        return Err(StorageError::InvalidCredential {
            reason: "API key appears to be too short".to_string(),
        });
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(StorageError::InvalidCredential {
            reason: "API key contains invalid characters".to_string(),
        });
    }
    Ok(key.to_string())
}

/// SQLite key-value store holding the API key and the extension settings.
pub struct Database {
    connection_string: String,
    pool: Option<SqlitePool>,
}

impl Database {
    pub fn new(connection_string: String) -> Self {
        Self {
            connection_string,
            pool: None,
        }
    }

    /// Connects and runs migrations.
    pub async fn open(connection_string: String) -> Result<Self, StorageError> {
        let mut db = Self::new(connection_string);
        db.connect().await?;
        db.run_migrations().await?;
        Ok(db)
    }

    pub async fn connect(&mut self) -> Result<(), StorageError> {
        let options = SqliteConnectOptions::from_str(&self.connection_string)
            .map_err(|e| StorageError::ConnectionFailed {
                reason: format!("{}: {e}", self.connection_string),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed {
                reason: e.to_string(),
            })?;

        info!("Connected to settings database: {}", self.connection_string);
        self.pool = Some(pool);
        Ok(())
    }

    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(self.pool()?)
        .await
        .map_err(|e| StorageError::MigrationFailed {
            migration: format!("create settings table: {e}"),
        })?;

        debug!("Settings migrations applied");
        Ok(())
    }

    fn pool(&self) -> Result<&SqlitePool, StorageError> {
        self.pool.as_ref().ok_or_else(|| StorageError::ConnectionFailed {
            reason: "database not connected".to_string(),
        })
    }

    pub async fn save_setting(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(self.pool()?)
        .await?;
        Ok(())
    }

    pub async fn get_setting(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool()?)
            .await?;
        Ok(value)
    }

    pub async fn delete_setting(&self, key: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(self.pool()?)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get_setting(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StorageError::CorruptValue {
                    key: key.to_string(),
                    details: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    async fn save_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|e| StorageError::CorruptValue {
            key: key.to_string(),
            details: e.to_string(),
        })?;
        self.save_setting(key, &raw).await
    }

    /// Validates and stores the API key under the primary key.
    pub async fn save_credential(&self, key: &str) -> Result<(), StorageError> {
        let key = validate_credential(key)?;
        self.save_setting(CREDENTIAL_KEY, &key).await?;
        info!("API key saved");
        Ok(())
    }

    /// Removes the API key under both the primary and the legacy key.
    pub async fn clear_credential(&self) -> Result<(), StorageError> {
        self.delete_setting(CREDENTIAL_KEY).await?;
        self.delete_setting(LEGACY_CREDENTIAL_KEY).await?;
        info!("API key cleared");
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl CredentialStore for Database {
    /// Reads the primary key, falling back to the legacy one. A legacy hit is copied
    /// to the primary key so later reads find it there.
    async fn read_credential(&self) -> Result<Option<String>, StorageError> {
        if let Some(key) = non_blank(self.get_setting(CREDENTIAL_KEY).await?) {
            return Ok(Some(key));
        }

        let Some(legacy) = non_blank(self.get_setting(LEGACY_CREDENTIAL_KEY).await?) else {
            return Ok(None);
        };

        info!("Migrating API key from legacy storage key");
        if let Err(e) = self.save_setting(CREDENTIAL_KEY, &legacy).await {
            warn!("Failed to migrate legacy API key: {}", e);
        }
        Ok(Some(legacy))
    }
}

impl SettingsStore for Database {
    async fn load_settings(&self) -> Result<ExtensionSettings, StorageError> {
        let defaults = ExtensionSettings::default();
        Ok(ExtensionSettings {
            brainrot_intensity: self
                .get_json(INTENSITY_KEY)
                .await?
                .unwrap_or(defaults.brainrot_intensity),
            default_mood: self
                .get_json(MOOD_KEY)
                .await?
                .unwrap_or(defaults.default_mood),
            extension_enabled: self
                .get_json(ENABLED_KEY)
                .await?
                .unwrap_or(defaults.extension_enabled),
        })
    }

    async fn save_settings(&self, settings: &ExtensionSettings) -> Result<(), StorageError> {
        self.save_json(INTENSITY_KEY, &settings.brainrot_intensity)
            .await?;
        self.save_json(MOOD_KEY, &settings.default_mood).await?;
        self.save_json(ENABLED_KEY, &settings.extension_enabled)
            .await?;
        debug!("Extension settings saved");
        Ok(())
    }
}
