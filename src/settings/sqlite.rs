// SqliteSettingsStore — rusqlite backend implementing SettingsStore.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Send.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
//
// Stored values that fail to decode are logged and replaced by defaults,
// so a hand-edited or older database never blocks startup.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::warn;

use super::models::{titles_from_entries, Sensitivity, Settings, TitleEntry};
use super::queries::{self, KEY_AI_CONFIG, KEY_ENABLED, KEY_MOVIES, KEY_SENSITIVITY};
use super::store::SettingsStore;
use crate::providers::config::ProviderConfig;

pub struct SqliteSettingsStore {
    conn: Mutex<Connection>,
}

impl SqliteSettingsStore {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

/// Decode a stored JSON value, falling back to `None` (with a warning) if
/// the key is missing or malformed.
fn decode<T: DeserializeOwned>(conn: &Connection, key: &str) -> Result<Option<T>> {
    let Some(raw) = queries::get_value(conn, key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key = key, error = %e, "Ignoring malformed stored setting");
            Ok(None)
        }
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn load_settings(&self) -> Result<Settings> {
        let conn = self.conn.lock().await;
        let defaults = Settings::default();

        let monitored_titles = decode::<Vec<TitleEntry>>(&conn, KEY_MOVIES)?
            .map(titles_from_entries)
            .unwrap_or_default();
        let enabled = decode::<bool>(&conn, KEY_ENABLED)?.unwrap_or(defaults.enabled);
        let sensitivity = decode::<String>(&conn, KEY_SENSITIVITY)?
            .and_then(|s| Sensitivity::parse(&s))
            .unwrap_or(defaults.sensitivity);

        Ok(Settings {
            monitored_titles,
            enabled,
            sensitivity,
        })
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        let movies = serde_json::to_string(&settings.monitored_titles)?;
        let enabled = serde_json::to_string(&settings.enabled)?;
        let sensitivity = serde_json::to_string(&settings.sensitivity)?;

        let mut conn = self.conn.lock().await;
        // All three keys change together or not at all
        let tx = conn.transaction()?;
        queries::set_value(&tx, KEY_MOVIES, &movies)?;
        queries::set_value(&tx, KEY_ENABLED, &enabled)?;
        queries::set_value(&tx, KEY_SENSITIVITY, &sensitivity)?;
        tx.commit()?;
        Ok(())
    }

    async fn load_ai_config(&self) -> Result<ProviderConfig> {
        let conn = self.conn.lock().await;
        Ok(decode::<ProviderConfig>(&conn, KEY_AI_CONFIG)?.unwrap_or_default())
    }

    async fn save_ai_config(&self, config: &ProviderConfig) -> Result<()> {
        let json = serde_json::to_string(config)?;
        let conn = self.conn.lock().await;
        queries::set_value(&conn, KEY_AI_CONFIG, &json)
    }

    async fn last_updated(&self) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        queries::last_updated(&conn)
    }
}
