// Settings queries — raw key-value access.
//
// Values are stored as JSON text. Typed decoding (and tolerance of legacy
// shapes) lives in the store, so this module stays SQL-only.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

// Persistence keys, matching the browser extension storage layout.
pub const KEY_MOVIES: &str = "movies";
pub const KEY_ENABLED: &str = "isEnabled";
pub const KEY_SENSITIVITY: &str = "sensitivity";
pub const KEY_AI_CONFIG: &str = "aiConfig";

/// Get the raw JSON value stored under `key`.
pub fn get_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value_json FROM settings WHERE key = ?1")?;
    let result = stmt.query_row(params![key], |row| row.get(0)).optional()?;
    Ok(result)
}

/// Set the raw JSON value for `key` (upsert).
pub fn set_value(conn: &Connection, key: &str, value_json: &str) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO settings (key, value_json, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value_json = ?2, updated_at = ?3",
        params![key, value_json, now],
    )?;
    Ok(())
}

/// Most recent update time across all keys (RFC 3339), if anything is stored.
pub fn last_updated(conn: &Connection) -> Result<Option<String>> {
    let result: Option<String> =
        conn.query_row("SELECT MAX(updated_at) FROM settings", [], |row| row.get(0))?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::schema::create_tables;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    #[test]
    fn missing_key_is_none() {
        let conn = setup();
        assert_eq!(get_value(&conn, KEY_MOVIES).unwrap(), None);
        assert_eq!(last_updated(&conn).unwrap(), None);
    }

    #[test]
    fn set_then_overwrite() {
        let conn = setup();
        set_value(&conn, KEY_ENABLED, "true").unwrap();
        set_value(&conn, KEY_ENABLED, "false").unwrap();
        assert_eq!(get_value(&conn, KEY_ENABLED).unwrap().as_deref(), Some("false"));
        assert!(last_updated(&conn).unwrap().is_some());
    }
}
