// Settings — watch list, preferences, and their persistence.
//
// We use rusqlite with the "bundled" feature so there's no system SQLite
// dependency. The database file lives wherever SPOILERGUARD_DB_PATH points
// (defaults to ./spoilerguard.db).

pub mod handle;
pub mod models;
pub mod queries;
pub mod schema;
pub mod sqlite;
pub mod store;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

use store::SettingsStore;

/// Open (or create) the settings database and run migrations.
pub fn initialize(db_path: &str) -> Result<Arc<dyn SettingsStore>> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for database: {}", db_path))?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    schema::create_tables(&conn)?;

    Ok(Arc::new(sqlite::SqliteSettingsStore::new(conn)))
}

/// Open an existing settings database (fails if it doesn't exist yet).
pub fn open(db_path: &str) -> Result<Arc<dyn SettingsStore>> {
    if !Path::new(db_path).exists() {
        anyhow::bail!(
            "Settings database not found at {}. Run `spoilerguard init` first.",
            db_path
        );
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    // Idempotent; picks up tables added since the database was created
    schema::create_tables(&conn)?;

    Ok(Arc::new(sqlite::SqliteSettingsStore::new(conn)))
}

/// An in-memory store, for tests and one-off runs.
pub fn open_in_memory() -> Result<Arc<dyn SettingsStore>> {
    let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
    schema::create_tables(&conn)?;
    Ok(Arc::new(sqlite::SqliteSettingsStore::new(conn)))
}
