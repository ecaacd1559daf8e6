//! Schema migrations for the settings database.
//!
//! Migrations are an ordered list of `(version, description, sql)`. Each one
//! runs inside a transaction together with its `schema_version` row, so a
//! half-applied migration never gets recorded.

use rusqlite::{params, Connection};

struct Migration {
    version: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Key-value settings table",
        sql: "CREATE TABLE IF NOT EXISTS settings (
                  key TEXT PRIMARY KEY,
                  value TEXT NOT NULL,
                  updated_at INTEGER NOT NULL
              );",
    },
    Migration {
        version: 2,
        description: "Index settings by modification time",
        sql: "CREATE INDEX IF NOT EXISTS idx_settings_updated_at ON settings(updated_at);",
    },
];

/// Highest version in [`MIGRATIONS`].
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Schema version recorded in the database, 0 for a fresh or foreign file.
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Applies every migration newer than the recorded version.
///
/// # Errors
/// Returns `rusqlite::Error` if any SQL statement fails.
pub fn run_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let current = get_schema_version(conn);
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
            params![migration.version, now, migration.description],
        )?;
        tx.commit()?;
        tracing::debug!(version = migration.version, "applied settings schema migration");
    }

    Ok(())
}
