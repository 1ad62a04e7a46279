//! Connection setup and schema migrations for the diary store.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use super::DatabaseError;

/// One forward-only schema step. Each script records its own version.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial diary schema",
    sql: include_str!("../../resources/migrations/001_initial.sql"),
}];

/// Tables the current schema consists of, in name order.
pub const DIARY_TABLES: [&str; 5] = [
    "context_notes",
    "medication_courses",
    "pain_entries",
    "reminders",
    "schema_version",
];

/// Opens the diary file, creating missing parent directories, and brings
/// the schema up to date.
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    prepare(Connection::open(path)?)
}

/// Fresh in-memory diary with the full schema.
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    prepare(Connection::open_in_memory()?)
}

fn prepare(conn: Connection) -> Result<Connection, DatabaseError> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.pragma_update(None, "journal_mode", "DELETE")?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Applies every migration newer than the stored version, each in its own
/// transaction. Running it on an up-to-date store is a no-op.
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current = schema_version(conn)?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tracing::info!(version = migration.version, name = migration.name, "Applying migration");
        let failed = |e: rusqlite::Error| DatabaseError::MigrationFailed {
            version: migration.version,
            reason: e.to_string(),
        };
        let tx = conn.unchecked_transaction().map_err(failed)?;
        tx.execute_batch(migration.sql).map_err(failed)?;
        tx.commit().map_err(failed)?;
    }
    Ok(())
}

/// Highest applied migration; 0 for a store without any schema.
pub fn schema_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let has_table = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
            [],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if !has_table {
        return Ok(0);
    }
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// User tables present in the store, sorted by name.
pub fn table_names(conn: &Connection) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
         ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}
