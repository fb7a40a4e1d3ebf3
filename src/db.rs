use crate::error::{GradebookError, Result};
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

pub const DB_FILE: &str = "gradebook.sqlite3";

pub const KEY_SCHEDULE: &str = "scheduleConfig";
pub const KEY_STUDENTS: &str = "students";
pub const KEY_RUBRICS: &str = "savedRubrics";
pub const KEY_ASSIGNMENTS: &str = "assignments";
pub const KEY_GRADES: &str = "grades";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)
        .with_context(|| format!("failed to create workspace {}", workspace.display()))?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    init_schema(&conn).context("failed to initialize kv_store")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

pub fn kv_get_raw(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv_store WHERE key = ?", [key], |r| {
            r.get::<_, String>(0)
        })
        .optional()?;
    Ok(value)
}

/// Reads a whole collection. A missing key is the empty collection.
pub fn kv_get_json<T>(conn: &Connection, key: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = kv_get_raw(conn, key)? else {
        return Ok(T::default());
    };
    serde_json::from_str(&raw).map_err(|source| GradebookError::Corrupt {
        key: key.to_string(),
        source,
    })
}

pub fn kv_set_raw(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO kv_store(key, value, updated_at)
         VALUES(?, ?, strftime('%Y-%m-%dT%H:%M:%SZ','now'))
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        (key, value),
    )?;
    Ok(())
}

/// Writes a whole collection back.
pub fn kv_set_json<T: Serialize>(conn: &Connection, key: &str, value: &T) -> Result<()> {
    let text = serde_json::to_string(value).map_err(|source| GradebookError::Corrupt {
        key: key.to_string(),
        source,
    })?;
    kv_set_raw(conn, key, &text)
}
