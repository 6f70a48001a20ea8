//! SQLite-backed settings store.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

mod error;

pub use error::{DbError, DbErrorCode, DbResult};

pub const DATA_DIR_ENV: &str = "METABOX_DATA_DIR";

fn map_db_io(
    fallback: DbErrorCode,
    context: impl FnOnce() -> String,
) -> impl FnOnce(std::io::Error) -> DbError {
    move |error| DbError::from_io_error(fallback, context(), error)
}

fn map_db_sqlite(
    fallback: DbErrorCode,
    context: impl FnOnce() -> String,
) -> impl FnOnce(rusqlite::Error) -> DbError {
    move |error| DbError::from_sqlite_error(fallback, context(), error)
}

pub fn data_dir() -> DbResult<PathBuf> {
    let base = match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs_next::data_dir()
            .ok_or_else(|| {
                DbError::new(
                    DbErrorCode::DataDirUnavailable,
                    "Could not resolve data directory",
                )
            })?
            .join("metabox"),
    };
    std::fs::create_dir_all(&base).map_err(map_db_io(DbErrorCode::DataDirUnavailable, || {
        "Failed to create data dir".to_string()
    }))?;
    Ok(base)
}

fn ensure_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )
    .map_err(map_db_sqlite(DbErrorCode::SchemaInitFailed, || {
        "Failed to init schema".to_string()
    }))
}

pub fn open() -> DbResult<Connection> {
    open_at(&data_dir()?.join("metabox.db"))
}

pub fn open_at(path: &Path) -> DbResult<Connection> {
    let conn = Connection::open(path).map_err(map_db_sqlite(DbErrorCode::OpenFailed, || {
        format!("Failed to open db {}", path.display())
    }))?;
    ensure_schema(&conn)?;
    Ok(conn)
}

pub fn set_setting_bool(conn: &Connection, key: &str, value: bool) -> DbResult<()> {
    set_setting_string(conn, key, if value { "true" } else { "false" })
}

/// Unparseable values read as unset.
pub fn get_setting_bool(conn: &Connection, key: &str) -> DbResult<Option<bool>> {
    Ok(match get_setting_string(conn, key)?.as_deref() {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    })
}

pub fn set_setting_string(conn: &Connection, key: &str, value: &str) -> DbResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
        params![key, value],
    )
    .map_err(map_db_sqlite(DbErrorCode::WriteFailed, || {
        format!("Failed to store setting {key}")
    }))?;
    Ok(())
}

pub fn get_setting_string(conn: &Connection, key: &str) -> DbResult<Option<String>> {
    conn.query_row(
        "SELECT value FROM settings WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .map_err(map_db_sqlite(DbErrorCode::ReadFailed, || {
        format!("Failed to read setting {key}")
    }))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::env;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};

    pub(crate) fn uniq_db_path(label: &str) -> PathBuf {
        let ts = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_nanos();
        env::temp_dir().join(format!("metabox-dbtest-{label}-{ts}.db"))
    }
}
