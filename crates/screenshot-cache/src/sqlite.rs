//! SQLite-backed screenshot store
//!
//! One row per launch URL. The schema version lives in `PRAGMA user_version`;
//! a database written by a different version is wiped and recreated rather
//! than migrated.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};

use crate::store::ScreenshotStore;
use crate::{Bitmap, Result, ScreenshotError};

/// Current on-disk schema version
pub const SCHEMA_VERSION: i64 = 2;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS screenshots (
    url         TEXT PRIMARY KEY NOT NULL,
    width       INTEGER NOT NULL,
    height      INTEGER NOT NULL,
    mime        TEXT NOT NULL,
    data        BLOB NOT NULL,
    captured_at INTEGER NOT NULL
)";

/// Persistent store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }
        Self::with_connection(Connection::open(path)?)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        prepare_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Number of stored screenshots
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM screenshots", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }
}

fn prepare_schema(conn: &Connection) -> Result<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if version != SCHEMA_VERSION {
        if version != 0 {
            tracing::info!(from = version, to = SCHEMA_VERSION, "screenshot schema changed, recreating store");
        }
        conn.execute("DROP TABLE IF EXISTS screenshots", [])?;
        conn.execute(CREATE_TABLE, [])?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    } else {
        conn.execute(CREATE_TABLE, [])?;
    }

    Ok(())
}

impl ScreenshotStore for SqliteStore {
    fn load(&self, url: &str) -> Result<Option<Bitmap>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT width, height, mime, data FROM screenshots WHERE url = ?1",
                params![url],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Vec<u8>>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((width, height, mime, data)) = row else {
            return Ok(None);
        };

        let invalid = |reason: &str| ScreenshotError::InvalidRecord {
            url: url.to_string(),
            reason: reason.to_string(),
        };
        let width = u32::try_from(width).map_err(|_| invalid("width out of range"))?;
        let height = u32::try_from(height).map_err(|_| invalid("height out of range"))?;

        Ok(Some(Bitmap::new(width, height, mime, data)))
    }

    fn store(&self, url: &str, bitmap: &Bitmap) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO screenshots (url, width, height, mime, data, captured_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(url) DO UPDATE SET
                width = excluded.width,
                height = excluded.height,
                mime = excluded.mime,
                data = excluded.data,
                captured_at = excluded.captured_at",
            params![
                url,
                i64::from(bitmap.width),
                i64::from(bitmap.height),
                bitmap.mime,
                bitmap.data,
                chrono::Utc::now().timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    fn remove(&self, url: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM screenshots WHERE url = ?1", params![url])?;
        Ok(())
    }
}
