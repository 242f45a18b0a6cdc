//! Database session shared by every store.
//!
//! Wraps one SQLite connection with schema setup, a busy handler and a
//! depth-counted transaction so nested scopes commit exactly once.

use crate::error::{Result, StoreError};
use rusqlite::Connection;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Silent retries before a locked database is reported as busy.
pub const BUSY_RETRIES: i32 = 10;

const BUSY_BACKOFF_START_MS: u64 = 10;
const BUSY_BACKOFF_CAP_MS: u64 = 500;

/// Where a store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    File(PathBuf),
    Memory,
}

impl Location {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Memory => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Memory => f.write_str(":memory:"),
        }
    }
}

/// Table and index definitions for one kind of store.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub tables: &'static str,
    pub foreign_keys: bool,
    pub wal: bool,
}

#[derive(Debug)]
struct Session {
    conn: Connection,
    depth: u32,
}

#[derive(Debug)]
pub struct Database {
    location: Location,
    is_new: bool,
    session: Mutex<Session>,
}

impl Database {
    /// Open (or create) the database and bring its schema up to date.
    pub fn open(location: &Location, schema: &Schema) -> Result<Self> {
        let (conn, is_new) = match location {
            Location::File(path) => {
                let is_new = !path.exists();
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                (Connection::open(path)?, is_new)
            }
            Location::Memory => (Connection::open_in_memory()?, true),
        };

        conn.busy_handler(Some(busy_backoff))?;

        if schema.wal && !location.is_memory() {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }
        if schema.foreign_keys {
            conn.pragma_update(None, "foreign_keys", true)?;
        }
        conn.execute_batch(schema.tables)
            .map_err(|err| busy_or_sql(location, err))?;

        tracing::debug!("Opened {} (new: {})", location, is_new);

        Ok(Self {
            location: location.clone(),
            is_new,
            session: Mutex::new(Session { conn, depth: 0 }),
        })
    }

    pub fn open_in_memory(schema: &Schema) -> Result<Self> {
        Self::open(&Location::Memory, schema)
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// True when this session created the file (always true in memory).
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the connection. Keep `f` free of other `Database`
    /// calls: the session lock is held for its duration.
    pub fn with<R>(&self, f: impl FnOnce(&Connection) -> Result<R>) -> Result<R> {
        let session = self.lock();
        f(&session.conn).map_err(|err| match err {
            StoreError::Sql(sql) => busy_or_sql(&self.location, sql),
            other => other,
        })
    }

    // ────────────────────────────────────────────────────────────────
    // Transactions
    // ────────────────────────────────────────────────────────────────

    pub fn begin_transaction(&self) -> Result<()> {
        let mut session = self.lock();
        if session.depth == 0 {
            session
                .conn
                .execute_batch("BEGIN;")
                .map_err(|err| busy_or_sql(&self.location, err))?;
        }
        session.depth += 1;
        Ok(())
    }

    pub fn end_transaction(&self) -> Result<()> {
        let mut session = self.lock();
        match session.depth {
            0 => Ok(()),
            1 => {
                session.depth = 0;
                if let Err(err) = session.conn.execute_batch("COMMIT;") {
                    let _ = session.conn.execute_batch("ROLLBACK;");
                    return Err(busy_or_sql(&self.location, err));
                }
                Ok(())
            }
            _ => {
                session.depth -= 1;
                Ok(())
            }
        }
    }

    pub fn in_transaction(&self) -> bool {
        self.lock().depth > 0
    }

    /// Commit what is pending and reopen at the same depth.
    pub fn flush(&self) -> Result<()> {
        let session = self.lock();
        if session.depth > 0 {
            session
                .conn
                .execute_batch("COMMIT; BEGIN;")
                .map_err(|err| busy_or_sql(&self.location, err))?;
        }
        Ok(())
    }

    /// Scoped transaction. The scope commits even when `f` fails part way,
    /// keeping whatever it already wrote.
    pub fn transaction<R>(&self, f: impl FnOnce() -> Result<R>) -> Result<R> {
        self.begin_transaction()?;
        let result = f();
        self.end_transaction()?;
        result
    }

    // ────────────────────────────────────────────────────────────────
    // Template bookkeeping
    // ────────────────────────────────────────────────────────────────

    pub fn template_applied(&self) -> Result<bool> {
        self.with(|conn| {
            let version: i64 =
                conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
            Ok(version & 1 != 0)
        })
    }

    pub fn mark_template_applied(&self) -> Result<()> {
        self.with(|conn| {
            let version: i64 =
                conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
            conn.pragma_update(None, "user_version", version | 1)?;
            Ok(())
        })
    }
}

fn busy_backoff(retries: i32) -> bool {
    if retries >= BUSY_RETRIES {
        return false;
    }
    let exp = retries.clamp(0, 16) as u32;
    let delay = (BUSY_BACKOFF_START_MS << exp).min(BUSY_BACKOFF_CAP_MS);
    std::thread::sleep(Duration::from_millis(delay));
    true
}

fn busy_or_sql(location: &Location, err: rusqlite::Error) -> StoreError {
    let err = StoreError::Sql(err);
    if err.is_busy() {
        StoreError::Busy {
            path: location.to_string(),
        }
    } else {
        err
    }
}
