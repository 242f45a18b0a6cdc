//! Command, view, edit, folder and dialog history.
//!
//! Writes go through a single background writer (see [`worker`]). Every read
//! and every transaction boundary first drains the writer's queue, so callers
//! never observe a pending write.

use crate::column::col;
use crate::cursor::{collect_rows, exec, first_row, Cursor};
use crate::db::{Database, Location};
use crate::error::Result;
use crate::traits::Transactional;
use crate::vault::schema;
use chrono::Utc;
use rusqlite::{params, Row};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

mod positions;
mod worker;

pub use positions::{EditorBookmark, EditorPosition, ViewerBookmark, ViewerPosition};

use worker::{WorkItem, Worker};

/// 100 ns ticks in one day.
pub const TICKS_PER_DAY: i64 = 864_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryKind {
    Command = 0,
    View = 1,
    Edit = 2,
    Folder = 3,
    Dialog = 4,
}

impl HistoryKind {
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Command),
            1 => Some(Self::View),
            2 => Some(Self::Edit),
            3 => Some(Self::Folder),
            4 => Some(Self::Dialog),
            _ => None,
        }
    }
}

/// A record to be appended. The time stamp is taken when it is queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub kind: HistoryKind,
    pub key: String,
    pub name: String,
    pub record_type: i32,
    pub locked: bool,
    pub guid: String,
    pub file: String,
    pub data: String,
}

impl NewRecord {
    pub fn new(kind: HistoryKind, key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
            name: name.into(),
            record_type: 0,
            locked: false,
            guid: String::new(),
            file: String::new(),
            data: String::new(),
        }
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    pub fn record_type(mut self, record_type: i32) -> Self {
        self.record_type = record_type;
        self
    }

    pub fn with_details(
        mut self,
        guid: impl Into<String>,
        file: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        self.guid = guid.into();
        self.file = file.into();
        self.data = data.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub id: i64,
    pub kind: HistoryKind,
    pub key: String,
    pub name: String,
    pub record_type: i32,
    pub locked: bool,
    pub time: i64,
    pub guid: String,
    pub file: String,
    pub data: String,
}

/// Rows of an unknown kind read as `None`.
fn record_from_row(row: &Row<'_>) -> Result<Option<HistoryRecord>> {
    let Some(kind) = HistoryKind::from_i64(col(row, 1)?) else {
        return Ok(None);
    };
    Ok(Some(HistoryRecord {
        id: col(row, 0)?,
        kind,
        key: col(row, 2)?,
        name: col(row, 3)?,
        record_type: i32::try_from(col::<i64>(row, 4)?).unwrap_or_default(),
        locked: col::<i64>(row, 5)? != 0,
        time: col(row, 6)?,
        guid: col(row, 7)?,
        file: col(row, 8)?,
        data: col(row, 9)?,
    }))
}

fn id_and_name(row: &Row<'_>) -> Result<(i64, String)> {
    Ok((col(row, 0)?, col(row, 1)?))
}

// ════════════════════════════════════════════════════════════════════
// Clock
// ════════════════════════════════════════════════════════════════════

/// Source of record time stamps, in 100 ns ticks.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall clock ticks since the Unix epoch, forced strictly increasing so two
/// records queued back to back never share a time stamp.
#[derive(Debug, Default)]
pub struct TickClock {
    last: AtomicI64,
}

impl Clock for TickClock {
    fn now(&self) -> i64 {
        let wall = Utc::now()
            .timestamp_nanos_opt()
            .map_or(i64::MAX / 2, |nanos| nanos / 100);
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = wall.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(current) => last = current,
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════
// Store
// ════════════════════════════════════════════════════════════════════

pub struct HistoryStore {
    // Dropped first: stopping the writer drains its queue.
    worker: Worker,
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("location", self.db.location())
            .finish()
    }
}

impl HistoryStore {
    pub fn open(location: &Location) -> Result<Self> {
        Self::open_with_clock(location, Arc::new(TickClock::default()))
    }

    /// Session-only history, gone when the store drops.
    pub fn in_memory() -> Result<Self> {
        Self::open(&Location::Memory)
    }

    pub fn open_with_clock(location: &Location, clock: Arc<dyn Clock>) -> Result<Self> {
        let db = Arc::new(Database::open(location, &schema::HISTORY)?);
        let worker = Worker::spawn(Arc::clone(&db))?;
        Ok(Self { worker, db, clock })
    }

    /// Block until every queued write has been applied.
    pub fn drain(&self) -> Result<()> {
        self.worker.drain()
    }

    fn read<R>(&self, f: impl FnOnce(&rusqlite::Connection) -> Result<R>) -> Result<R> {
        self.worker.drain()?;
        self.db.with(f)
    }

    fn cutoff(&self, days: u32) -> i64 {
        self.clock
            .now()
            .saturating_sub(i64::from(days).saturating_mul(TICKS_PER_DAY))
    }

    // ────────────────────────────────────────────────────────────────
    // Writes
    // ────────────────────────────────────────────────────────────────

    /// Append through the writer and wait for the new id.
    pub fn append(&self, record: NewRecord) -> Result<i64> {
        let time = self.clock.now();
        self.worker.append(None, record, time)
    }

    /// Queue an optional delete plus an insert and return at once. The new
    /// record is visible to the next read.
    pub fn delete_and_append_async(&self, delete_id: Option<i64>, record: NewRecord) -> Result<()> {
        let time = self.clock.now();
        self.worker.send(WorkItem::DeleteAndAppend {
            delete_id,
            record,
            time,
            reply: None,
        })
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        self.read(|conn| {
            exec(conn, schema::HISTORY_DELETE, params![id])?;
            Ok(())
        })
    }

    pub fn delete_all_unlocked(&self, kind: HistoryKind, key: &str) -> Result<()> {
        self.read(|conn| {
            exec(conn, schema::HISTORY_DELETE_UNLOCKED, params![kind as i64, key])?;
            Ok(())
        })
    }

    /// Drop unlocked records older than `days`, always keeping the
    /// `min_keep` most relevant ones of the bucket.
    pub fn delete_old_unlocked(&self, kind: HistoryKind, key: &str, days: u32, min_keep: u32) -> Result<()> {
        let older = self.cutoff(days);
        self.read(|conn| {
            exec(
                conn,
                schema::HISTORY_DELETE_OLD_UNLOCKED,
                params![kind as i64, key, older, min_keep],
            )?;
            Ok(())
        })
    }

    pub fn flip_lock(&self, id: i64) -> Result<()> {
        let locked = self.is_locked(id)?;
        self.db.with(|conn| {
            exec(conn, schema::HISTORY_SET_LOCK, params![!locked, id])?;
            Ok(())
        })
    }

    // ────────────────────────────────────────────────────────────────
    // Reads
    // ────────────────────────────────────────────────────────────────

    /// Oldest first.
    pub fn enum_forward<'a>(&'a self, kind: HistoryKind, key: &'a str) -> Cursor<'a, HistoryRecord> {
        self.enum_records(schema::HISTORY_ENUM, kind, key)
    }

    /// Locked first, then newest first.
    pub fn enum_reverse<'a>(&'a self, kind: HistoryKind, key: &'a str) -> Cursor<'a, HistoryRecord> {
        self.enum_records(schema::HISTORY_ENUM_DESC, kind, key)
    }

    fn enum_records<'a>(
        &'a self,
        sql: &'static str,
        kind: HistoryKind,
        key: &'a str,
    ) -> Cursor<'a, HistoryRecord> {
        Cursor::new(move || {
            let rows = self.read(|conn| {
                collect_rows(conn, sql, params![kind as i64, key], record_from_row)
            })?;
            Ok(rows.into_iter().flatten().collect())
        })
    }

    /// Bucket names of `kind` holding more than `min_entries` records.
    pub fn enum_large_histories(&self, kind: HistoryKind, min_entries: u32) -> Cursor<'_, String> {
        Cursor::new(move || {
            self.read(|conn| {
                collect_rows(
                    conn,
                    schema::HISTORY_ENUM_LARGE,
                    params![kind as i64, min_entries],
                    |row| col(row, 0),
                )
            })
        })
    }

    /// Name of the most relevant record of the bucket.
    pub fn newest_name(&self, kind: HistoryKind, key: &str) -> Result<Option<String>> {
        self.read(|conn| {
            first_row(conn, schema::HISTORY_GET_NEWEST_NAME, params![kind as i64, key], |row| {
                col(row, 0)
            })
        })
    }

    /// Name of record `id`.
    pub fn get(&self, id: i64) -> Result<Option<String>> {
        self.read(|conn| first_row(conn, schema::HISTORY_GET_NAME, params![id], |row| col(row, 0)))
    }

    pub fn get_record(&self, id: i64) -> Result<Option<HistoryRecord>> {
        self.read(|conn| {
            let record = first_row(conn, schema::HISTORY_GET_RECORD, params![id], record_from_row)?;
            Ok(record.flatten())
        })
    }

    pub fn count(&self, kind: HistoryKind, key: &str) -> Result<u32> {
        self.read(|conn| {
            let count = first_row(conn, schema::HISTORY_COUNT, params![kind as i64, key], |row| {
                col::<i64>(row, 0)
            })?;
            Ok(count.and_then(|c| u32::try_from(c).ok()).unwrap_or(0))
        })
    }

    pub fn is_locked(&self, id: i64) -> Result<bool> {
        self.read(|conn| {
            let lock = first_row(conn, schema::HISTORY_GET_LOCK, params![id], |row| col::<i64>(row, 0))?;
            Ok(lock.is_some_and(|l| l != 0))
        })
    }

    /// The record following `id` in time. Nothing follows id 0.
    pub fn get_next(&self, kind: HistoryKind, key: &str, id: i64) -> Result<Option<(i64, String)>> {
        if id == 0 {
            self.worker.drain()?;
            return Ok(None);
        }
        self.read(|conn| {
            first_row(conn, schema::HISTORY_GET_NEXT, params![id, kind as i64, key], id_and_name)
        })
    }

    /// The record preceding `id` in time; id 0 means the newest record.
    /// With no predecessor this falls back to `id` itself, if it still
    /// exists.
    pub fn get_prev(&self, kind: HistoryKind, key: &str, id: i64) -> Result<Option<(i64, String)>> {
        match self.prev_or_newest(kind, key, id)? {
            Some(found) => Ok(Some(found)),
            None if id != 0 => Ok(self.get(id)?.map(|name| (id, name))),
            None => Ok(None),
        }
    }

    /// Like [`HistoryStore::get_prev`], but with no predecessor the result
    /// is nothing, so callers can detect the start of the list and wrap.
    pub fn cyclic_get_prev(&self, kind: HistoryKind, key: &str, id: i64) -> Result<Option<(i64, String)>> {
        self.prev_or_newest(kind, key, id)
    }

    fn prev_or_newest(&self, kind: HistoryKind, key: &str, id: i64) -> Result<Option<(i64, String)>> {
        self.read(|conn| {
            if id == 0 {
                first_row(conn, schema::HISTORY_GET_NEWEST, params![kind as i64, key], id_and_name)
            } else {
                first_row(conn, schema::HISTORY_GET_PREV, params![id, kind as i64, key], id_and_name)
            }
        })
    }
}

impl Transactional for HistoryStore {
    fn database(&self) -> &Database {
        &self.db
    }

    fn begin_transaction(&self) -> Result<()> {
        self.worker.drain()?;
        self.db.begin_transaction()
    }

    /// The commit is queued behind pending writes and applied by the writer.
    fn end_transaction(&self) -> Result<()> {
        self.worker.send(WorkItem::Commit)?;
        self.worker.drain()
    }

    fn flush(&self) -> Result<()> {
        self.worker.drain()?;
        self.db.flush()
    }
}
