//! Plugin capability cache.
//!
//! One `cachename` row per plugin with one-row satellite tables hanging off
//! it. Everything here can be rebuilt by rescanning the plugins, so the
//! store takes no part in export or import.

use crate::column::col;
use crate::cursor::{collect_rows, exec, first_row, Cursor};
use crate::db::{Database, Location};
use crate::error::Result;
use crate::guid::{guid_to_string, parse_guid};
use crate::traits::Transactional;
use crate::vault::schema;
use rusqlite::params;
use uuid::Uuid;

/// Menus a plugin can add items to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuKind {
    Plugins = 0,
    Config = 1,
    Drive = 2,
}

/// `major.minor.revision.build` plus a release stage, stored as a 20-byte
/// little-endian blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VersionInfo {
    pub major: u32,
    pub minor: u32,
    pub revision: u32,
    pub build: u32,
    pub stage: u32,
}

impl VersionInfo {
    pub const SIZE: usize = 20;

    pub fn new(major: u32, minor: u32, revision: u32, build: u32, stage: u32) -> Self {
        Self {
            major,
            minor,
            revision,
            build,
            stage,
        }
    }

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        let fields = [self.major, self.minor, self.revision, self.build, self.stage];
        for (chunk, field) in bytes.chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&field.to_le_bytes());
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::SIZE {
            return None;
        }
        let mut fields = bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        Some(Self {
            major: fields.next()?,
            minor: fields.next()?,
            revision: fields.next()?,
            build: fields.next()?,
            stage: fields.next()?,
        })
    }
}

impl crate::column::FromPayload for VersionInfo {
    fn from_payload(payload: crate::column::Payload) -> Option<Self> {
        payload.as_blob().and_then(VersionInfo::from_bytes)
    }
}

/// Single-text satellites.
#[derive(Debug, Clone, Copy)]
enum TextField {
    Signature,
    Guid,
    Title,
    Author,
    Description,
    Prefix,
}

impl TextField {
    fn get_sql(self) -> &'static str {
        match self {
            Self::Signature => "SELECT signature FROM signatures WHERE cid = ?1",
            Self::Guid => "SELECT guid FROM guids WHERE cid = ?1",
            Self::Title => "SELECT title FROM titles WHERE cid = ?1",
            Self::Author => "SELECT author FROM authors WHERE cid = ?1",
            Self::Description => "SELECT description FROM descriptions WHERE cid = ?1",
            Self::Prefix => "SELECT prefix FROM prefixes WHERE cid = ?1",
        }
    }

    fn set_sql(self) -> &'static str {
        match self {
            Self::Signature => "REPLACE INTO signatures VALUES (?1, ?2)",
            Self::Guid => "REPLACE INTO guids VALUES (?1, ?2)",
            Self::Title => "REPLACE INTO titles VALUES (?1, ?2)",
            Self::Author => "REPLACE INTO authors VALUES (?1, ?2)",
            Self::Description => "REPLACE INTO descriptions VALUES (?1, ?2)",
            Self::Prefix => "REPLACE INTO prefixes VALUES (?1, ?2)",
        }
    }
}

const PRELOAD_GET: &str = "SELECT enabled FROM preload WHERE cid = ?1";
const PRELOAD_SET: &str = "REPLACE INTO preload VALUES (?1, ?2)";
const FLAGS_GET: &str = "SELECT bitmask FROM flags WHERE cid = ?1";
const FLAGS_SET: &str = "REPLACE INTO flags VALUES (?1, ?2)";
const MIN_HOST_VERSION_GET: &str = "SELECT version FROM minhostversions WHERE cid = ?1";
const MIN_HOST_VERSION_SET: &str = "REPLACE INTO minhostversions VALUES (?1, ?2)";
const PLUGIN_VERSION_GET: &str = "SELECT version FROM pluginversions WHERE cid = ?1";
const PLUGIN_VERSION_SET: &str = "REPLACE INTO pluginversions VALUES (?1, ?2)";

#[derive(Debug)]
pub struct PluginCacheStore {
    db: Database,
}

impl PluginCacheStore {
    pub fn open(location: &Location) -> Result<Self> {
        Ok(Self {
            db: Database::open(location, &schema::PLUGIN_CACHE)?,
        })
    }

    // ────────────────────────────────────────────────────────────────
    // Entries
    // ────────────────────────────────────────────────────────────────

    /// Start a fresh entry for `name`, dropping any previous one together
    /// with its satellites.
    pub fn create_cache(&self, name: &str) -> Result<i64> {
        self.db.transaction(|| {
            self.db.with(|conn| {
                exec(conn, schema::CACHE_DELETE, params![name])?;
                exec(conn, schema::CACHE_CREATE, params![name])?;
                Ok(conn.last_insert_rowid())
            })
        })
    }

    /// 0 when there is no entry for `name`.
    pub fn cache_id(&self, name: &str) -> Result<i64> {
        self.db.with(|conn| {
            let id = first_row(conn, schema::CACHE_FIND, params![name], |row| col::<i64>(row, 0))?;
            Ok(id.unwrap_or(0))
        })
    }

    pub fn discard_cache(&self) -> Result<()> {
        self.db.transaction(|| {
            self.db.with(|conn| {
                exec(conn, schema::CACHE_DELETE_ALL, [])?;
                Ok(())
            })
        })
    }

    pub fn is_cache_empty(&self) -> Result<bool> {
        self.db.with(|conn| {
            let count = first_row(conn, schema::CACHE_COUNT, [], |row| col::<i64>(row, 0))?;
            Ok(count.unwrap_or(0) == 0)
        })
    }

    /// Cached plugin names in name order.
    pub fn enum_plugins(&self) -> Cursor<'_, String> {
        Cursor::new(move || {
            self.db
                .with(|conn| collect_rows(conn, schema::CACHE_ENUM, [], |row| col(row, 0)))
        })
    }

    // ────────────────────────────────────────────────────────────────
    // Satellites
    // ────────────────────────────────────────────────────────────────

    fn get_text(&self, field: TextField, id: i64) -> Result<String> {
        self.db.with(|conn| {
            let text = first_row(conn, field.get_sql(), params![id], |row| col::<String>(row, 0))?;
            Ok(text.unwrap_or_default())
        })
    }

    fn set_text(&self, field: TextField, id: i64, text: &str) -> Result<()> {
        self.db.with(|conn| {
            exec(conn, field.set_sql(), params![id, text])?;
            Ok(())
        })
    }

    fn get_integer(&self, sql: &str, id: i64) -> Result<Option<i64>> {
        self.db
            .with(|conn| first_row(conn, sql, params![id], |row| col::<i64>(row, 0)))
    }

    fn get_version(&self, sql: &str, id: i64) -> Result<Option<VersionInfo>> {
        self.db.with(|conn| {
            let blob = first_row(conn, sql, params![id], |row| col::<Vec<u8>>(row, 0))?;
            Ok(blob.as_deref().and_then(VersionInfo::from_bytes))
        })
    }

    fn set_version(&self, sql: &str, id: i64, version: VersionInfo) -> Result<()> {
        let blob = version.to_bytes();
        self.db.with(|conn| {
            exec(conn, sql, params![id, &blob[..]])?;
            Ok(())
        })
    }

    pub fn is_preload(&self, id: i64) -> Result<bool> {
        Ok(self.get_integer(PRELOAD_GET, id)?.is_some_and(|v| v != 0))
    }

    pub fn set_preload(&self, id: i64, preload: bool) -> Result<()> {
        self.db.with(|conn| {
            exec(conn, PRELOAD_SET, params![id, preload])?;
            Ok(())
        })
    }

    pub fn signature(&self, id: i64) -> Result<String> {
        self.get_text(TextField::Signature, id)
    }

    pub fn set_signature(&self, id: i64, signature: &str) -> Result<()> {
        self.set_text(TextField::Signature, id, signature)
    }

    pub fn guid(&self, id: i64) -> Result<String> {
        self.get_text(TextField::Guid, id)
    }

    pub fn set_guid(&self, id: i64, guid: &str) -> Result<()> {
        self.set_text(TextField::Guid, id, guid)
    }

    pub fn title(&self, id: i64) -> Result<String> {
        self.get_text(TextField::Title, id)
    }

    pub fn set_title(&self, id: i64, title: &str) -> Result<()> {
        self.set_text(TextField::Title, id, title)
    }

    pub fn author(&self, id: i64) -> Result<String> {
        self.get_text(TextField::Author, id)
    }

    pub fn set_author(&self, id: i64, author: &str) -> Result<()> {
        self.set_text(TextField::Author, id, author)
    }

    pub fn description(&self, id: i64) -> Result<String> {
        self.get_text(TextField::Description, id)
    }

    pub fn set_description(&self, id: i64, description: &str) -> Result<()> {
        self.set_text(TextField::Description, id, description)
    }

    pub fn command_prefix(&self, id: i64) -> Result<String> {
        self.get_text(TextField::Prefix, id)
    }

    pub fn set_command_prefix(&self, id: i64, prefix: &str) -> Result<()> {
        self.set_text(TextField::Prefix, id, prefix)
    }

    /// 0 when unset.
    pub fn flags(&self, id: i64) -> Result<u64> {
        Ok(self.get_integer(FLAGS_GET, id)?.unwrap_or(0) as u64)
    }

    pub fn set_flags(&self, id: i64, flags: u64) -> Result<()> {
        self.db.with(|conn| {
            exec(conn, FLAGS_SET, params![id, flags as i64])?;
            Ok(())
        })
    }

    pub fn min_host_version(&self, id: i64) -> Result<Option<VersionInfo>> {
        self.get_version(MIN_HOST_VERSION_GET, id)
    }

    pub fn set_min_host_version(&self, id: i64, version: VersionInfo) -> Result<()> {
        self.set_version(MIN_HOST_VERSION_SET, id, version)
    }

    pub fn plugin_version(&self, id: i64) -> Result<Option<VersionInfo>> {
        self.get_version(PLUGIN_VERSION_GET, id)
    }

    pub fn set_plugin_version(&self, id: i64, version: VersionInfo) -> Result<()> {
        self.set_version(PLUGIN_VERSION_SET, id, version)
    }

    // ────────────────────────────────────────────────────────────────
    // Exports and menu items
    // ────────────────────────────────────────────────────────────────

    /// Whether the plugin exports `name`. An empty name is never exported.
    pub fn export_state(&self, id: i64, name: &str) -> Result<bool> {
        if name.is_empty() {
            return Ok(false);
        }
        self.db.with(|conn| {
            let enabled = first_row(conn, schema::CACHE_GET_EXPORT, params![id, name], |row| {
                col::<i64>(row, 0)
            })?;
            Ok(enabled.is_some_and(|v| v != 0))
        })
    }

    /// Ignored for an empty name.
    pub fn set_export_state(&self, id: i64, name: &str, exists: bool) -> Result<()> {
        if name.is_empty() {
            return Ok(());
        }
        self.db.with(|conn| {
            exec(conn, schema::CACHE_SET_EXPORT, params![id, name, exists])?;
            Ok(())
        })
    }

    /// Item text and GUID. An item whose stored GUID does not parse reads as
    /// absent.
    pub fn menu_item(&self, id: i64, menu: MenuKind, index: usize) -> Result<Option<(String, Uuid)>> {
        let index = index as i64;
        self.db.with(|conn| {
            let item = first_row(
                conn,
                schema::CACHE_GET_MENU_ITEM,
                params![id, menu as i64, index],
                |row| Ok((col::<String>(row, 0)?, col::<String>(row, 1)?)),
            )?;
            Ok(item.and_then(|(name, guid)| Some((name, parse_guid(&guid)?))))
        })
    }

    pub fn set_menu_item(
        &self,
        id: i64,
        menu: MenuKind,
        index: usize,
        text: &str,
        guid: &Uuid,
    ) -> Result<()> {
        let index = index as i64;
        let guid = guid_to_string(guid);
        self.db.with(|conn| {
            exec(
                conn,
                schema::CACHE_SET_MENU_ITEM,
                params![id, menu as i64, index, guid, text],
            )?;
            Ok(())
        })
    }
}

impl Transactional for PluginCacheStore {
    fn database(&self) -> &Database {
        &self.db
    }
}
