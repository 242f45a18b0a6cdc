/// cfgvault-core/src/vault/schema.rs
/// Table definitions and statements for every store.
use crate::db::Schema;

// ════════════════════════════════════════════════════════════════════
// Flat settings
// ════════════════════════════════════════════════════════════════════

pub const FLAT: Schema = Schema {
    tables: r#"
CREATE TABLE IF NOT EXISTS general_config (
    key TEXT NOT NULL,
    name TEXT NOT NULL,
    value BLOB,
    PRIMARY KEY (key, name)
);
"#,
    foreign_keys: false,
    wal: false,
};

pub const FLAT_SET: &str = "REPLACE INTO general_config VALUES (?1, ?2, ?3)";
pub const FLAT_GET: &str = "SELECT value FROM general_config WHERE key = ?1 AND name = ?2";
pub const FLAT_DELETE: &str = "DELETE FROM general_config WHERE key = ?1 AND name = ?2";
pub const FLAT_ENUM: &str = "SELECT name, value FROM general_config WHERE key = ?1";
pub const FLAT_ENUM_ALL: &str =
    "SELECT key, name, value FROM general_config ORDER BY key, name";

// ════════════════════════════════════════════════════════════════════
// Hierarchical settings
// ════════════════════════════════════════════════════════════════════

/// Key 0 is the synthetic root. Values can never hang off it.
pub const HIERARCHICAL: Schema = Schema {
    tables: r#"
CREATE TABLE IF NOT EXISTS table_keys (
    id INTEGER PRIMARY KEY,
    parent_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    FOREIGN KEY(parent_id) REFERENCES table_keys(id) ON UPDATE CASCADE ON DELETE CASCADE,
    UNIQUE (parent_id, name)
);

CREATE TABLE IF NOT EXISTS table_values (
    key_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    value BLOB,
    FOREIGN KEY(key_id) REFERENCES table_keys(id) ON UPDATE CASCADE ON DELETE CASCADE,
    PRIMARY KEY (key_id, name),
    CHECK (key_id <> 0)
);

INSERT OR IGNORE INTO table_keys VALUES (0, 0, '', 'Root - do not edit');
"#,
    foreign_keys: true,
    wal: false,
};

pub const KEY_CREATE: &str = "INSERT OR IGNORE INTO table_keys VALUES (NULL, ?1, ?2, ?3)";
pub const KEY_FIND: &str =
    "SELECT id FROM table_keys WHERE parent_id = ?1 AND name = ?2 AND id <> 0";
pub const KEY_GET_DESCRIPTION: &str =
    "SELECT description FROM table_keys WHERE id = ?1 AND id <> 0";
pub const KEY_SET_DESCRIPTION: &str = "UPDATE table_keys SET description = ?1 \
     WHERE id = ?2 AND id <> 0 AND (description IS NULL OR description <> ?1)";
pub const KEY_ENUM: &str =
    "SELECT id, name FROM table_keys WHERE parent_id = ?1 AND id <> 0 ORDER BY id";
pub const KEY_ENUM_FULL: &str =
    "SELECT id, name, description FROM table_keys WHERE parent_id = ?1 AND id <> 0 ORDER BY id";
pub const KEY_DELETE_TREE: &str = "DELETE FROM table_keys WHERE id = ?1 AND id <> 0";

pub const VALUE_SET: &str = "REPLACE INTO table_values VALUES (?1, ?2, ?3)";
pub const VALUE_GET: &str = "SELECT value FROM table_values WHERE key_id = ?1 AND name = ?2";
pub const VALUE_ENUM: &str =
    "SELECT name, value FROM table_values WHERE key_id = ?1 ORDER BY name";
pub const VALUE_DELETE: &str = "DELETE FROM table_values WHERE key_id = ?1 AND name = ?2";

// ════════════════════════════════════════════════════════════════════
// Colors
// ════════════════════════════════════════════════════════════════════

pub const COLORS: Schema = Schema {
    tables: r#"
CREATE TABLE IF NOT EXISTS colors (
    name TEXT NOT NULL PRIMARY KEY,
    value BLOB
);
"#,
    foreign_keys: false,
    wal: false,
};

pub const COLOR_SET: &str = "REPLACE INTO colors VALUES (?1, ?2)";
pub const COLOR_GET: &str = "SELECT value FROM colors WHERE name = ?1";
pub const COLOR_DELETE: &str = "DELETE FROM colors WHERE name = ?1";
pub const COLOR_ENUM_ALL: &str = "SELECT name, value FROM colors ORDER BY name";

// ════════════════════════════════════════════════════════════════════
// File associations
// ════════════════════════════════════════════════════════════════════

pub const ASSOCIATIONS: Schema = Schema {
    tables: r#"
CREATE TABLE IF NOT EXISTS filetypes (
    id INTEGER PRIMARY KEY,
    weight INTEGER NOT NULL,
    mask TEXT,
    description TEXT
);

CREATE TABLE IF NOT EXISTS commands (
    ft_id INTEGER NOT NULL,
    type INTEGER NOT NULL,
    enabled INTEGER NOT NULL,
    command TEXT,
    FOREIGN KEY(ft_id) REFERENCES filetypes(id) ON UPDATE CASCADE ON DELETE CASCADE,
    PRIMARY KEY (ft_id, type)
);
"#,
    foreign_keys: true,
    wal: false,
};

/// Make room after ?1 (0 = the head of the list).
pub const TYPE_REORDER: &str = "UPDATE filetypes SET weight = weight + 1 WHERE weight > \
     (CASE ?1 WHEN 0 THEN 0 ELSE (SELECT weight FROM filetypes WHERE id = ?1) END)";
pub const TYPE_ADD: &str = "INSERT INTO filetypes VALUES (NULL, \
     (CASE ?1 WHEN 0 THEN 1 ELSE (SELECT weight FROM filetypes WHERE id = ?1) + 1 END), ?2, ?3)";
pub const TYPE_GET_MASK: &str = "SELECT mask FROM filetypes WHERE id = ?1";
pub const TYPE_GET_DESCRIPTION: &str = "SELECT description FROM filetypes WHERE id = ?1";
pub const TYPE_UPDATE: &str = "UPDATE filetypes SET mask = ?1, description = ?2 WHERE id = ?3";
pub const TYPE_DELETE: &str = "DELETE FROM filetypes WHERE id = ?1";
pub const TYPE_DELETE_ALL: &str = "DELETE FROM filetypes";
pub const TYPE_GET_WEIGHT: &str = "SELECT weight FROM filetypes WHERE id = ?1";
pub const TYPE_SET_WEIGHT: &str = "UPDATE filetypes SET weight = ?1 WHERE id = ?2";
pub const TYPE_ENUM: &str = "SELECT id, description FROM filetypes ORDER BY weight";
pub const TYPE_ENUM_MASKS: &str = "SELECT id, mask FROM filetypes ORDER BY weight";
pub const TYPE_ENUM_MASKS_FOR_TYPE: &str = "SELECT id, mask FROM filetypes, commands \
     WHERE id = ft_id AND type = ?1 AND enabled <> 0 ORDER BY weight";
pub const TYPE_ENUM_ALL: &str = "SELECT id, mask, description FROM filetypes ORDER BY weight";
pub const COMMAND_SET: &str = "REPLACE INTO commands VALUES (?1, ?2, ?3, ?4)";
pub const COMMAND_GET: &str = "SELECT command, enabled FROM commands WHERE ft_id = ?1 AND type = ?2";
pub const COMMAND_ENUM: &str =
    "SELECT type, enabled, command FROM commands WHERE ft_id = ?1 ORDER BY type";

// ════════════════════════════════════════════════════════════════════
// Plugin cache
// ════════════════════════════════════════════════════════════════════

pub const PLUGIN_CACHE: Schema = Schema {
    tables: r#"
CREATE TABLE IF NOT EXISTS cachename (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE);
CREATE TABLE IF NOT EXISTS preload (cid INTEGER NOT NULL PRIMARY KEY, enabled INTEGER NOT NULL,
    FOREIGN KEY(cid) REFERENCES cachename(id) ON UPDATE CASCADE ON DELETE CASCADE);
CREATE TABLE IF NOT EXISTS signatures (cid INTEGER NOT NULL PRIMARY KEY, signature TEXT NOT NULL,
    FOREIGN KEY(cid) REFERENCES cachename(id) ON UPDATE CASCADE ON DELETE CASCADE);
CREATE TABLE IF NOT EXISTS guids (cid INTEGER NOT NULL PRIMARY KEY, guid TEXT NOT NULL,
    FOREIGN KEY(cid) REFERENCES cachename(id) ON UPDATE CASCADE ON DELETE CASCADE);
CREATE TABLE IF NOT EXISTS titles (cid INTEGER NOT NULL PRIMARY KEY, title TEXT NOT NULL,
    FOREIGN KEY(cid) REFERENCES cachename(id) ON UPDATE CASCADE ON DELETE CASCADE);
CREATE TABLE IF NOT EXISTS authors (cid INTEGER NOT NULL PRIMARY KEY, author TEXT NOT NULL,
    FOREIGN KEY(cid) REFERENCES cachename(id) ON UPDATE CASCADE ON DELETE CASCADE);
CREATE TABLE IF NOT EXISTS descriptions (cid INTEGER NOT NULL PRIMARY KEY, description TEXT NOT NULL,
    FOREIGN KEY(cid) REFERENCES cachename(id) ON UPDATE CASCADE ON DELETE CASCADE);
CREATE TABLE IF NOT EXISTS minhostversions (cid INTEGER NOT NULL PRIMARY KEY, version BLOB NOT NULL,
    FOREIGN KEY(cid) REFERENCES cachename(id) ON UPDATE CASCADE ON DELETE CASCADE);
CREATE TABLE IF NOT EXISTS pluginversions (cid INTEGER NOT NULL PRIMARY KEY, version BLOB NOT NULL,
    FOREIGN KEY(cid) REFERENCES cachename(id) ON UPDATE CASCADE ON DELETE CASCADE);
CREATE TABLE IF NOT EXISTS flags (cid INTEGER NOT NULL PRIMARY KEY, bitmask INTEGER NOT NULL,
    FOREIGN KEY(cid) REFERENCES cachename(id) ON UPDATE CASCADE ON DELETE CASCADE);
CREATE TABLE IF NOT EXISTS prefixes (cid INTEGER NOT NULL PRIMARY KEY, prefix TEXT NOT NULL,
    FOREIGN KEY(cid) REFERENCES cachename(id) ON UPDATE CASCADE ON DELETE CASCADE);
CREATE TABLE IF NOT EXISTS exports (cid INTEGER NOT NULL, export TEXT NOT NULL, enabled INTEGER NOT NULL,
    FOREIGN KEY(cid) REFERENCES cachename(id) ON UPDATE CASCADE ON DELETE CASCADE,
    PRIMARY KEY (cid, export));
CREATE TABLE IF NOT EXISTS menuitems (cid INTEGER NOT NULL, type INTEGER NOT NULL, number INTEGER NOT NULL,
    guid TEXT NOT NULL, name TEXT NOT NULL,
    FOREIGN KEY(cid) REFERENCES cachename(id) ON UPDATE CASCADE ON DELETE CASCADE,
    PRIMARY KEY (cid, type, number));
"#,
    foreign_keys: true,
    wal: true,
};

pub const CACHE_CREATE: &str = "INSERT INTO cachename VALUES (NULL, ?1)";
pub const CACHE_FIND: &str = "SELECT id FROM cachename WHERE name = ?1";
pub const CACHE_DELETE: &str = "DELETE FROM cachename WHERE name = ?1";
pub const CACHE_DELETE_ALL: &str = "DELETE FROM cachename";
pub const CACHE_COUNT: &str = "SELECT count(name) FROM cachename";
pub const CACHE_ENUM: &str = "SELECT name FROM cachename ORDER BY name";
pub const CACHE_GET_EXPORT: &str = "SELECT enabled FROM exports WHERE cid = ?1 AND export = ?2";
pub const CACHE_SET_EXPORT: &str = "REPLACE INTO exports VALUES (?1, ?2, ?3)";
pub const CACHE_GET_MENU_ITEM: &str =
    "SELECT name, guid FROM menuitems WHERE cid = ?1 AND type = ?2 AND number = ?3";
pub const CACHE_SET_MENU_ITEM: &str = "REPLACE INTO menuitems VALUES (?1, ?2, ?3, ?4, ?5)";

// ════════════════════════════════════════════════════════════════════
// Plugin hotkeys
// ════════════════════════════════════════════════════════════════════

pub const HOTKEYS: Schema = Schema {
    tables: r#"
CREATE TABLE IF NOT EXISTS pluginhotkeys (
    pluginkey TEXT NOT NULL,
    menuguid TEXT NOT NULL,
    type INTEGER NOT NULL,
    hotkey TEXT,
    PRIMARY KEY (pluginkey, menuguid, type)
);
"#,
    foreign_keys: false,
    wal: false,
};

pub const HOTKEY_GET: &str =
    "SELECT hotkey FROM pluginhotkeys WHERE pluginkey = ?1 AND menuguid = ?2 AND type = ?3";
pub const HOTKEY_SET: &str = "REPLACE INTO pluginhotkeys VALUES (?1, ?2, ?3, ?4)";
pub const HOTKEY_DELETE: &str =
    "DELETE FROM pluginhotkeys WHERE pluginkey = ?1 AND menuguid = ?2 AND type = ?3";
pub const HOTKEY_COUNT: &str = "SELECT count(hotkey) FROM pluginhotkeys WHERE type = ?1";
pub const HOTKEY_ENUM_PLUGINS: &str =
    "SELECT pluginkey FROM pluginhotkeys GROUP BY pluginkey ORDER BY pluginkey";
pub const HOTKEY_ENUM_FOR_PLUGIN: &str =
    "SELECT menuguid, type, hotkey FROM pluginhotkeys WHERE pluginkey = ?1 ORDER BY menuguid, type";

// ════════════════════════════════════════════════════════════════════
// History
// ════════════════════════════════════════════════════════════════════

pub const HISTORY: Schema = Schema {
    tables: r#"
CREATE TABLE IF NOT EXISTS history (
    id INTEGER PRIMARY KEY,
    kind INTEGER NOT NULL,
    key TEXT NOT NULL,
    type INTEGER NOT NULL,
    lock INTEGER NOT NULL,
    name TEXT NOT NULL,
    time INTEGER NOT NULL,
    guid TEXT NOT NULL,
    file TEXT NOT NULL,
    data TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS history_idx1 ON history (kind, key);
CREATE INDEX IF NOT EXISTS history_idx2 ON history (kind, key, time);
CREATE INDEX IF NOT EXISTS history_idx3 ON history (kind, key, lock DESC, time DESC);
CREATE INDEX IF NOT EXISTS history_idx4 ON history (kind, key, time DESC);

CREATE TABLE IF NOT EXISTS editorposition_history (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
    time INTEGER NOT NULL,
    line INTEGER NOT NULL,
    linepos INTEGER NOT NULL,
    screenline INTEGER NOT NULL,
    leftpos INTEGER NOT NULL,
    codepage INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS editorbookmarks_history (
    pid INTEGER NOT NULL,
    num INTEGER NOT NULL,
    line INTEGER NOT NULL,
    linepos INTEGER NOT NULL,
    screenline INTEGER NOT NULL,
    leftpos INTEGER NOT NULL,
    FOREIGN KEY(pid) REFERENCES editorposition_history(id) ON UPDATE CASCADE ON DELETE CASCADE,
    PRIMARY KEY (pid, num)
);

CREATE INDEX IF NOT EXISTS editorposition_history_idx1 ON editorposition_history (time DESC);

CREATE TABLE IF NOT EXISTS viewerposition_history (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
    time INTEGER NOT NULL,
    filepos INTEGER NOT NULL,
    leftpos INTEGER NOT NULL,
    hex INTEGER NOT NULL,
    codepage INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS viewerbookmarks_history (
    pid INTEGER NOT NULL,
    num INTEGER NOT NULL,
    filepos INTEGER NOT NULL,
    leftpos INTEGER NOT NULL,
    FOREIGN KEY(pid) REFERENCES viewerposition_history(id) ON UPDATE CASCADE ON DELETE CASCADE,
    PRIMARY KEY (pid, num)
);

CREATE INDEX IF NOT EXISTS viewerposition_history_idx1 ON viewerposition_history (time DESC);
"#,
    foreign_keys: true,
    wal: true,
};

pub const HISTORY_ENUM: &str = "SELECT id, kind, key, name, type, lock, time, guid, file, data \
     FROM history WHERE kind = ?1 AND key = ?2 ORDER BY time";
pub const HISTORY_ENUM_DESC: &str = "SELECT id, kind, key, name, type, lock, time, guid, file, data \
     FROM history WHERE kind = ?1 AND key = ?2 ORDER BY lock DESC, time DESC";
pub const HISTORY_ADD: &str = "INSERT INTO history VALUES (NULL, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";
pub const HISTORY_DELETE: &str = "DELETE FROM history WHERE id = ?1";
/// The `NOT IN` subquery keeps the ?4 most relevant records whatever their age.
pub const HISTORY_DELETE_OLD_UNLOCKED: &str = "DELETE FROM history \
     WHERE kind = ?1 AND key = ?2 AND lock = 0 AND time < ?3 AND id NOT IN \
     (SELECT id FROM history WHERE kind = ?1 AND key = ?2 ORDER BY lock DESC, time DESC LIMIT ?4)";
pub const HISTORY_ENUM_LARGE: &str = "SELECT key FROM \
     (SELECT key, count(id) AS num FROM history WHERE kind = ?1 GROUP BY key) \
     WHERE num > ?2 ORDER BY key";
pub const HISTORY_GET_NAME: &str = "SELECT name FROM history WHERE id = ?1";
pub const HISTORY_GET_RECORD: &str = "SELECT id, kind, key, name, type, lock, time, guid, file, data \
     FROM history WHERE id = ?1";
pub const HISTORY_GET_NEWEST_NAME: &str = "SELECT name FROM history \
     WHERE kind = ?1 AND key = ?2 ORDER BY lock DESC, time DESC LIMIT 1";
pub const HISTORY_COUNT: &str = "SELECT count(id) FROM history WHERE kind = ?1 AND key = ?2";
pub const HISTORY_DELETE_UNLOCKED: &str =
    "DELETE FROM history WHERE kind = ?1 AND key = ?2 AND lock = 0";
pub const HISTORY_GET_LOCK: &str = "SELECT lock FROM history WHERE id = ?1";
pub const HISTORY_SET_LOCK: &str = "UPDATE history SET lock = ?1 WHERE id = ?2";
pub const HISTORY_GET_NEXT: &str = "SELECT a.id, a.name FROM history AS a, history AS b \
     WHERE b.id = ?1 AND a.kind = ?2 AND a.key = ?3 AND a.time > b.time \
     ORDER BY a.time LIMIT 1";
pub const HISTORY_GET_PREV: &str = "SELECT a.id, a.name FROM history AS a, history AS b \
     WHERE b.id = ?1 AND a.kind = ?2 AND a.key = ?3 AND a.time < b.time \
     ORDER BY a.time DESC LIMIT 1";
pub const HISTORY_GET_NEWEST: &str = "SELECT id, name FROM history \
     WHERE kind = ?1 AND key = ?2 ORDER BY time DESC LIMIT 1";

pub const EDITOR_POS_SET: &str =
    "REPLACE INTO editorposition_history VALUES (NULL, ?1, ?2, ?3, ?4, ?5, ?6, ?7)";
pub const EDITOR_POS_GET: &str = "SELECT id, line, linepos, screenline, leftpos, codepage \
     FROM editorposition_history WHERE name = ?1 COLLATE NOCASE";
pub const EDITOR_BOOKMARK_SET: &str =
    "REPLACE INTO editorbookmarks_history VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
pub const EDITOR_BOOKMARK_GET: &str = "SELECT line, linepos, screenline, leftpos \
     FROM editorbookmarks_history WHERE pid = ?1 AND num = ?2";
pub const EDITOR_DELETE_OLD: &str = "DELETE FROM editorposition_history WHERE time < ?1 \
     AND id NOT IN (SELECT id FROM editorposition_history ORDER BY time DESC LIMIT ?2)";

pub const VIEWER_POS_SET: &str =
    "REPLACE INTO viewerposition_history VALUES (NULL, ?1, ?2, ?3, ?4, ?5, ?6)";
pub const VIEWER_POS_GET: &str = "SELECT id, filepos, leftpos, hex, codepage \
     FROM viewerposition_history WHERE name = ?1 COLLATE NOCASE";
pub const VIEWER_BOOKMARK_SET: &str = "REPLACE INTO viewerbookmarks_history VALUES (?1, ?2, ?3, ?4)";
pub const VIEWER_BOOKMARK_GET: &str = "SELECT filepos, leftpos \
     FROM viewerbookmarks_history WHERE pid = ?1 AND num = ?2";
pub const VIEWER_DELETE_OLD: &str = "DELETE FROM viewerposition_history WHERE time < ?1 \
     AND id NOT IN (SELECT id FROM viewerposition_history ORDER BY time DESC LIMIT ?2)";
