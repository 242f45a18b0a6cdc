//! Plugin menu hotkeys keyed by `(plugin key, menu guid, menu kind)`.

use crate::column::col;
use crate::cursor::{collect_rows, exec, first_row};
use crate::db::{Database, Location};
use crate::error::Result;
use crate::guid::{guid_to_string, parse_guid};
use crate::traits::{Exportable, Transactional};
use crate::vault::schema;
use cfgvault_repr::Element;
use rusqlite::params;
use uuid::Uuid;

pub const EXPORT_SECTION: &str = "pluginhotkeys";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyKind {
    Drive = 0,
    Config = 1,
    Plugins = 2,
}

impl HotkeyKind {
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Drive),
            1 => Some(Self::Config),
            2 => Some(Self::Plugins),
            _ => None,
        }
    }

    /// Menu name used in the representation document.
    pub fn menu_name(self) -> &'static str {
        match self {
            Self::Drive => "drive",
            Self::Config => "config",
            Self::Plugins => "plugins",
        }
    }

    pub fn from_menu_name(name: &str) -> Option<Self> {
        match name {
            "drive" => Some(Self::Drive),
            "config" => Some(Self::Config),
            "plugins" => Some(Self::Plugins),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct HotkeyStore {
    db: Database,
}

impl HotkeyStore {
    pub fn open(location: &Location) -> Result<Self> {
        Ok(Self {
            db: Database::open(location, &schema::HOTKEYS)?,
        })
    }

    pub fn get_hotkey(&self, plugin: &str, menu: &Uuid, kind: HotkeyKind) -> Result<Option<String>> {
        let menu = guid_to_string(menu);
        self.db.with(|conn| {
            let hotkey = first_row(
                conn,
                schema::HOTKEY_GET,
                params![plugin, menu, kind as i64],
                |row| col::<Option<String>>(row, 0),
            )?;
            Ok(hotkey.flatten())
        })
    }

    pub fn set_hotkey(&self, plugin: &str, menu: &Uuid, kind: HotkeyKind, hotkey: &str) -> Result<()> {
        let menu = guid_to_string(menu);
        self.db.with(|conn| {
            exec(conn, schema::HOTKEY_SET, params![plugin, menu, kind as i64, hotkey])?;
            Ok(())
        })
    }

    pub fn delete_hotkey(&self, plugin: &str, menu: &Uuid, kind: HotkeyKind) -> Result<()> {
        let menu = guid_to_string(menu);
        self.db.with(|conn| {
            exec(conn, schema::HOTKEY_DELETE, params![plugin, menu, kind as i64])?;
            Ok(())
        })
    }

    /// Whether any hotkey of `kind` is assigned.
    pub fn hotkeys_present(&self, kind: HotkeyKind) -> Result<bool> {
        self.db.with(|conn| {
            let count = first_row(conn, schema::HOTKEY_COUNT, params![kind as i64], |row| {
                col::<i64>(row, 0)
            })?;
            Ok(count.unwrap_or(0) != 0)
        })
    }
}

impl Transactional for HotkeyStore {
    fn database(&self) -> &Database {
        &self.db
    }
}

impl Exportable for HotkeyStore {
    fn export(&self, section: &mut Element) -> Result<()> {
        let plugins: Vec<String> = self.db.with(|conn| {
            collect_rows(conn, schema::HOTKEY_ENUM_PLUGINS, [], |row| col(row, 0))
        })?;

        for plugin in plugins {
            let rows = self.db.with(|conn| {
                collect_rows(conn, schema::HOTKEY_ENUM_FOR_PLUGIN, params![plugin], |row| {
                    Ok((
                        col::<String>(row, 0)?,
                        col::<i64>(row, 1)?,
                        col::<Option<String>>(row, 2)?,
                    ))
                })
            })?;

            let p = section.add_child("plugin");
            p.set_attr("key", plugin.as_str());
            for (guid, kind, hotkey) in rows {
                let Some(kind) = HotkeyKind::from_i64(kind) else {
                    tracing::debug!("Not exporting hotkey of unknown menu kind {} for {}", kind, plugin);
                    continue;
                };
                let e = p.add_child("hotkey");
                e.set_attr("menu", kind.menu_name());
                e.set_attr("guid", guid);
                e.set_attr("hotkey", hotkey.unwrap_or_default());
            }
        }
        Ok(())
    }

    fn import(&self, section: &Element) -> Result<()> {
        self.db.transaction(|| {
            for p in section.children_named("plugin") {
                let Some(plugin) = p.attr("key") else {
                    tracing::debug!("Skipping hotkey plugin without a key");
                    continue;
                };
                for e in p.children_named("hotkey") {
                    let kind = e.attr("menu").and_then(HotkeyKind::from_menu_name);
                    let guid = e.attr("guid").and_then(parse_guid);
                    let (Some(kind), Some(guid)) = (kind, guid) else {
                        tracing::debug!("Skipping malformed hotkey of {}", plugin);
                        continue;
                    };
                    self.set_hotkey(plugin, &guid, kind, e.attr("hotkey").unwrap_or_default())?;
                }
            }
            Ok(())
        })
    }
}
