//! Flat settings: `(namespace, name) -> value`.

use crate::column::{col, Payload};
use crate::cursor::{collect_rows, exec, first_row, Cursor};
use crate::db::{Database, Location};
use crate::error::Result;
use crate::traits::{Exportable, Transactional, TypedAccess};
use crate::vault::{read_payload, schema, write_payload};
use cfgvault_repr::{Element, TypeTag};
use rusqlite::params;

/// Roaming settings section of the representation document.
pub const ROAMING_SECTION: &str = "generalconfig";
/// Machine-local settings section.
pub const LOCAL_SECTION: &str = "localconfig";

#[derive(Debug)]
pub struct FlatStore {
    db: Database,
}

impl FlatStore {
    pub fn open(location: &Location) -> Result<Self> {
        Ok(Self {
            db: Database::open(location, &schema::FLAT)?,
        })
    }

    /// Every value of one namespace. Order is whatever SQLite returns, but
    /// stays fixed until the cursor is reset.
    pub fn enum_values<'a>(&'a self, namespace: &'a str) -> Cursor<'a, (String, Payload)> {
        Cursor::new(move || {
            self.db.with(|conn| {
                collect_rows(conn, schema::FLAT_ENUM, params![namespace], |row| {
                    Ok((col(row, 0)?, col::<Option<Payload>>(row, 1)?))
                })
            })
            .map(|rows| {
                rows.into_iter()
                    .filter_map(|(name, value)| value.map(|value| (name, value)))
                    .collect()
            })
        })
    }
}

impl TypedAccess for FlatStore {
    type Owner = str;

    fn set_value(&self, namespace: &str, name: &str, value: impl Into<Payload>) -> Result<()> {
        let value = value.into();
        self.db.with(|conn| {
            exec(conn, schema::FLAT_SET, params![namespace, name, value])?;
            Ok(())
        })
    }

    fn get_value(&self, namespace: &str, name: &str) -> Result<Option<Payload>> {
        self.db.with(|conn| {
            let value = first_row(conn, schema::FLAT_GET, params![namespace, name], |row| {
                col::<Option<Payload>>(row, 0)
            })?;
            Ok(value.flatten())
        })
    }

    fn delete_value(&self, namespace: &str, name: &str) -> Result<()> {
        self.db.with(|conn| {
            exec(conn, schema::FLAT_DELETE, params![namespace, name])?;
            Ok(())
        })
    }
}

impl Transactional for FlatStore {
    fn database(&self) -> &Database {
        &self.db
    }
}

impl Exportable for FlatStore {
    fn export(&self, section: &mut Element) -> Result<()> {
        let rows = self.db.with(|conn| {
            collect_rows(conn, schema::FLAT_ENUM_ALL, [], |row| {
                Ok((
                    col::<String>(row, 0)?,
                    col::<String>(row, 1)?,
                    col::<Option<Payload>>(row, 2)?,
                ))
            })
        })?;

        for (key, name, value) in rows {
            let e = section.add_child("setting");
            e.set_attr("key", key);
            e.set_attr("name", name);
            write_payload(e, value.as_ref());
        }
        Ok(())
    }

    fn import(&self, section: &Element) -> Result<()> {
        self.db.transaction(|| {
            for e in section.children_named("setting") {
                let (Some(key), Some(name), Some(tag), Some(value)) =
                    (e.attr("key"), e.attr("name"), e.attr("type"), e.attr("value"))
                else {
                    tracing::debug!("Skipping incomplete setting element");
                    continue;
                };
                match read_payload(&TypeTag::parse(tag), value) {
                    Some(payload) => self.set_value(key, name, payload)?,
                    None => tracing::debug!("Skipping setting {}/{} of type {}", key, name, tag),
                }
            }
            Ok(())
        })
    }
}
