//! Tree of named keys, each owning named typed values.
//!
//! Key 0 is a synthetic root: it is never returned by enumeration, values
//! cannot be attached to it and it cannot be deleted. Deleting any other key
//! removes its whole subtree through the foreign key cascade.

use crate::column::{col, Payload};
use crate::cursor::{collect_rows, exec, first_row, Cursor};
use crate::db::{Database, Location};
use crate::error::{Result, StoreError};
use crate::traits::{Exportable, Transactional, TypedAccess};
use crate::vault::colors::Color;
use crate::vault::{read_payload, schema, write_payload};
use cfgvault_repr::codec::{decode_hex, encode_hex};
use cfgvault_repr::{Element, TypeTag};
use rusqlite::params;

pub const EXPORT_ELEMENT: &str = "hierarchicalconfig";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(i64);

impl Key {
    pub const ROOT: Key = Key(0);

    pub fn from_id(id: i64) -> Self {
        Self(id)
    }

    pub fn id(self) -> i64 {
        self.0
    }

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

// ════════════════════════════════════════════════════════════════════
// Blob projection
// ════════════════════════════════════════════════════════════════════

/// How blob values appear in the representation document.
pub trait BlobProjection {
    fn serialize(&self, _name: &str, blob: &[u8], e: &mut Element) {
        e.set_attr("type", TypeTag::Hex.as_str());
        e.set_attr("value", encode_hex(blob));
    }

    /// Called for every value element the standard codec does not handle.
    /// `None` skips the element.
    fn deserialize(&self, _tag: &TypeTag, e: &Element) -> Option<Vec<u8>> {
        e.attr("value").and_then(decode_hex)
    }
}

/// Plain `hex` blobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexBlobs;

impl BlobProjection for HexBlobs {}

/// Highlight groups keep their colors as `type="color"` elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighlightBlobs;

impl HighlightBlobs {
    pub const COLOR_VALUES: [&'static str; 8] = [
        "NormalColor",
        "SelectedColor",
        "CursorColor",
        "SelectedCursorColor",
        "MarkCharNormalColor",
        "MarkCharSelectedColor",
        "MarkCharCursorColor",
        "MarkCharSelectedCursorColor",
    ];
}

impl BlobProjection for HighlightBlobs {
    fn serialize(&self, name: &str, blob: &[u8], e: &mut Element) {
        if Self::COLOR_VALUES.contains(&name) {
            if let Some(color) = Color::from_bytes(blob) {
                color.write_attrs(e);
                return;
            }
        }
        HexBlobs.serialize(name, blob, e);
    }

    fn deserialize(&self, tag: &TypeTag, e: &Element) -> Option<Vec<u8>> {
        match tag.as_str() {
            Color::TYPE_TAG => Color::from_attrs(e).map(|color| color.to_bytes().to_vec()),
            _ => HexBlobs.deserialize(tag, e),
        }
    }
}

// ════════════════════════════════════════════════════════════════════
// Store
// ════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub struct HierarchicalStore<P: BlobProjection = HexBlobs> {
    db: Database,
    projection: P,
}

impl HierarchicalStore<HexBlobs> {
    pub fn open(location: &Location) -> Result<Self> {
        Self::open_with(location, HexBlobs)
    }
}

impl<P: BlobProjection> HierarchicalStore<P> {
    pub fn open_with(location: &Location, projection: P) -> Result<Self> {
        Ok(Self {
            db: Database::open(location, &schema::HIERARCHICAL)?,
            projection,
        })
    }

    /// Idempotent: an existing key under `parent` is returned as is, only its
    /// description is brought up to date.
    pub fn create_key(&self, parent: Key, name: &str, description: Option<&str>) -> Result<Key> {
        let mut key = self.find_key(parent, name)?;
        if key.is_root() {
            key = self.db.with(|conn| {
                if exec(conn, schema::KEY_CREATE, params![parent.id(), name, description])? == 1 {
                    return Ok(Key(conn.last_insert_rowid()));
                }
                // Ignored: the name is taken, possibly by the root row itself.
                let id = first_row(conn, schema::KEY_FIND, params![parent.id(), name], |row| {
                    col::<i64>(row, 0)
                })?;
                id.map(Key).ok_or(StoreError::RootKey)
            })?;
        }
        if let Some(description) = description {
            self.set_key_description(key, description)?;
        }
        Ok(key)
    }

    /// [`Key::ROOT`] when there is no such key.
    pub fn find_key(&self, parent: Key, name: &str) -> Result<Key> {
        self.db.with(|conn| {
            let id = first_row(conn, schema::KEY_FIND, params![parent.id(), name], |row| {
                col::<i64>(row, 0)
            })?;
            Ok(id.map_or(Key::ROOT, Key))
        })
    }

    pub fn key_description(&self, key: Key) -> Result<Option<String>> {
        self.db.with(|conn| {
            let description = first_row(conn, schema::KEY_GET_DESCRIPTION, params![key.id()], |row| {
                col::<Option<String>>(row, 0)
            })?;
            Ok(description.flatten())
        })
    }

    /// Writes only when the stored description differs.
    pub fn set_key_description(&self, key: Key, description: &str) -> Result<()> {
        self.db.with(|conn| {
            exec(conn, schema::KEY_SET_DESCRIPTION, params![description, key.id()])?;
            Ok(())
        })
    }

    pub fn enum_keys(&self, parent: Key) -> Cursor<'_, (Key, String)> {
        Cursor::new(move || {
            self.db.with(|conn| {
                collect_rows(conn, schema::KEY_ENUM, params![parent.id()], |row| {
                    Ok((Key(col(row, 0)?), col(row, 1)?))
                })
            })
        })
    }

    pub fn enum_values(&self, key: Key) -> Cursor<'_, (String, Payload)> {
        Cursor::new(move || {
            let rows = self.db.with(|conn| {
                collect_rows(conn, schema::VALUE_ENUM, params![key.id()], |row| {
                    Ok((col::<String>(row, 0)?, col::<Option<Payload>>(row, 1)?))
                })
            })?;
            Ok(rows
                .into_iter()
                .filter_map(|(name, value)| value.map(|value| (name, value)))
                .collect())
        })
    }

    /// Remove `key` with every descendant key and value.
    pub fn delete_key_tree(&self, key: Key) -> Result<()> {
        if key.is_root() {
            return Err(StoreError::RootKey);
        }
        self.db.with(|conn| {
            exec(conn, schema::KEY_DELETE_TREE, params![key.id()])?;
            Ok(())
        })
    }

    fn export_key(&self, key: Key, into: &mut Element) -> Result<()> {
        let values = self.db.with(|conn| {
            collect_rows(conn, schema::VALUE_ENUM, params![key.id()], |row| {
                Ok((col::<String>(row, 0)?, col::<Option<Payload>>(row, 1)?))
            })
        })?;
        for (name, value) in values {
            let e = into.add_child("value");
            e.set_attr("name", name.as_str());
            match value {
                Some(Payload::Blob(blob)) => self.projection.serialize(&name, &blob, e),
                other => write_payload(e, other.as_ref()),
            }
        }

        let children = self.db.with(|conn| {
            collect_rows(conn, schema::KEY_ENUM_FULL, params![key.id()], |row| {
                Ok((
                    Key(col(row, 0)?),
                    col::<String>(row, 1)?,
                    col::<Option<String>>(row, 2)?,
                ))
            })
        })?;
        for (child, name, description) in children {
            let e = into.add_child("key");
            e.set_attr("name", name);
            if let Some(description) = description.filter(|d| !d.is_empty()) {
                e.set_attr("description", description);
            }
            self.export_key(child, e)?;
        }
        Ok(())
    }

    fn import_key(&self, parent: Key, e: &Element) -> Result<()> {
        let Some(name) = e.attr("name") else {
            tracing::debug!("Skipping key element without a name");
            return Ok(());
        };
        let key = match self.create_key(parent, name, e.attr("description")) {
            Err(StoreError::RootKey) => {
                tracing::debug!("Skipping key element named like the root");
                return Ok(());
            }
            other => other?,
        };

        for v in e.children_named("value") {
            let (Some(name), Some(tag)) = (v.attr("name"), v.attr("type")) else {
                tracing::debug!("Skipping incomplete value element");
                continue;
            };
            let tag = TypeTag::parse(tag);
            let payload = match (v.attr("value"), &tag) {
                (Some(value), TypeTag::Qword | TypeTag::Text | TypeTag::Hex) => {
                    read_payload(&tag, value)
                }
                _ => self.projection.deserialize(&tag, v).map(Payload::Blob),
            };
            match payload {
                Some(payload) => self.set_value(&key, name, payload)?,
                None => tracing::debug!("Skipping value {} of type {}", name, tag),
            }
        }

        for child in e.children_named("key") {
            self.import_key(key, child)?;
        }
        Ok(())
    }
}

impl<P: BlobProjection> TypedAccess for HierarchicalStore<P> {
    type Owner = Key;

    fn set_value(&self, key: &Key, name: &str, value: impl Into<Payload>) -> Result<()> {
        if key.is_root() {
            return Err(StoreError::RootKey);
        }
        let value = value.into();
        self.db.with(|conn| {
            exec(conn, schema::VALUE_SET, params![key.id(), name, value])?;
            Ok(())
        })
    }

    fn get_value(&self, key: &Key, name: &str) -> Result<Option<Payload>> {
        if key.is_root() {
            return Ok(None);
        }
        self.db.with(|conn| {
            let value = first_row(conn, schema::VALUE_GET, params![key.id(), name], |row| {
                col::<Option<Payload>>(row, 0)
            })?;
            Ok(value.flatten())
        })
    }

    fn delete_value(&self, key: &Key, name: &str) -> Result<()> {
        if key.is_root() {
            return Err(StoreError::RootKey);
        }
        self.db.with(|conn| {
            exec(conn, schema::VALUE_DELETE, params![key.id(), name])?;
            Ok(())
        })
    }
}

impl<P: BlobProjection> Transactional for HierarchicalStore<P> {
    fn database(&self) -> &Database {
        &self.db
    }
}

impl<P: BlobProjection> Exportable for HierarchicalStore<P> {
    fn export(&self, section: &mut Element) -> Result<()> {
        let root = section.add_child(EXPORT_ELEMENT);
        self.export_key(Key::ROOT, root)
    }

    fn import(&self, section: &Element) -> Result<()> {
        let Some(root) = section.first_child(EXPORT_ELEMENT) else {
            return Ok(());
        };
        self.db.transaction(|| {
            for e in root.children_named("key") {
                self.import_key(Key::ROOT, e)?;
            }
            Ok(())
        })
    }
}
