//! Renames of filter fields from the older layout.
//!
//! A field is rewritten only when its current name is absent and the legacy
//! value converts; the legacy value is then removed. Running a migration
//! twice changes nothing.

use crate::column::Payload;
use crate::error::Result;
use crate::traits::{Transactional, TypedAccess};
use crate::vault::{BlobProjection, HierarchicalStore, Key};

type Convert = fn(&Payload) -> Option<Payload>;

/// `(legacy name, current name, converter)`.
pub const FILTER_MIGRATIONS: &[(&str, &str, Convert)] = &[
    ("IgnoreMask", "UseMask", invert),
    ("DateAfter", "DateTimeAfter", ticks),
    ("DateBefore", "DateTimeBefore", ticks),
    ("RelativeDate", "DateRelative", integer),
    ("IncludeAttributes", "AttrSet", integer),
    ("ExcludeAttributes", "AttrClear", integer),
];

fn invert(value: &Payload) -> Option<Payload> {
    value.as_integer().map(|v| Payload::Integer(i64::from(v == 0)))
}

/// Dates used to be raw 8-byte little-endian blobs.
fn ticks(value: &Payload) -> Option<Payload> {
    match value {
        Payload::Integer(v) => Some(Payload::Integer(*v)),
        Payload::Blob(bytes) => {
            let bytes: [u8; 8] = bytes.as_slice().try_into().ok()?;
            Some(Payload::Integer(i64::from_le_bytes(bytes)))
        }
        Payload::Text(_) => None,
    }
}

fn integer(value: &Payload) -> Option<Payload> {
    value.as_integer().map(Payload::Integer)
}

/// Migrate the values of one key. Returns how many fields were rewritten.
pub fn migrate_key<P: BlobProjection>(store: &HierarchicalStore<P>, key: Key) -> Result<usize> {
    let mut migrated = 0;
    for (legacy, current, convert) in FILTER_MIGRATIONS {
        if store.get_value(&key, current)?.is_some() {
            continue;
        }
        let Some(value) = store.get_value(&key, legacy)?.as_ref().and_then(convert) else {
            continue;
        };
        store.set_value(&key, current, value)?;
        store.delete_value(&key, legacy)?;
        tracing::debug!("Migrated {} to {} in key {}", legacy, current, key.id());
        migrated += 1;
    }
    Ok(migrated)
}

/// Migrate every key of the store.
pub fn migrate_tree<P: BlobProjection>(store: &HierarchicalStore<P>) -> Result<usize> {
    store.database().transaction(|| {
        let mut migrated = 0;
        let mut pending = vec![Key::ROOT];
        while let Some(parent) = pending.pop() {
            let mut children = store.enum_keys(parent);
            let keys: Vec<Key> = children.by_ref().map(|(key, _)| key).collect();
            if let Some(err) = children.error() {
                tracing::warn!("Could not list keys under {}: {}", parent.id(), err);
            }
            for key in keys {
                migrated += migrate_key(store, key)?;
                pending.push(key);
            }
        }
        if migrated > 0 {
            tracing::info!("Migrated {} legacy filter fields", migrated);
        }
        Ok(migrated)
    })
}
