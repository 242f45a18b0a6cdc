//! Typed column layer.
//!
//! Three storage kinds: signed 64-bit integer, UTF-8 text and opaque blob.
//! Reads are strict: asking for one kind while the column holds another is an
//! error, never a cast.

use crate::error::{Result, StoreError};
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Integer,
    Text,
    Blob,
    Unknown,
}

impl ColumnKind {
    pub fn of(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Integer(_) => Self::Integer,
            ValueRef::Text(_) => Self::Text,
            ValueRef::Blob(_) => Self::Blob,
            ValueRef::Null | ValueRef::Real(_) => Self::Unknown,
        }
    }
}

/// A stored value: the tagged variant every store reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Integer(i64),
    Text(String),
    Blob(Vec<u8>),
}

impl Payload {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Integer(_) => ColumnKind::Integer,
            Self::Text(_) => ColumnKind::Text,
            Self::Blob(_) => ColumnKind::Blob,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Self::Blob(v) => Some(v),
            _ => None,
        }
    }
}

impl ToSql for Payload {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(match self {
            Self::Integer(v) => ValueRef::Integer(*v),
            Self::Text(v) => ValueRef::Text(v.as_bytes()),
            Self::Blob(v) => ValueRef::Blob(v),
        }))
    }
}

impl From<i64> for Payload {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Payload {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<u32> for Payload {
    fn from(value: u32) -> Self {
        Self::Integer(value.into())
    }
}

/// Stored through the bit pattern, like every qword.
impl From<u64> for Payload {
    fn from(value: u64) -> Self {
        Self::Integer(value as i64)
    }
}

impl From<bool> for Payload {
    fn from(value: bool) -> Self {
        Self::Integer(value.into())
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

impl From<&[u8]> for Payload {
    fn from(value: &[u8]) -> Self {
        Self::Blob(value.to_vec())
    }
}

// ════════════════════════════════════════════════════════════════════
// Strict column reads
// ════════════════════════════════════════════════════════════════════

pub trait Column: Sized {
    const KIND: ColumnKind;

    /// `None` when the value is of another kind.
    fn from_value(value: ValueRef<'_>) -> Option<Self>;
}

impl Column for i64 {
    const KIND: ColumnKind = ColumnKind::Integer;

    fn from_value(value: ValueRef<'_>) -> Option<Self> {
        match value {
            ValueRef::Integer(v) => Some(v),
            _ => None,
        }
    }
}

impl Column for String {
    const KIND: ColumnKind = ColumnKind::Text;

    fn from_value(value: ValueRef<'_>) -> Option<Self> {
        match value {
            ValueRef::Text(v) => Some(String::from_utf8_lossy(v).into_owned()),
            _ => None,
        }
    }
}

impl Column for Vec<u8> {
    const KIND: ColumnKind = ColumnKind::Blob;

    fn from_value(value: ValueRef<'_>) -> Option<Self> {
        match value {
            ValueRef::Blob(v) => Some(v.to_vec()),
            _ => None,
        }
    }
}

impl Column for Payload {
    const KIND: ColumnKind = ColumnKind::Unknown;

    fn from_value(value: ValueRef<'_>) -> Option<Self> {
        match value {
            ValueRef::Integer(v) => Some(Self::Integer(v)),
            ValueRef::Text(v) => Some(Self::Text(String::from_utf8_lossy(v).into_owned())),
            ValueRef::Blob(v) => Some(Self::Blob(v.to_vec())),
            ValueRef::Null | ValueRef::Real(_) => None,
        }
    }
}

/// Nullable columns: SQL `NULL` reads as `Some(None)`.
impl<T: Column> Column for Option<T> {
    const KIND: ColumnKind = T::KIND;

    fn from_value(value: ValueRef<'_>) -> Option<Self> {
        match value {
            ValueRef::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Read column `index` of the current row as `T`.
pub fn col<T: Column>(row: &Row<'_>, index: usize) -> Result<T> {
    let value = row.get_ref(index)?;
    T::from_value(value).ok_or(StoreError::WrongColumnKind {
        expected: T::KIND,
        actual: ColumnKind::of(value),
    })
}

pub fn column_kind(row: &Row<'_>, index: usize) -> Result<ColumnKind> {
    Ok(ColumnKind::of(row.get_ref(index)?))
}

// ════════════════════════════════════════════════════════════════════
// Typed views over a payload
// ════════════════════════════════════════════════════════════════════

/// Conversion used by typed getters. `None` means "not this shape", which
/// callers treat the same as an absent value.
pub trait FromPayload: Sized {
    fn from_payload(payload: Payload) -> Option<Self>;
}

impl FromPayload for Payload {
    fn from_payload(payload: Payload) -> Option<Self> {
        Some(payload)
    }
}

impl FromPayload for i64 {
    fn from_payload(payload: Payload) -> Option<Self> {
        payload.as_integer()
    }
}

impl FromPayload for u64 {
    fn from_payload(payload: Payload) -> Option<Self> {
        payload.as_integer().map(|v| v as u64)
    }
}

impl FromPayload for i32 {
    fn from_payload(payload: Payload) -> Option<Self> {
        payload.as_integer().and_then(|v| i32::try_from(v).ok())
    }
}

impl FromPayload for bool {
    fn from_payload(payload: Payload) -> Option<Self> {
        payload.as_integer().map(|v| v != 0)
    }
}

impl FromPayload for String {
    fn from_payload(payload: Payload) -> Option<Self> {
        match payload {
            Payload::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl FromPayload for Vec<u8> {
    fn from_payload(payload: Payload) -> Option<Self> {
        match payload {
            Payload::Blob(v) => Some(v),
            _ => None,
        }
    }
}
