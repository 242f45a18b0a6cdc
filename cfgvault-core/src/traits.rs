//! The three seams every store is composed from.

use crate::column::{ColumnKind, FromPayload, Payload};
use crate::db::Database;
use crate::error::Result;
use cfgvault_repr::Element;

/// Named typed values grouped under an owner (a namespace or a key).
pub trait TypedAccess {
    type Owner: ?Sized;

    fn set_value(&self, owner: &Self::Owner, name: &str, value: impl Into<Payload>) -> Result<()>;

    fn get_value(&self, owner: &Self::Owner, name: &str) -> Result<Option<Payload>>;

    fn delete_value(&self, owner: &Self::Owner, name: &str) -> Result<()>;

    /// Typed read. A value of another shape reads as absent.
    fn get<T: FromPayload>(&self, owner: &Self::Owner, name: &str) -> Result<Option<T>> {
        Ok(self.get_value(owner, name)?.and_then(T::from_payload))
    }

    fn get_or<T: FromPayload>(&self, owner: &Self::Owner, name: &str, default: T) -> Result<T> {
        Ok(self.get(owner, name)?.unwrap_or(default))
    }

    fn value_kind(&self, owner: &Self::Owner, name: &str) -> Result<Option<ColumnKind>> {
        Ok(self.get_value(owner, name)?.map(|value| value.kind()))
    }
}

pub trait Transactional {
    fn database(&self) -> &Database;

    fn begin_transaction(&self) -> Result<()> {
        self.database().begin_transaction()
    }

    fn end_transaction(&self) -> Result<()> {
        self.database().end_transaction()
    }

    /// Commit and immediately reopen the current transaction.
    fn flush(&self) -> Result<()> {
        self.database().flush()
    }
}

/// Export into / import from a section element of the representation
/// document. Import skips malformed elements.
pub trait Exportable {
    fn export(&self, section: &mut Element) -> Result<()>;

    fn import(&self, section: &Element) -> Result<()>;
}
