pub mod column;
pub mod cursor;
pub mod db;
pub mod error;
pub mod guid;
pub mod history;
pub mod lock;
pub mod migrate;
pub mod options;
pub mod provider;
pub mod traits;
pub mod vault;

// Re-export the types most callers need so they can write `cfgvault_core::ConfigProvider`
pub use column::{ColumnKind, FromPayload, Payload};
pub use cursor::Cursor;
pub use db::{Database, Location};
pub use error::{Result, StoreError};
pub use history::{Clock, HistoryKind, HistoryRecord, HistoryStore, NewRecord, TickClock};
pub use options::ProviderOptions;
pub use provider::{ConfigProvider, Mode};
pub use traits::{Exportable, Transactional, TypedAccess};
