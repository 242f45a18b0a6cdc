use crate::column::ColumnKind;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("{path}: database is busy")]
    Busy { path: String },

    #[error("{path}: lock is held by another process")]
    Lock { path: PathBuf },

    #[error("the root key cannot be modified")]
    RootKey,

    #[error("column holds {actual:?}, expected {expected:?}")]
    WrongColumnKind {
        expected: ColumnKind,
        actual: ColumnKind,
    },

    #[error("history writer thread is gone")]
    WorkerGone,

    #[error(transparent)]
    Repr(#[from] cfgvault_repr::ReprError),
}

impl StoreError {
    /// SQLite gave up waiting on a lock held by someone else.
    pub fn is_busy(&self) -> bool {
        match self {
            Self::Busy { .. } => true,
            Self::Sql(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
