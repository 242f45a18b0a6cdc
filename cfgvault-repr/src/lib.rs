//! # cfgvault-repr
//!
//! The representation document.
//! An ordered tree of named elements with string attributes, used both as the
//! export target and the import source of every store.

pub mod codec;
pub mod document;
pub mod element;

pub use codec::TypeTag;
pub use document::Document;
pub use element::Element;

use std::path::PathBuf;

/// Name of the element wrapping a whole exported profile.
pub const ROOT_ELEMENT: &str = "configuration";

#[derive(Debug, thiserror::Error)]
pub enum ReprError {
    #[error("error opening file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error loading document: {0}")]
    Parse(String),

    #[error("error writing document: {0}")]
    Write(#[from] std::io::Error),

    #[error("document has no <configuration> root element")]
    MissingRoot,
}

pub type Result<T> = std::result::Result<T, ReprError>;
