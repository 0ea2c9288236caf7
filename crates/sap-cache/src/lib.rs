#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # sap-cache
//!
//! In-memory metadata cache for one backend system, its persistent
//! storage, and the loader that fills per-kind cache files from the remote
//! metadata source.
//!
//! Readers always work on a snapshot: reloads build a new collection and
//! swap it in, so a search never observes a half-cleared collection.

pub mod cache;
pub mod layout;
pub mod loader;
pub mod search;
pub mod storage;
pub mod xml;

pub use cache::{MetadataCache, MetadataCacheBuilder};
pub use layout::{CacheLayout, MetadataKind};
pub use loader::{LoadGuard, LoadRegistry, LoadRequest, LoaderConfig, MetadataLoader};
pub use search::search_containers;
pub use storage::{CacheStorageProvider, FileCacheStorage, MemoryCacheStorage};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by the cache, its storage and the loader
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Metadata(#[from] sap_metadata::Error),

    #[error("Storage {operation} failed for {path}: {message}")]
    Storage {
        operation: String,
        path: PathBuf,
        message: String,
    },

    #[error("XML error in {context}: {message}")]
    Xml { context: String, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    pub fn storage(operation: impl Into<String>, path: &Path, message: impl ToString) -> Self {
        Self::Storage {
            operation: operation.into(),
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    pub fn xml(context: impl Into<String>, message: impl ToString) -> Self {
        Self::Xml {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Stable code for structured faults
    pub fn code(&self) -> &'static str {
        match self {
            Self::Metadata(inner) => inner.code(),
            Self::Storage { .. } => "STORAGE",
            Self::Xml { .. } => "MALFORMED_DATA",
            Self::Configuration(_) => "CONFIGURATION",
        }
    }
}

impl From<sap_ir::Error> for Error {
    fn from(error: sap_ir::Error) -> Self {
        Self::Metadata(error.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_metadata_errors_keep_their_code() {
        let error: Error = sap_metadata::Error::not_found("function", "Z_X").into();
        assert_eq!(error.code(), "NOT_FOUND");
        assert_eq!(error.to_string(), "function 'Z_X' not found");
    }

    #[test]
    fn storage_error_names_the_path() {
        let error = Error::storage("write", Path::new("/tmp/BOMetadata.xml"), "disk full");
        assert_eq!(error.code(), "STORAGE");
        assert!(error.to_string().contains("BOMetadata.xml"));
    }
}
