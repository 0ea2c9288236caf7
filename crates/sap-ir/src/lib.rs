#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # sap-ir
//!
//! Tree structures shared by the SAP connector crates.
//!
//! Every payload that crosses the remote-function boundary is a [`Document`]:
//! requests carry import fields, responses carry export fields, structures and
//! tables. The same [`Node`] tree also represents realigned metadata (the
//! grouped BAPI, RFC and IDOC lists) and is what the cache persists to disk.

/// Request/response documents exchanged with the remote system.
pub mod document;
/// Core tree node model.
pub mod node;
/// Visitor traversal over trees.
pub mod traversal;

pub use document::Document;
pub use node::{Node, NodeType};
pub use traversal::{walk, Traversal};

use thiserror::Error;

/// Errors that can occur when working with documents and trees
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Row '{row}' has no field '{field}'")]
    MissingField { row: String, field: String },

    #[error("Invalid value '{value}' for field '{field}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

impl Error {
    /// Build a missing-field error for a row.
    pub fn missing_field(row: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            row: row.into(),
            field: field.into(),
        }
    }

    /// Build an invalid-value error for a field that failed to parse.
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Crate-local result type for tree operations.
pub type Result<T> = std::result::Result<T, Error>;
