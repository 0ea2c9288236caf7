#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # sap-metadata
//!
//! Metadata model and remote metadata sources for the SAP connector.
//!
//! The remote system describes its callable surface as flat, denormalized
//! row lists. This crate turns those rows into grouped trees
//! ([`realign`]), into typed containers ([`TypeContainer`]), and defines the
//! [`RemoteMetadataSource`] boundary every loader and generator is written
//! against.

pub mod convert;
pub mod filter;
pub mod interface;
pub mod model;
pub mod realign;
pub mod segment;
pub mod source;

pub use filter::{Filter, RegexFilter, SubstringFilter, WildcardFilter};
pub use interface::{Field, FieldKind, ParameterLists, StructureDefinition};
pub use model::{
    BapiMetadata, ContainerMap, IdocMetadata, OperationKind, RfcMetadata, TypeContainer,
    TypeMetadata,
};
pub use realign::{RealignSpec, build_component_tree, prune_to_business_objects, realign};
pub use segment::{SegmentField, SegmentMetadata};
pub use source::{
    FunctionExecutor, RemoteMetadataSource, RfcMetadataSource, RfcSourceConfig, check_return,
};

use thiserror::Error;

/// Errors raised while loading or interpreting remote metadata
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Remote call to '{function}' failed: {message}")]
    RemoteCall { function: String, message: String },

    #[error("Function '{function}' reported an error: {message}")]
    FunctionCall { function: String, message: String },

    #[error("{kind} '{name}' not found")]
    NotFound { kind: String, name: String },

    #[error("Malformed metadata in {context}: {message}")]
    MalformedData { context: String, message: String },

    #[error("Tree error: {0}")]
    Tree(#[from] sap_ir::Error),
}

impl Error {
    /// Transport-level failure calling a remote function.
    pub fn remote_call(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteCall {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Business-level failure signalled through the `RETURN` parameter.
    pub fn function_call(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FunctionCall {
            function: function.into(),
            message: message.into(),
        }
    }

    /// A requested item does not exist remotely.
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Remote payload that does not have the expected shape.
    pub fn malformed(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedData {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Stable code for structured faults.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION",
            Self::RemoteCall { .. } => "REMOTE_CALL",
            Self::FunctionCall { .. } => "FUNCTION_CALL",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::MalformedData { .. } | Self::Tree(_) => "MALFORMED_DATA",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_call_error_keeps_remote_message() {
        let error = Error::function_call("BAPI_CUSTOMER_GETLIST", "No authorization");
        assert_eq!(error.code(), "FUNCTION_CALL");
        assert_eq!(
            error.to_string(),
            "Function 'BAPI_CUSTOMER_GETLIST' reported an error: No authorization"
        );
    }

    #[test]
    fn tree_errors_are_malformed_data() {
        let error: Error = sap_ir::Error::missing_field("item", "FUNCNAME").into();
        assert_eq!(error.code(), "MALFORMED_DATA");
    }

    #[test]
    fn not_found_is_distinct_from_transport_failures() {
        assert_eq!(Error::not_found("function", "Z_MISSING").code(), "NOT_FOUND");
        assert_eq!(Error::remote_call("RFC_PING", "timeout").code(), "REMOTE_CALL");
    }
}
