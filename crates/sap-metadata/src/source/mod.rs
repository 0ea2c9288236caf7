//! The remote metadata boundary
//!
//! Loaders, the cache and the schema generator only talk to a
//! [`RemoteMetadataSource`]. [`RfcMetadataSource`] implements it on top of a
//! [`FunctionExecutor`] that runs named functions with [`Document`]
//! requests; a native binding can implement the trait directly.

mod rfc;
pub mod templates;

pub use rfc::{RfcMetadataSource, RfcSourceConfig};

use crate::interface::ParameterLists;
use crate::model::OperationKind;
use crate::segment::SegmentMetadata;
use crate::{Error, Result};
use sap_ir::{Document, Node, NodeType};

/// Name of the parameter carrying a function's business return status
pub const RETURN_PARAMETER: &str = "RETURN";

/// Source of metadata about the remote system's callable surface
pub trait RemoteMetadataSource: Send + Sync {
    /// All BAPI methods, one row per (object type, method)
    fn fetch_all_bapis(&self) -> Result<Node>;

    /// All remote-enabled functions, one row per function
    fn fetch_all_rfcs(&self) -> Result<Node>;

    /// All message types, one row per (message type, IDOC type, extension)
    fn fetch_all_idoc_message_types(&self) -> Result<Node>;

    /// The business object repository component list, one row per node
    fn fetch_component_tree(&self) -> Result<Node>;

    /// Full parameter interface of one function
    fn fetch_function_interface(&self, name: &str) -> Result<ParameterLists>;

    /// Full segment tree of one IDOC type
    fn fetch_idoc_segment_tree(
        &self,
        idoc_type: &str,
        extension: Option<&str>,
    ) -> Result<SegmentMetadata>;

    /// Execute a function and return its response. A failure reported
    /// through the `RETURN` parameter is an [`Error::FunctionCall`].
    fn execute_named_function(&self, request: &Document) -> Result<Document>;

    /// Flat row list for one operation kind
    fn fetch_rows(&self, kind: OperationKind) -> Result<Node> {
        match kind {
            OperationKind::Bapi => self.fetch_all_bapis(),
            OperationKind::Rfc => self.fetch_all_rfcs(),
            OperationKind::Idoc => self.fetch_all_idoc_message_types(),
        }
    }
}

/// Transport that executes a named remote function
pub trait FunctionExecutor: Send + Sync {
    /// Execute `request` (its root name is the function name). Transport
    /// failures are reported as [`Error::RemoteCall`].
    fn execute(&self, request: &Document) -> Result<Document>;
}

/// Check the `RETURN` convention of a response.
///
/// A `RETURN` structure, or any row of a `RETURN` table, whose `TYPE` is
/// neither empty nor `S` signals failure; its `MESSAGE` becomes the error
/// text.
pub fn check_return(response: &Document) -> Result<()> {
    let Some(parameter) = response.root.find_child(RETURN_PARAMETER) else {
        return Ok(());
    };

    let entries: Vec<&Node> = match parameter.node_type {
        NodeType::Table => parameter.children.iter().collect(),
        _ => vec![parameter],
    };

    for entry in entries {
        match entry.field_value("TYPE") {
            None | Some("S") => {}
            Some(status) => {
                let message = entry
                    .field_value("MESSAGE")
                    .map_or_else(|| format!("return type {status}"), str::to_string);
                return Err(Error::function_call(response.function_name(), message));
            }
        }
    }

    Ok(())
}
