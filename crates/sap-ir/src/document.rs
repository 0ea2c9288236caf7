//! Request and response documents for remote function calls

use crate::node::{Node, NodeType};
use serde::{Deserialize, Serialize};

/// A function request or response.
///
/// The root node is named after the function; its children are the
/// parameters (fields, structures and tables).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Root node of the document
    pub root: Node,
}

impl Document {
    /// Create a new document with the given root node
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    /// Start a request for the named function
    pub fn request(function: impl Into<String>) -> Self {
        Self::new(Node::new(function, NodeType::Root))
    }

    /// Add an import field
    pub fn with_import(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.root.add_child(Node::field(name, value));
        self
    }

    /// Name of the function this document belongs to
    pub fn function_name(&self) -> &str {
        &self.root.name
    }

    /// Scalar parameter value
    pub fn field(&self, name: &str) -> Option<&str> {
        self.root.field_value(name)
    }

    /// Table parameter by name
    pub fn table(&self, name: &str) -> Option<&Node> {
        self.root
            .children
            .iter()
            .find(|c| c.name == name && c.node_type == NodeType::Table)
    }

    /// Rows of a table parameter; an absent table has no rows
    pub fn rows(&self, name: &str) -> &[Node] {
        self.table(name).map(|t| t.children.as_slice()).unwrap_or(&[])
    }
}
