//! Node types for function documents and metadata trees

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// A node in a document or metadata tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Node name (function, parameter, table or field name)
    pub name: String,

    /// Node type
    pub node_type: NodeType,

    /// Scalar value for fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Child nodes, in document order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,

    /// Node attributes (realigned head values, tree markers)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// Types of nodes in a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Root of a document or persisted tree
    Root,

    /// Structure parameter (one row of named fields)
    Structure,

    /// Table parameter (repeating rows)
    Table,

    /// One row of a table, or a grouped parent row after realignment
    Row,

    /// Scalar field
    Field,
}

impl Node {
    /// Create a new node
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            value: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Create a scalar field node
    pub fn field(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::new(name, NodeType::Field)
        }
    }

    /// Create an empty table row named `item`
    pub fn row() -> Self {
        Self::new("item", NodeType::Row)
    }

    /// Builder variant of [`Node::add_child`]
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Builder variant that appends several children
    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    /// Builder variant that appends a scalar field child
    pub fn with_field(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_child(Node::field(name, value))
    }

    /// Builder variant of [`Node::set_attribute`]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Add a child node
    pub fn add_child(&mut self, child: Node) -> &mut Self {
        self.children.push(child);
        self
    }

    /// Set an attribute
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Get an attribute value
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Find a child by name
    pub fn find_child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Trimmed value of a scalar child field. Empty values read as `None`.
    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.find_child(name)
            .filter(|c| c.node_type == NodeType::Field)
            .and_then(|c| c.value.as_deref())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Like [`Node::field_value`] but a missing value is an error
    pub fn require_field(&self, name: &str) -> Result<&str> {
        self.field_value(name)
            .ok_or_else(|| Error::missing_field(&self.name, name))
    }

    /// Parse a numeric child field, treating an absent or blank value as `None`
    pub fn parse_field<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.field_value(name) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|e| Error::invalid_value(name, raw, e.to_string())),
        }
    }

    /// Copy of this node without the named scalar children
    pub fn without_fields(&self, names: &[&str]) -> Node {
        Node {
            children: self
                .children
                .iter()
                .filter(|c| !(c.node_type == NodeType::Field && names.contains(&c.name.as_str())))
                .cloned()
                .collect(),
            ..self.clone()
        }
    }
}
