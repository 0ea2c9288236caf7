//! IDOC segment metadata trees

use serde::{Deserialize, Serialize};

/// A field of an IDOC segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentField {
    pub name: String,
    /// Dictionary type code (CHAR, NUMC, DATS, ...)
    pub data_type: String,
    /// Output length
    pub length: u32,
    pub decimals: u32,
    pub description: Option<String>,
}

/// A node of an IDOC structure.
///
/// The root node stands for the IDOC type itself; its children are the
/// top-level segments. Child order is segment order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMetadata {
    pub segment_type: String,
    pub description: Option<String>,
    pub min_occurs: u64,
    pub max_occurs: u64,
    pub fields: Vec<SegmentField>,
    pub children: Vec<SegmentMetadata>,
}

impl SegmentField {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, length: u32) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            length,
            decimals: 0,
            description: None,
        }
    }
}

impl SegmentMetadata {
    pub fn new(segment_type: impl Into<String>, min_occurs: u64, max_occurs: u64) -> Self {
        Self {
            segment_type: segment_type.into(),
            description: None,
            min_occurs,
            max_occurs,
            fields: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Root node for an IDOC type
    pub fn root(idoc_type: impl Into<String>) -> Self {
        Self::new(idoc_type, 1, 1)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_field(mut self, field: SegmentField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_child(mut self, child: SegmentMetadata) -> Self {
        self.children.push(child);
        self
    }

    /// Number of segments below this node
    pub fn segment_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.segment_count())
            .sum()
    }

    /// Depth-first search for a segment type
    pub fn find(&self, segment_type: &str) -> Option<&SegmentMetadata> {
        if self.segment_type == segment_type {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(segment_type))
    }
}
