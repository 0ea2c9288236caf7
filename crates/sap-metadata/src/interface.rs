//! Parameter interface of a remote function

use serde::{Deserialize, Serialize};

/// Shape of a parameter or structure component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Elementary field with a remote type code
    Scalar {
        data_type: String,
        length: u32,
        decimals: u32,
    },
    /// Flat or nested structure
    Structure(StructureDefinition),
    /// Table whose rows have the given line structure
    Table(StructureDefinition),
}

/// A named structure type and its components in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureDefinition {
    pub name: String,
    pub fields: Vec<Field>,
}

/// A function parameter or a structure component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub description: Option<String>,
    pub optional: bool,
    pub kind: FieldKind,
}

impl Field {
    pub fn scalar(name: impl Into<String>, data_type: impl Into<String>, length: u32) -> Self {
        Self {
            name: name.into(),
            description: None,
            optional: false,
            kind: FieldKind::Scalar {
                data_type: data_type.into(),
                length,
                decimals: 0,
            },
        }
    }

    pub fn decimal(
        name: impl Into<String>,
        data_type: impl Into<String>,
        length: u32,
        decimals: u32,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            optional: false,
            kind: FieldKind::Scalar {
                data_type: data_type.into(),
                length,
                decimals,
            },
        }
    }

    pub fn structure(name: impl Into<String>, definition: StructureDefinition) -> Self {
        Self {
            name: name.into(),
            description: None,
            optional: false,
            kind: FieldKind::Structure(definition),
        }
    }

    pub fn table(name: impl Into<String>, line_type: StructureDefinition) -> Self {
        Self {
            name: name.into(),
            description: None,
            optional: false,
            kind: FieldKind::Table(line_type),
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Referenced structure, for structure and table fields
    pub fn structure_ref(&self) -> Option<&StructureDefinition> {
        match &self.kind {
            FieldKind::Scalar { .. } => None,
            FieldKind::Structure(definition) | FieldKind::Table(definition) => Some(definition),
        }
    }
}

impl StructureDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }
}

/// Import, export, changing and table parameters of a function
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterLists {
    pub function_name: String,
    pub imports: Vec<Field>,
    pub exports: Vec<Field>,
    pub changing: Vec<Field>,
    pub tables: Vec<Field>,
}

impl ParameterLists {
    pub fn new(function_name: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            ..Self::default()
        }
    }

    pub fn with_import(mut self, field: Field) -> Self {
        self.imports.push(field);
        self
    }

    pub fn with_export(mut self, field: Field) -> Self {
        self.exports.push(field);
        self
    }

    pub fn with_changing(mut self, field: Field) -> Self {
        self.changing.push(field);
        self
    }

    pub fn with_table(mut self, field: Field) -> Self {
        self.tables.push(field);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
            && self.exports.is_empty()
            && self.changing.is_empty()
            && self.tables.is_empty()
    }
}
