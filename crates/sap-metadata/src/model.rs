//! Containers and per-operation metadata cached for a backend system

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The three kinds of callable objects exposed by the connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// Business API method owned by a business object type
    Bapi,
    /// Plain remote-enabled function module
    Rfc,
    /// Intermediate document (message type / IDOC type pair)
    Idoc,
}

impl OperationKind {
    /// All kinds, in reload order
    pub const ALL: [OperationKind; 3] =
        [OperationKind::Bapi, OperationKind::Rfc, OperationKind::Idoc];

    /// Operation type code used by the hosting bus
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Bapi => "SAPBAPI",
            OperationKind::Rfc => "SAPRFC",
            OperationKind::Idoc => "SAPIDOC",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SAPBAPI" | "BAPI" => Ok(OperationKind::Bapi),
            "SAPRFC" | "RFC" => Ok(OperationKind::Rfc),
            "SAPIDOC" | "IDOC" => Ok(OperationKind::Idoc),
            other => Err(Error::Configuration(format!(
                "unknown operation kind '{other}'"
            ))),
        }
    }
}

/// One BAPI method of a business object type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BapiMetadata {
    /// Method key (e.g. `GETLIST`)
    pub method: String,
    /// Display name of the method (e.g. `GetList`)
    pub method_name: String,
    /// Function module implementing the method
    pub function_name: String,
    pub description: Option<String>,
}

/// A remote-enabled function module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfcMetadata {
    pub function_name: String,
    pub group_name: Option<String>,
    pub short_text: Option<String>,
}

/// A message type / IDOC type pairing, optionally with an extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdocMetadata {
    pub message_type: String,
    pub idoc_type: String,
    /// Extension ("CIM type") of the basic type
    pub extension: Option<String>,
    pub description: Option<String>,
}

/// Metadata of one callable operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeMetadata {
    Bapi(BapiMetadata),
    Rfc(RfcMetadata),
    Idoc(IdocMetadata),
}

impl TypeMetadata {
    /// Key of the item inside its container
    pub fn key(&self) -> String {
        match self {
            TypeMetadata::Bapi(bapi) => bapi.method.clone(),
            TypeMetadata::Rfc(rfc) => rfc.function_name.clone(),
            TypeMetadata::Idoc(idoc) => match &idoc.extension {
                Some(extension) => format!("{}:{}", idoc.idoc_type, extension),
                None => idoc.idoc_type.clone(),
            },
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            TypeMetadata::Bapi(_) => OperationKind::Bapi,
            TypeMetadata::Rfc(_) => OperationKind::Rfc,
            TypeMetadata::Idoc(_) => OperationKind::Idoc,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            TypeMetadata::Bapi(bapi) => bapi.description.as_deref(),
            TypeMetadata::Rfc(rfc) => rfc.short_text.as_deref(),
            TypeMetadata::Idoc(idoc) => idoc.description.as_deref(),
        }
    }

    /// Name used to generate the operation's schema: the implementing
    /// function for BAPIs and RFCs, the IDOC type for IDOCs.
    pub fn operation_name(&self) -> &str {
        match self {
            TypeMetadata::Bapi(bapi) => &bapi.function_name,
            TypeMetadata::Rfc(rfc) => &rfc.function_name,
            TypeMetadata::Idoc(idoc) => &idoc.idoc_type,
        }
    }
}

/// One named SAP object and its callable operations.
///
/// Items are keyed by [`TypeMetadata::key`]; insertion order is preserved
/// and inserting an existing key replaces the item in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeContainer {
    /// Canonical key (object type, message type or function name)
    pub value: String,
    pub display_name: String,
    pub description: Option<String>,
    items: Vec<TypeMetadata>,
}

impl TypeContainer {
    pub fn new(value: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            display_name: display_name.into(),
            description: None,
            items: Vec::new(),
        }
    }

    /// Container for a plain RFC: the function is its own single item
    pub fn for_rfc(rfc: RfcMetadata) -> Self {
        let mut container = Self::new(rfc.function_name.clone(), rfc.function_name.clone());
        container.description = rfc.short_text.clone();
        container.items.push(TypeMetadata::Rfc(rfc));
        container
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_item(mut self, item: TypeMetadata) -> Self {
        self.insert_item(item);
        self
    }

    /// Insert or replace an item, returning the replaced one
    pub fn insert_item(&mut self, item: TypeMetadata) -> Option<TypeMetadata> {
        let key = item.key();
        match self.items.iter().position(|existing| existing.key() == key) {
            Some(index) => Some(std::mem::replace(&mut self.items[index], item)),
            None => {
                self.items.push(item);
                None
            }
        }
    }

    pub fn item(&self, key: &str) -> Option<&TypeMetadata> {
        self.items.iter().find(|item| item.key() == key)
    }

    pub fn items(&self) -> &[TypeMetadata] {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Copy with the same identity and no items
    pub fn trimmed(&self) -> Self {
        Self {
            value: self.value.clone(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            items: Vec::new(),
        }
    }
}

/// Insertion-ordered map of containers keyed by [`TypeContainer::value`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerMap {
    entries: Vec<TypeContainer>,
    index: HashMap<String, usize>,
}

impl ContainerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by key, returning the replaced container.
    /// A replaced container keeps its original position.
    pub fn insert(&mut self, container: TypeContainer) -> Option<TypeContainer> {
        match self.index.get(&container.value) {
            Some(&position) => Some(std::mem::replace(&mut self.entries[position], container)),
            None => {
                self.index
                    .insert(container.value.clone(), self.entries.len());
                self.entries.push(container);
                None
            }
        }
    }

    pub fn get(&self, value: &str) -> Option<&TypeContainer> {
        self.index.get(value).map(|&position| &self.entries[position])
    }

    pub fn contains(&self, value: &str) -> bool {
        self.index.contains_key(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeContainer> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|c| c.value.as_str())
    }

    /// Owned copy of the containers, in insertion order
    pub fn to_vec(&self) -> Vec<TypeContainer> {
        self.entries.clone()
    }
}

impl FromIterator<TypeContainer> for ContainerMap {
    fn from_iter<I: IntoIterator<Item = TypeContainer>>(iter: I) -> Self {
        let mut map = ContainerMap::new();
        for container in iter {
            map.insert(container);
        }
        map
    }
}

impl IntoIterator for ContainerMap {
    type Item = TypeContainer;
    type IntoIter = std::vec::IntoIter<TypeContainer>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
