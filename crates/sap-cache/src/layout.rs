//! On-disk layout of a system's metadata cache

use sap_metadata::OperationKind;
use std::fmt;
use std::path::{Path, PathBuf};

/// Kinds of metadata the loader fetches and caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    /// Business object repository component tree
    Component,
    BusinessObject,
    Rfc,
    Idoc,
    /// Parameter interface of one function
    RfcInterface,
    /// Segment tree of one IDOC type
    IdocInterface,
}

impl MetadataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataKind::Component => "component",
            MetadataKind::BusinessObject => "business_object",
            MetadataKind::Rfc => "rfc",
            MetadataKind::Idoc => "idoc",
            MetadataKind::RfcInterface => "rfc_interface",
            MetadataKind::IdocInterface => "idoc_interface",
        }
    }
}

impl From<OperationKind> for MetadataKind {
    fn from(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Bapi => MetadataKind::BusinessObject,
            OperationKind::Rfc => MetadataKind::Rfc,
            OperationKind::Idoc => MetadataKind::Idoc,
        }
    }
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File locations below a system's cache directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub const INTERFACES_DIR: &'static str = "Interfaces";
    pub const RFC_INTERFACES_DIR: &'static str = "RFC";
    pub const IDOC_INTERFACES_DIR: &'static str = "IDOC";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout for one system below a shared cache directory
    pub fn for_system(cache_dir: impl AsRef<Path>, system_id: &str) -> Self {
        Self::new(cache_dir.as_ref().join(file_component(system_id)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File of a bulk kind; `None` for per-item kinds
    pub fn bulk_file(&self, kind: MetadataKind) -> Option<PathBuf> {
        let name = match kind {
            MetadataKind::Component => "ComponentMetadata.xml",
            MetadataKind::BusinessObject => "BOMetadata.xml",
            MetadataKind::Rfc => "RFCMetadata.xml",
            MetadataKind::Idoc => "IDOCMetadata.xml",
            MetadataKind::RfcInterface | MetadataKind::IdocInterface => return None,
        };
        Some(self.root.join(name))
    }

    pub fn rfc_interface_file(&self, function: &str) -> PathBuf {
        self.root
            .join(Self::INTERFACES_DIR)
            .join(Self::RFC_INTERFACES_DIR)
            .join(format!("RFCInterface_{}.xml", file_component(function)))
    }

    pub fn idoc_interface_file(&self, idoc_type: &str, extension: Option<&str>) -> PathBuf {
        let name = match extension {
            Some(extension) => format!(
                "IDOCInterface_{}_{}.xml",
                file_component(idoc_type),
                file_component(extension)
            ),
            None => format!("IDOCInterface_{}.xml", file_component(idoc_type)),
        };
        self.root
            .join(Self::INTERFACES_DIR)
            .join(Self::IDOC_INTERFACES_DIR)
            .join(name)
    }
}

/// Namespace separators in SAP names are not valid in file names
pub fn file_component(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}
