//! Operation descriptors handed to the interface publisher

use crate::generator::GeneratedSchema;
use crate::xsd::to_xsd_string;
use crate::Result;
use sap_metadata::{OperationKind, TypeContainer, TypeMetadata};
use serde::Serialize;

/// One published operation: its kind, name and request/response schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDescriptor {
    /// Operation name as published (function, or object and method)
    pub operation: String,
    pub kind: OperationKind,
    /// Function or IDOC type the schema was generated for
    pub item: String,
    pub extension: Option<String>,
    pub input_element: String,
    pub output_element: String,
    pub description: Option<String>,
    /// XSD text of the schema document
    pub schema: String,
}

impl MethodDescriptor {
    pub fn new(
        operation: impl Into<String>,
        kind: OperationKind,
        item: impl Into<String>,
        schema: &GeneratedSchema,
    ) -> Result<Self> {
        Ok(Self {
            operation: operation.into(),
            kind,
            item: item.into(),
            extension: None,
            input_element: schema.input.clone(),
            output_element: schema.output.clone(),
            description: None,
            schema: to_xsd_string(&schema.document)?,
        })
    }

    /// Descriptor for a cached operation of `container`
    pub fn for_item(
        container: &TypeContainer,
        item: &TypeMetadata,
        schema: &GeneratedSchema,
    ) -> Result<Self> {
        let operation = match item {
            TypeMetadata::Bapi(bapi) => format!("{}.{}", container.display_name, bapi.method_name),
            TypeMetadata::Rfc(rfc) => rfc.function_name.clone(),
            TypeMetadata::Idoc(idoc) => format!("{}.{}", idoc.message_type, item.key()),
        };
        let mut descriptor = Self::new(operation, item.kind(), item.operation_name(), schema)?;
        if let TypeMetadata::Idoc(idoc) = item {
            descriptor.extension = idoc.extension.clone();
        }
        descriptor.description = item
            .description()
            .or(container.description.as_deref())
            .map(str::to_string);
        Ok(descriptor)
    }
}
