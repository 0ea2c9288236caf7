//! Input and output schemas for functions and IDOC types

use crate::control::{CONTROL_RECORD, control_record_type, segment_attribute};
use crate::datatype::{FieldContext, simple_type};
use crate::model::{
    AttributeDecl, ComplexType, Element, ElementType, MaxOccurs, Primitive, SchemaDocument,
    Sequence, SimpleType, xml_name,
};
use crate::{Error, Result};
use sap_metadata::{
    Field, FieldKind, OperationKind, ParameterLists, RemoteMetadataSource, SegmentField,
    SegmentMetadata, StructureDefinition,
};
use std::collections::HashSet;
use tracing::{debug, trace};

pub const RESPONSE_SUFFIX: &str = ".Response";
pub const TABLE_ITEM: &str = "item";
pub const IDOC_ELEMENT: &str = "IDOC";
pub const BEGIN_ATTRIBUTE: &str = "BEGIN";
pub const TRANSACTION_ID: &str = "tid";
pub const IDOC_NUMBER: &str = "IDOCNum";

/// A schema document and the names of its input and output elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSchema {
    pub document: SchemaDocument,
    pub input: String,
    pub output: String,
}

impl GeneratedSchema {
    pub fn input_element(&self) -> Option<&Element> {
        self.document.element(&self.input)
    }

    pub fn output_element(&self) -> Option<&Element> {
        self.document.element(&self.output)
    }
}

/// Accumulates elements and named complex types into one document.
///
/// Complex types are keyed by name: a structure referenced several times,
/// or by several functions, is declared once. Adding the same function or
/// IDOC twice does not duplicate its elements.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    document: SchemaDocument,
    type_names: HashSet<String>,
    element_names: HashSet<String>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.document.target_namespace = Some(namespace.into());
        self
    }

    pub fn finish(self) -> SchemaDocument {
        self.document
    }

    fn push_element(&mut self, element: Element) {
        if self.element_names.insert(element.name.clone()) {
            self.document.elements.push(element);
        }
    }

    fn declare_type(&mut self, name: &str, build: impl FnOnce(&mut Self) -> ComplexType) {
        if self.type_names.contains(name) {
            trace!(name, "complex type already declared");
            return;
        }
        // Reserve the name first so self-referencing types terminate
        self.type_names.insert(name.to_string());
        let complex = build(self);
        self.document.complex_types.push(complex);
    }

    /// Add the request and response elements of a function.
    ///
    /// Input: imports, changing parameters and tables. Output: exports,
    /// changing parameters and tables.
    pub fn add_function(&mut self, parameters: &ParameterLists) -> Result<(String, String)> {
        let input = xml_name(&parameters.function_name);
        let output = format!("{input}{RESPONSE_SUFFIX}");

        let mut request = Vec::new();
        for field in &parameters.imports {
            let element = self.parameter_element(field);
            request.push(if field.optional { element.optional() } else { element });
        }
        for field in parameters.changing.iter().chain(&parameters.tables) {
            request.push(self.parameter_element(field).optional());
        }

        let mut response = Vec::new();
        for field in parameters
            .exports
            .iter()
            .chain(&parameters.changing)
            .chain(&parameters.tables)
        {
            response.push(self.parameter_element(field).optional());
        }

        let request = ComplexType::anonymous(Sequence::ordered(request));
        let response = ComplexType::anonymous(Sequence::ordered(response));
        self.push_element(Element::complex(&input, request));
        self.push_element(Element::complex(&output, response));
        debug!(
            function = %parameters.function_name,
            types = self.type_names.len(),
            "generated function schema"
        );
        Ok((input, output))
    }

    fn parameter_element(&mut self, field: &Field) -> Element {
        let name = xml_name(&field.name);
        match &field.kind {
            FieldKind::Scalar {
                data_type,
                length,
                decimals,
            } => Element::simple(
                name,
                simple_type(data_type, *length, *decimals, FieldContext::Function),
            ),
            FieldKind::Structure(definition) => {
                Element::new(name, ElementType::Named(self.structure_type(definition)))
            }
            FieldKind::Table(definition) => {
                let line_type = ElementType::Named(self.structure_type(definition));
                let line = Element::new(TABLE_ITEM, line_type).occurs(0, MaxOccurs::Unbounded);
                Element::complex(name, ComplexType::anonymous(Sequence::ordered(vec![line])))
            }
        }
    }

    /// Declare the complex type of a structure and return its name
    fn structure_type(&mut self, definition: &StructureDefinition) -> String {
        let type_name = xml_name(&definition.name);
        self.declare_type(&type_name, |builder| {
            let elements = definition
                .fields
                .iter()
                .map(|field| builder.parameter_element(field).optional())
                .collect();
            ComplexType::named(type_name.clone(), Sequence::ordered(elements))
        });
        type_name
    }

    /// Add the request and response elements of an IDOC type.
    ///
    /// The request wraps one `IDOC` element whose sequence starts with the
    /// control record followed by the segment tree. The response is the
    /// fixed transaction id and IDOC number pair.
    pub fn add_idoc(&mut self, root: &SegmentMetadata) -> Result<(String, String)> {
        if root.children.is_empty() {
            return Err(Error::generation(format!(
                "IDOC type {} has no segments",
                root.segment_type
            )));
        }

        let input = xml_name(&root.segment_type);
        let output = format!("{input}{RESPONSE_SUFFIX}");

        self.declare_type(CONTROL_RECORD, |_| control_record_type());

        let mut idoc_content = vec![Element::new(
            CONTROL_RECORD,
            ElementType::Named(CONTROL_RECORD.to_string()),
        )];
        idoc_content.extend(root.children.iter().map(segment_element));
        let idoc = ComplexType::anonymous(Sequence::ordered(idoc_content)).with_attribute(
            AttributeDecl {
                name: BEGIN_ATTRIBUTE.to_string(),
                simple_type: SimpleType::enumeration(&["1"]),
                required: true,
            },
        );

        let request =
            ComplexType::anonymous(Sequence::ordered(vec![Element::complex(IDOC_ELEMENT, idoc)]));
        let response = ComplexType::anonymous(Sequence::ordered(vec![
            Element::simple(TRANSACTION_ID, SimpleType::primitive(Primitive::Int)),
            Element::simple(IDOC_NUMBER, SimpleType::primitive(Primitive::String)),
        ]));

        self.push_element(Element::complex(&input, request));
        self.push_element(Element::complex(&output, response));
        debug!(idoc = %root.segment_type, segments = root.segment_count(), "generated IDOC schema");
        Ok((input, output))
    }
}

fn segment_element(segment: &SegmentMetadata) -> Element {
    let mut elements: Vec<Element> = segment.fields.iter().map(segment_field_element).collect();
    elements.extend(segment.children.iter().map(segment_element));

    let max = match segment.max_occurs {
        0 => MaxOccurs::Unbounded,
        max => MaxOccurs::Bounded(max),
    };
    Element::complex(
        xml_name(&segment.segment_type),
        ComplexType::anonymous(Sequence::ordered(elements)).with_attribute(segment_attribute()),
    )
    .occurs(segment.min_occurs, max)
}

fn segment_field_element(field: &SegmentField) -> Element {
    Element::simple(
        xml_name(&field.name),
        simple_type(&field.data_type, field.length, field.decimals, FieldContext::IdocSegment),
    )
    .optional()
}

/// Generates schemas from a remote metadata source
pub struct SchemaGenerator<'a> {
    source: &'a dyn RemoteMetadataSource,
    namespace: Option<String>,
}

impl<'a> SchemaGenerator<'a> {
    pub fn new(source: &'a dyn RemoteMetadataSource) -> Self {
        Self {
            source,
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    fn builder(&self) -> SchemaBuilder {
        match &self.namespace {
            Some(namespace) => SchemaBuilder::new().with_namespace(namespace.clone()),
            None => SchemaBuilder::new(),
        }
    }

    /// Input and output schema of one operation.
    ///
    /// `item` is the implementing function for BAPIs and RFCs and the IDOC
    /// type for IDOCs; `extension` only applies to IDOCs.
    pub fn generate_input_output_schema(
        &self,
        kind: OperationKind,
        item: &str,
        extension: Option<&str>,
    ) -> Result<GeneratedSchema> {
        let mut builder = self.builder();
        let (input, output) = match kind {
            OperationKind::Bapi | OperationKind::Rfc => {
                builder.add_function(&self.source.fetch_function_interface(item)?)?
            }
            OperationKind::Idoc => {
                builder.add_idoc(&self.source.fetch_idoc_segment_tree(item, extension)?)?
            }
        };
        Ok(GeneratedSchema {
            document: builder.finish(),
            input,
            output,
        })
    }
}

/// Schema for an already fetched function interface
pub fn function_schema(parameters: &ParameterLists) -> Result<GeneratedSchema> {
    let mut builder = SchemaBuilder::new();
    let (input, output) = builder.add_function(parameters)?;
    Ok(GeneratedSchema {
        document: builder.finish(),
        input,
        output,
    })
}

/// Schema for an already fetched IDOC segment tree
pub fn idoc_schema(root: &SegmentMetadata) -> Result<GeneratedSchema> {
    let mut builder = SchemaBuilder::new();
    let (input, output) = builder.add_idoc(root)?;
    Ok(GeneratedSchema {
        document: builder.finish(),
        input,
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changing_parameters_appear_on_both_sides() {
        let parameters = ParameterLists::new("Z_COUNTER")
            .with_changing(Field::scalar("COUNTER", "I", 4))
            .with_export(Field::scalar("RESULT", "C", 10));

        let schema = function_schema(&parameters).unwrap();
        let names = |element: &Element| -> Vec<String> {
            element
                .complex_type()
                .unwrap()
                .content
                .elements
                .iter()
                .map(|e| e.name.clone())
                .collect()
        };

        assert_eq!(names(schema.input_element().unwrap()), vec!["COUNTER"]);
        assert_eq!(names(schema.output_element().unwrap()), vec!["RESULT", "COUNTER"]);
        assert_eq!(schema.output, "Z_COUNTER.Response");
    }

    #[test]
    fn namespaced_function_names_are_escaped() {
        let schema = function_schema(&ParameterLists::new("/SAPAPO/BAPI_X")).unwrap();
        assert_eq!(schema.input, "_-SAPAPO_-BAPI_X");
    }

    #[test]
    fn self_referencing_structures_terminate() {
        let mut node = StructureDefinition::new("ZNODE").with_field(Field::scalar("ID", "N", 4));
        node.fields.push(Field::structure("NEXT", StructureDefinition::new("ZNODE")));
        let parameters = ParameterLists::new("Z_TREE").with_import(Field::structure("ROOT", node));

        let schema = function_schema(&parameters).unwrap();
        assert_eq!(schema.document.complex_types.len(), 1);
    }

    #[test]
    fn idoc_without_segments_is_rejected() {
        let error = idoc_schema(&SegmentMetadata::root("EMPTY01")).unwrap_err();
        assert_eq!(error.code(), "SCHEMA_GENERATION");
    }

    #[test]
    fn unbounded_segments_use_zero_as_unbounded() {
        let root = SegmentMetadata::root("X").with_child(SegmentMetadata::new("E1X", 0, 0));
        let element = segment_element(&root.children[0]);
        assert_eq!(element.max_occurs, MaxOccurs::Unbounded);
    }
}
