//! Metadata source built on generic remote function calls

use super::templates::{
    BAPI_LIST, COMPONENT_LIST, FIELD_INFO, FIELD_INFO_TABLE, FUNCTION_INTERFACE,
    FUNCTION_PARAMS_TABLE, IDOC_FIELDS_TABLE, IDOC_MESSAGE_LIST, IDOC_SEGMENTS_TABLE,
    IDOC_TYPE_READ, RFC_LIST, RequestTemplate,
};
use super::{FunctionExecutor, RemoteMetadataSource, check_return};
use crate::interface::{Field, FieldKind, ParameterLists, StructureDefinition};
use crate::segment::{SegmentField, SegmentMetadata};
use crate::{Error, Result};
use sap_ir::{Document, Node, NodeType};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Behaviour switches for [`RfcMetadataSource`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RfcSourceConfig {
    /// Backend is a Unicode system: character-like parameter lengths
    /// reported in bytes are halved.
    pub unicode: bool,
}

impl Default for RfcSourceConfig {
    fn default() -> Self {
        Self { unicode: true }
    }
}

/// [`RemoteMetadataSource`] that reads metadata through generic functions
/// executed by a [`FunctionExecutor`]
pub struct RfcMetadataSource<E> {
    executor: E,
    config: RfcSourceConfig,
}

impl<E: FunctionExecutor> RfcMetadataSource<E> {
    pub fn new(executor: E) -> Self {
        Self::with_config(executor, RfcSourceConfig::default())
    }

    pub fn with_config(executor: E, config: RfcSourceConfig) -> Self {
        Self { executor, config }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    fn call(&self, request: &Document) -> Result<Document> {
        debug!(function = %request.function_name(), "executing remote function");
        let response = self.executor.execute(request)?;
        check_return(&response)?;
        Ok(response)
    }

    fn fetch_table(&self, template: &RequestTemplate) -> Result<Node> {
        let response = self.call(&template.request())?;
        let table = response
            .table(template.table)
            .cloned()
            .unwrap_or_else(|| Node::new(template.table, NodeType::Table));
        info!(
            function = template.function,
            rows = table.children.len(),
            "fetched metadata rows"
        );
        Ok(table)
    }

    fn parameter_field(
        &self,
        row: &Node,
        class: &str,
        structures: &mut HashMap<String, StructureDefinition>,
    ) -> Result<Field> {
        let name = row.require_field("PARAMETER")?;
        let exid = row.field_value("EXID").unwrap_or("C");
        let type_name = || {
            row.field_value("TABNAME").ok_or_else(|| {
                Error::malformed(
                    format!("parameter {name}"),
                    "structured parameter without TABNAME",
                )
            })
        };

        let kind = if class == "T" || exid == "h" {
            FieldKind::Table(self.resolve_structure(type_name()?, &mut Vec::new(), structures)?)
        } else if exid == "u" || exid == "v" {
            FieldKind::Structure(self.resolve_structure(type_name()?, &mut Vec::new(), structures)?)
        } else {
            let length = row.parse_field::<u32>("INTLENGTH")?.unwrap_or(0);
            FieldKind::Scalar {
                data_type: exid.to_string(),
                length: self.character_length(exid, length),
                decimals: row.parse_field::<u32>("DECIMALS")?.unwrap_or(0),
            }
        };

        Ok(Field {
            name: name.to_string(),
            description: row.field_value("PARAMTEXT").map(str::to_string),
            optional: row.field_value("OPTIONAL") == Some("X"),
            kind,
        })
    }

    fn character_length(&self, exid: &str, length: u32) -> u32 {
        if self.config.unicode && matches!(exid, "C" | "N" | "D" | "T") {
            length / 2
        } else {
            length
        }
    }

    fn resolve_structure(
        &self,
        name: &str,
        resolving: &mut Vec<String>,
        structures: &mut HashMap<String, StructureDefinition>,
    ) -> Result<StructureDefinition> {
        if let Some(definition) = structures.get(name) {
            return Ok(definition.clone());
        }
        if resolving.iter().any(|pending| pending == name) {
            return Err(Error::malformed(
                format!("structure {name}"),
                format!("recursive type reference via {}", resolving.join(" -> ")),
            ));
        }
        resolving.push(name.to_string());

        let request = Document::request(FIELD_INFO)
            .with_import("TABNAME", name)
            .with_import("ALL_TYPES", "X");
        let response = self.call(&request)?;
        let rows = response.rows(FIELD_INFO_TABLE);
        if rows.is_empty() {
            return Err(Error::not_found("structure", name));
        }

        let mut definition = StructureDefinition::new(name);
        for row in rows {
            let field_name = row.require_field("FIELDNAME")?;
            if field_name.starts_with('.')
                || row.field_value("LFIELDNAME").is_some_and(|l| l.contains('-'))
            {
                continue;
            }

            let kind = match row.require_field("DATATYPE")? {
                "STRU" => FieldKind::Structure(self.resolve_structure(
                    row.require_field("ROLLNAME")?,
                    resolving,
                    structures,
                )?),
                "TTYP" => FieldKind::Table(self.resolve_structure(
                    row.require_field("ROLLNAME")?,
                    resolving,
                    structures,
                )?),
                data_type => FieldKind::Scalar {
                    data_type: data_type.to_string(),
                    length: row.parse_field::<u32>("LENG")?.unwrap_or(0),
                    decimals: row.parse_field::<u32>("DECIMALS")?.unwrap_or(0),
                },
            };

            definition.fields.push(Field {
                name: field_name.to_string(),
                description: row.field_value("FIELDTEXT").map(str::to_string),
                optional: false,
                kind,
            });
        }

        resolving.pop();
        structures.insert(name.to_string(), definition.clone());
        Ok(definition)
    }
}

impl<E: FunctionExecutor> RemoteMetadataSource for RfcMetadataSource<E> {
    fn fetch_all_bapis(&self) -> Result<Node> {
        self.fetch_table(&BAPI_LIST)
    }

    fn fetch_all_rfcs(&self) -> Result<Node> {
        self.fetch_table(&RFC_LIST)
    }

    fn fetch_all_idoc_message_types(&self) -> Result<Node> {
        self.fetch_table(&IDOC_MESSAGE_LIST)
    }

    fn fetch_component_tree(&self) -> Result<Node> {
        self.fetch_table(&COMPONENT_LIST)
    }

    fn fetch_function_interface(&self, name: &str) -> Result<ParameterLists> {
        let request = Document::request(FUNCTION_INTERFACE).with_import("FUNCNAME", name);
        let response = self.call(&request)?;
        let rows = response.rows(FUNCTION_PARAMS_TABLE);
        if rows.is_empty() {
            return Err(Error::not_found("function", name));
        }

        let mut parameters = ParameterLists::new(name);
        let mut structures = HashMap::new();
        for row in rows {
            let class = row.require_field("PARAMCLASS")?;
            let target = match class {
                "I" => &mut parameters.imports,
                "E" => &mut parameters.exports,
                "C" => &mut parameters.changing,
                "T" => &mut parameters.tables,
                "X" => continue,
                other => {
                    warn!(function = name, class = other, "skipping unknown parameter class");
                    continue;
                }
            };
            target.push(self.parameter_field(row, class, &mut structures)?);
        }

        debug!(
            function = name,
            imports = parameters.imports.len(),
            exports = parameters.exports.len(),
            tables = parameters.tables.len(),
            "resolved function interface"
        );
        Ok(parameters)
    }

    fn fetch_idoc_segment_tree(
        &self,
        idoc_type: &str,
        extension: Option<&str>,
    ) -> Result<SegmentMetadata> {
        let mut request = Document::request(IDOC_TYPE_READ).with_import("PI_IDOCTYP", idoc_type);
        if let Some(extension) = extension {
            request = request.with_import("PI_CIMTYP", extension);
        }
        let response = self.call(&request)?;
        let segments = response.rows(IDOC_SEGMENTS_TABLE);
        if segments.is_empty() {
            return Err(Error::not_found("IDOC type", idoc_type));
        }

        let root = SegmentMetadata::root(extension.unwrap_or(idoc_type));
        build_segment_tree(root, segments, response.rows(IDOC_FIELDS_TABLE))
    }

    fn execute_named_function(&self, request: &Document) -> Result<Document> {
        self.call(request)
    }
}

/// Rebuild a segment tree from the flat segment and field lists.
///
/// Segments are ordered by `NR` (row order when absent) and attached to the
/// segment named by `PARSEG`; fields keep their row order.
pub(crate) fn build_segment_tree(
    mut root: SegmentMetadata,
    segment_rows: &[Node],
    field_rows: &[Node],
) -> Result<SegmentMetadata> {
    let context = format!("IDOC {}", root.segment_type);

    let mut order: Vec<(u32, usize)> = Vec::with_capacity(segment_rows.len());
    for (row_index, row) in segment_rows.iter().enumerate() {
        let number = row.parse_field::<u32>("NR")?.unwrap_or(row_index as u32);
        order.push((number, row_index));
    }
    order.sort_by_key(|(number, row_index)| (*number, *row_index));

    let mut nodes: Vec<Option<SegmentMetadata>> = Vec::with_capacity(order.len());
    let mut parents: Vec<Option<&str>> = Vec::with_capacity(order.len());
    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(order.len());
    for &(_, row_index) in &order {
        let row = &segment_rows[row_index];
        let segment_type = row.require_field("SEGMENTTYP")?;
        let mut segment = SegmentMetadata::new(
            segment_type,
            row.parse_field::<u64>("OCCMIN")?.unwrap_or(0),
            row.parse_field::<u64>("OCCMAX")?.unwrap_or(1),
        );
        segment.description = row.field_value("DESCRP").map(str::to_string);
        positions.insert(segment_type, nodes.len());
        nodes.push(Some(segment));
        parents.push(row.field_value("PARSEG"));
    }

    for row in field_rows {
        let segment_type = row.require_field("SEGMENTTYP")?;
        let position = *positions.get(segment_type).ok_or_else(|| {
            Error::malformed(&context, format!("field row for unknown segment {segment_type}"))
        })?;
        let length = match row.parse_field::<u32>("EXTLEN")? {
            Some(length) => length,
            None => row.parse_field::<u32>("INTLEN")?.unwrap_or(0),
        };
        if let Some(segment) = nodes[position].as_mut() {
            segment.fields.push(SegmentField {
                name: row.require_field("FIELDNAME")?.to_string(),
                data_type: row.require_field("DATATYPE")?.to_string(),
                length,
                decimals: row.parse_field::<u32>("DECIMALS")?.unwrap_or(0),
                description: row.field_value("DESCRP").map(str::to_string),
            });
        }
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut top_level = Vec::new();
    for (position, parent) in parents.iter().enumerate() {
        match parent {
            None => top_level.push(position),
            Some(parent) => {
                let parent_position = *positions.get(parent).ok_or_else(|| {
                    Error::malformed(&context, format!("unknown parent segment {parent}"))
                })?;
                children[parent_position].push(position);
            }
        }
    }

    let total = nodes.len();
    let mut assembled = 0;
    for position in top_level {
        root.children
            .push(assemble(position, &mut nodes, &children, &mut assembled));
    }
    if assembled != total {
        return Err(Error::malformed(
            &context,
            "segment parent references form a cycle",
        ));
    }

    Ok(root)
}

fn assemble(
    position: usize,
    nodes: &mut [Option<SegmentMetadata>],
    children: &[Vec<usize>],
    assembled: &mut usize,
) -> SegmentMetadata {
    let mut segment = nodes[position].take().unwrap_or_else(|| SegmentMetadata::new("", 0, 0));
    *assembled += 1;
    for &child in &children[position] {
        segment.children.push(assemble(child, nodes, children, assembled));
    }
    segment
}
