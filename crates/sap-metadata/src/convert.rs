//! Conversions between the typed model and persisted trees
//!
//! Storage files, loader files and remote responses share one tree shape
//! per kind, so a file written by either path can be read by the other.

use crate::interface::{Field, FieldKind, ParameterLists, StructureDefinition};
use crate::model::{
    BapiMetadata, IdocMetadata, OperationKind, RfcMetadata, TypeContainer, TypeMetadata,
};
use crate::segment::{SegmentField, SegmentMetadata};
use crate::source::templates::{BAPI_LIST, IDOC_MESSAGE_LIST, RFC_LIST};
use crate::{Error, Result};
use sap_ir::{Node, NodeType};
use std::str::FromStr;
use tracing::warn;

const FLAG: &str = "X";

/// Read containers from a persisted tree of the given kind
pub fn containers_from_tree(kind: OperationKind, tree: &Node) -> Result<Vec<TypeContainer>> {
    match kind {
        OperationKind::Bapi => bapi_containers(tree),
        OperationKind::Rfc => rfc_containers(tree),
        OperationKind::Idoc => idoc_containers(tree),
    }
}

fn bapi_containers(tree: &Node) -> Result<Vec<TypeContainer>> {
    tree.children
        .iter()
        .map(|parent| {
            let value = parent
                .attribute("OBJTYPE")
                .ok_or_else(|| Error::malformed(&tree.name, "business object without OBJTYPE"))?;
            let mut container =
                TypeContainer::new(value, parent.attribute("OBJECTNAME").unwrap_or(value));

            for row in &parent.children {
                let method = row.require_field("METHOD")?;
                container.insert_item(TypeMetadata::Bapi(BapiMetadata {
                    method: method.to_string(),
                    method_name: row.field_value("METHODNAME").unwrap_or(method).to_string(),
                    function_name: row.require_field("FUNCTION")?.to_string(),
                    description: row.field_value("DESCRIPT").map(str::to_string),
                }));
            }
            Ok(container)
        })
        .collect()
}

fn rfc_containers(tree: &Node) -> Result<Vec<TypeContainer>> {
    tree.children
        .iter()
        .map(|row| {
            Ok(TypeContainer::for_rfc(RfcMetadata {
                function_name: row.require_field("FUNCNAME")?.to_string(),
                group_name: row.field_value("GROUPNAME").map(str::to_string),
                short_text: row.field_value("STEXT").map(str::to_string),
            }))
        })
        .collect()
}

fn idoc_containers(tree: &Node) -> Result<Vec<TypeContainer>> {
    tree.children
        .iter()
        .map(|parent| {
            let message_type = parent
                .attribute("MESTYP")
                .ok_or_else(|| Error::malformed(&tree.name, "message type without MESTYP"))?;
            let description = parent.attribute("DESCRP");
            let mut container = TypeContainer::new(message_type, message_type);
            container.description = description.map(str::to_string);

            for row in &parent.children {
                container.insert_item(TypeMetadata::Idoc(IdocMetadata {
                    message_type: message_type.to_string(),
                    idoc_type: row.require_field("IDOCTYP")?.to_string(),
                    extension: row.field_value("CIMTYP").map(str::to_string),
                    description: description.map(str::to_string),
                }));
            }
            Ok(container)
        })
        .collect()
}

/// Build the persisted tree for a set of containers
pub fn containers_to_tree<'a>(
    kind: OperationKind,
    containers: impl IntoIterator<Item = &'a TypeContainer>,
) -> Node {
    let (root_name, parents): (&str, Vec<Node>) = match kind {
        OperationKind::Bapi => (
            BAPI_LIST.table,
            containers.into_iter().map(bapi_parent).collect(),
        ),
        OperationKind::Rfc => (
            RFC_LIST.table,
            containers.into_iter().flat_map(rfc_rows).collect(),
        ),
        OperationKind::Idoc => (
            IDOC_MESSAGE_LIST.table,
            containers.into_iter().map(idoc_parent).collect(),
        ),
    };
    Node::new(root_name, NodeType::Root).with_children(parents)
}

fn bapi_parent(container: &TypeContainer) -> Node {
    let mut parent = Node::row()
        .with_attribute("OBJTYPE", &container.value)
        .with_attribute("OBJECTNAME", &container.display_name);
    for item in container.items() {
        match item {
            TypeMetadata::Bapi(bapi) => {
                let mut row = Node::row()
                    .with_field("METHOD", &bapi.method)
                    .with_field("METHODNAME", &bapi.method_name)
                    .with_field("FUNCTION", &bapi.function_name);
                if let Some(description) = &bapi.description {
                    row.add_child(Node::field("DESCRIPT", description));
                }
                parent.add_child(row);
            }
            other => warn!(
                container = %container.value,
                kind = %other.kind(),
                "skipping foreign item"
            ),
        }
    }
    parent
}

fn rfc_rows(container: &TypeContainer) -> Vec<Node> {
    container
        .items()
        .iter()
        .filter_map(|item| match item {
            TypeMetadata::Rfc(rfc) => {
                let mut row = Node::row().with_field("FUNCNAME", &rfc.function_name);
                if let Some(group) = &rfc.group_name {
                    row.add_child(Node::field("GROUPNAME", group));
                }
                if let Some(text) = &rfc.short_text {
                    row.add_child(Node::field("STEXT", text));
                }
                Some(row)
            }
            _ => None,
        })
        .collect()
}

fn idoc_parent(container: &TypeContainer) -> Node {
    let mut parent = Node::row().with_attribute("MESTYP", &container.value);
    if let Some(description) = &container.description {
        parent.set_attribute("DESCRP", description);
    }
    for item in container.items() {
        if let TypeMetadata::Idoc(idoc) = item {
            let mut row = Node::row().with_field("IDOCTYP", &idoc.idoc_type);
            if let Some(extension) = &idoc.extension {
                row.add_child(Node::field("CIMTYP", extension));
            }
            parent.add_child(row);
        }
    }
    parent
}

/// Tree form of a function interface
pub fn interface_to_tree(parameters: &ParameterLists) -> Node {
    let section = |name: &str, fields: &[Field]| {
        Node::new(name, NodeType::Row).with_children(fields.iter().map(field_to_node))
    };

    Node::new("INTERFACE", NodeType::Root)
        .with_attribute("FUNCNAME", &parameters.function_name)
        .with_child(section("IMPORT", &parameters.imports))
        .with_child(section("EXPORT", &parameters.exports))
        .with_child(section("CHANGING", &parameters.changing))
        .with_child(section("TABLES", &parameters.tables))
}

fn field_to_node(field: &Field) -> Node {
    let mut node = Node::new("field", NodeType::Row).with_attribute("NAME", &field.name);
    if let Some(description) = &field.description {
        node.set_attribute("DESCRIPTION", description);
    }
    if field.optional {
        node.set_attribute("OPTIONAL", FLAG);
    }

    match &field.kind {
        FieldKind::Scalar {
            data_type,
            length,
            decimals,
        } => node
            .with_attribute("KIND", "scalar")
            .with_attribute("TYPE", data_type)
            .with_attribute("LENGTH", length.to_string())
            .with_attribute("DECIMALS", decimals.to_string()),
        FieldKind::Structure(definition) => node
            .with_attribute("KIND", "structure")
            .with_attribute("STRUCTURE", &definition.name)
            .with_children(definition.fields.iter().map(field_to_node)),
        FieldKind::Table(definition) => node
            .with_attribute("KIND", "table")
            .with_attribute("STRUCTURE", &definition.name)
            .with_children(definition.fields.iter().map(field_to_node)),
    }
}

/// Read a function interface from its tree form
pub fn interface_from_tree(tree: &Node) -> Result<ParameterLists> {
    let function_name = tree
        .attribute("FUNCNAME")
        .ok_or_else(|| Error::malformed(&tree.name, "interface without FUNCNAME"))?;
    let section = |name: &str| -> Result<Vec<Field>> {
        tree.find_child(name)
            .map(|s| s.children.iter().map(field_from_node).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    };

    Ok(ParameterLists {
        function_name: function_name.to_string(),
        imports: section("IMPORT")?,
        exports: section("EXPORT")?,
        changing: section("CHANGING")?,
        tables: section("TABLES")?,
    })
}

fn field_from_node(node: &Node) -> Result<Field> {
    let name = required_attribute(node, "NAME")?;
    let structure = || -> Result<StructureDefinition> {
        Ok(StructureDefinition {
            name: required_attribute(node, "STRUCTURE")?.to_string(),
            fields: node
                .children
                .iter()
                .map(field_from_node)
                .collect::<Result<_>>()?,
        })
    };

    let kind = match node.attribute("KIND").unwrap_or("scalar") {
        "scalar" => FieldKind::Scalar {
            data_type: required_attribute(node, "TYPE")?.to_string(),
            length: number_attribute(node, "LENGTH")?,
            decimals: number_attribute(node, "DECIMALS")?,
        },
        "structure" => FieldKind::Structure(structure()?),
        "table" => FieldKind::Table(structure()?),
        other => {
            return Err(Error::malformed(
                format!("field {name}"),
                format!("unknown field kind '{other}'"),
            ));
        }
    };

    Ok(Field {
        name: name.to_string(),
        description: node.attribute("DESCRIPTION").map(str::to_string),
        optional: node.attribute("OPTIONAL") == Some(FLAG),
        kind,
    })
}

/// Tree form of an IDOC structure
pub fn segment_tree_to_node(root: &SegmentMetadata) -> Node {
    segment_to_node(root, "IDOC", NodeType::Root)
}

fn segment_to_node(segment: &SegmentMetadata, name: &str, node_type: NodeType) -> Node {
    let mut node = Node::new(name, node_type)
        .with_attribute("SEGMENTTYP", &segment.segment_type)
        .with_attribute("OCCMIN", segment.min_occurs.to_string())
        .with_attribute("OCCMAX", segment.max_occurs.to_string());
    if let Some(description) = &segment.description {
        node.set_attribute("DESCRP", description);
    }

    for field in &segment.fields {
        let mut field_node = Node::new("field", NodeType::Row)
            .with_attribute("NAME", &field.name)
            .with_attribute("TYPE", &field.data_type)
            .with_attribute("LENGTH", field.length.to_string())
            .with_attribute("DECIMALS", field.decimals.to_string());
        if let Some(description) = &field.description {
            field_node.set_attribute("DESCRP", description);
        }
        node.add_child(field_node);
    }

    node.with_children(
        segment
            .children
            .iter()
            .map(|child| segment_to_node(child, "segment", NodeType::Row)),
    )
}

/// Read an IDOC structure from its tree form
pub fn segment_tree_from_node(node: &Node) -> Result<SegmentMetadata> {
    let mut segment = SegmentMetadata::new(
        required_attribute(node, "SEGMENTTYP")?,
        number_attribute(node, "OCCMIN")?,
        number_attribute(node, "OCCMAX")?,
    );
    segment.description = node.attribute("DESCRP").map(str::to_string);

    for child in &node.children {
        match child.name.as_str() {
            "field" => segment.fields.push(SegmentField {
                name: required_attribute(child, "NAME")?.to_string(),
                data_type: required_attribute(child, "TYPE")?.to_string(),
                length: number_attribute(child, "LENGTH")?,
                decimals: number_attribute(child, "DECIMALS")?,
                description: child.attribute("DESCRP").map(str::to_string),
            }),
            "segment" => segment.children.push(segment_tree_from_node(child)?),
            other => {
                return Err(Error::malformed(
                    format!("segment {}", segment.segment_type),
                    format!("unexpected element '{other}'"),
                ));
            }
        }
    }

    Ok(segment)
}

fn required_attribute<'a>(node: &'a Node, key: &str) -> Result<&'a str> {
    node.attribute(key)
        .ok_or_else(|| Error::malformed(&node.name, format!("missing attribute {key}")))
}

fn number_attribute<T>(node: &Node, key: &str) -> Result<T>
where
    T: FromStr + Default,
{
    match node.attribute(key).map(str::trim) {
        None | Some("") => Ok(T::default()),
        Some(raw) => raw.parse().map_err(|_| {
            Error::malformed(&node.name, format!("attribute {key} is not a number: '{raw}'"))
        }),
    }
}
