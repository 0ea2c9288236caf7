//! Regrouping of flat remote row lists into trees
//!
//! Generic remote calls return one row per (parent, child) pair with the
//! parent's attributes repeated on every row. [`realign`] folds those rows
//! into one parent per distinct key, in first-occurrence order, with the
//! parent attributes lifted off the children.

use sap_ir::{Node, NodeType};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Marker set on ancestors of a business object in the component tree
pub const HAS_BUSINESS_OBJECT: &str = "HAS_BO";
/// Marker set on business object nodes in the component tree
pub const IS_BUSINESS_OBJECT: &str = "IS_BO";
/// Name of the component tree root
pub const COMPONENT_TREE_ROOT: &str = "BOR_TREE";

const MARKER: &str = "X";

/// Grouping key and the parent attributes lifted off each row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealignSpec {
    pub key: String,
    /// Head fields copied onto the parent and stripped from children.
    /// Always contains the key.
    pub head_fields: Vec<String>,
}

impl RealignSpec {
    pub fn new(key: impl Into<String>, head_fields: &[&str]) -> Self {
        let key = key.into();
        let mut fields: Vec<String> = vec![key.clone()];
        fields.extend(
            head_fields
                .iter()
                .filter(|field| **field != key)
                .map(|field| (*field).to_string()),
        );
        Self {
            key,
            head_fields: fields,
        }
    }

    /// BAPI methods grouped by business object type
    pub fn business_objects() -> Self {
        Self::new("OBJTYPE", &["OBJTYPE", "OBJECTNAME"])
    }

    /// IDOC types grouped by message type
    pub fn idoc_messages() -> Self {
        Self::new("MESTYP", &["MESTYP", "DESCRP"])
    }
}

/// Group the rows of `table` by `spec.key`.
///
/// The result is a root named after the table whose children are one parent
/// row per distinct key value, in first-occurrence order. Each parent
/// carries the head fields of its first row as attributes; its children are
/// the grouped rows, in original order, without the head fields.
pub fn realign(table: &Node, spec: &RealignSpec) -> Node {
    let heads: Vec<&str> = spec.head_fields.iter().map(String::as_str).collect();
    let mut parents: Vec<Node> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for row in &table.children {
        let key = row.field_value(&spec.key).unwrap_or_default().to_string();
        let child = row.without_fields(&heads);

        match positions.get(&key) {
            Some(&position) => parents[position].children.push(child),
            None => {
                let mut parent = Node::new(row.name.clone(), NodeType::Row);
                for head in &heads {
                    if let Some(value) = row.field_value(head) {
                        parent.set_attribute(*head, value);
                    }
                }
                parent.children.push(child);
                trace!(key = %key, "new realignment group");
                positions.insert(key, parents.len());
                parents.push(parent);
            }
        }
    }

    debug!(
        table = %table.name,
        rows = table.children.len(),
        groups = parents.len(),
        "realigned flat rows"
    );

    Node::new(table.name.clone(), NodeType::Root).with_children(parents)
}

/// Build the business object repository tree from its flat node list.
///
/// Rows carry `ID`, `PARENT`, `CHILD` (first child) and `NEXT` (next
/// sibling) pointers. Nodes whose `NAME` is one of `business_objects` are
/// tagged `IS_BO`; their ancestors are tagged `HAS_BO`.
pub fn build_component_tree(table: &Node, business_objects: &HashSet<String>) -> Node {
    let rows = &table.children;
    let mut by_id: HashMap<&str, usize> = HashMap::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        if let Some(id) = row.field_value("ID") {
            by_id.insert(id, index);
        }
    }

    let mut visited = vec![false; rows.len()];
    let mut roots = Vec::new();

    // Top level: the first parentless row and its sibling chain, then any
    // parentless rows the chain did not reach.
    let parentless: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            row.field_value("PARENT")
                .is_none_or(|parent| !by_id.contains_key(parent))
        })
        .map(|(index, _)| index)
        .collect();

    if let Some(&first) = parentless.first() {
        roots.extend(build_sibling_chain(
            rows,
            &by_id,
            Some(first),
            business_objects,
            &mut visited,
        ));
    }
    for index in parentless {
        if !visited[index] {
            roots.extend(build_sibling_chain(
                rows,
                &by_id,
                Some(index),
                business_objects,
                &mut visited,
            ));
        }
    }

    let mut root = Node::new(COMPONENT_TREE_ROOT, NodeType::Root).with_children(roots);
    if root.children.iter().any(is_marked) {
        root.set_attribute(HAS_BUSINESS_OBJECT, MARKER);
    }
    root
}

fn build_sibling_chain(
    rows: &[Node],
    by_id: &HashMap<&str, usize>,
    start: Option<usize>,
    business_objects: &HashSet<String>,
    visited: &mut [bool],
) -> Vec<Node> {
    let mut chain = Vec::new();
    let mut current = start;

    while let Some(index) = current {
        if visited[index] {
            break;
        }
        visited[index] = true;
        let row = &rows[index];

        let first_child = row.field_value("CHILD").and_then(|id| by_id.get(id).copied());
        let children = build_sibling_chain(rows, by_id, first_child, business_objects, visited);
        chain.push(component_node(row, children, business_objects));

        current = row.field_value("NEXT").and_then(|id| by_id.get(id).copied());
    }

    chain
}

fn component_node(row: &Node, children: Vec<Node>, business_objects: &HashSet<String>) -> Node {
    let mut node = Node::new("node", NodeType::Row);
    for field in &row.children {
        if matches!(field.name.as_str(), "ID" | "PARENT" | "CHILD" | "NEXT") {
            continue;
        }
        if let Some(value) = row.field_value(&field.name) {
            node.set_attribute(field.name.clone(), value);
        }
    }

    if row
        .field_value("NAME")
        .is_some_and(|name| business_objects.contains(name))
    {
        node.set_attribute(IS_BUSINESS_OBJECT, MARKER);
    }
    if children.iter().any(is_marked) {
        node.set_attribute(HAS_BUSINESS_OBJECT, MARKER);
    }

    node.with_children(children)
}

fn is_marked(node: &Node) -> bool {
    node.attribute(IS_BUSINESS_OBJECT).is_some() || node.attribute(HAS_BUSINESS_OBJECT).is_some()
}

/// Copy of a component tree with only the branches that lead to business
/// objects.
pub fn prune_to_business_objects(tree: &Node) -> Node {
    Node {
        children: tree
            .children
            .iter()
            .filter(|child| is_marked(child))
            .map(prune_to_business_objects)
            .collect(),
        ..tree.clone()
    }
}
