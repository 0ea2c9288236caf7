//! XML form of metadata trees
//!
//! Element names are node names, attributes are node attributes and scalar
//! values are element text. Attributes are written in key order so equal
//! trees always serialize to equal bytes. Node types are not stored; on
//! read the document element is the root, childless elements without
//! attributes are fields and everything else is a row.

use crate::{Error, Result};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use sap_ir::{Node, NodeType};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Serialize a tree to an indented XML document
pub fn to_xml_string(node: &Node) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| Error::xml(&node.name, e))?;
    write_node(&mut writer, node)?;

    String::from_utf8(writer.into_inner()).map_err(|e| Error::xml(&node.name, e))
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<()> {
    let mut start = BytesStart::new(node.name.as_str());
    for (key, value) in &node.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    let value = node.value.as_deref().filter(|v| !v.is_empty());
    if node.children.is_empty() && value.is_none() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| Error::xml(&node.name, e));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| Error::xml(&node.name, e))?;
    if let Some(value) = value {
        writer
            .write_event(Event::Text(BytesText::new(value)))
            .map_err(|e| Error::xml(&node.name, e))?;
    }
    for child in &node.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(node.name.as_str())))
        .map_err(|e| Error::xml(&node.name, e))
}

/// Parse an XML document into a tree
pub fn from_xml_str(xml: &str) -> Result<Node> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::xml(
                "document",
                format!("at position {}: {e}", reader.buffer_position()),
            )
        })?;

        match event {
            Event::Start(start) => stack.push(element(&start)?),
            Event::Empty(start) => {
                let node = element(&start)?;
                close(node, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| Error::xml("text", e))?;
                if let Some(current) = stack.last_mut() {
                    current.value = Some(text.into_owned());
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.value = Some(String::from_utf8_lossy(&data.into_inner()).into_owned());
                }
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| Error::xml("document", "unbalanced end tag"))?;
                close(node, &mut stack, &mut root)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(Error::xml("document", "unexpected end of document"));
    }
    root.ok_or_else(|| Error::xml("document", "no root element"))
}

fn element(start: &BytesStart<'_>) -> Result<Node> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut node = Node::new(name, NodeType::Row);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| Error::xml(&node.name, e))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| Error::xml(&node.name, e))?
            .into_owned();
        node.set_attribute(key, value);
    }
    Ok(node)
}

fn close(mut node: Node, stack: &mut [Node], root: &mut Option<Node>) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            if node.children.is_empty() && node.attributes.is_empty() {
                node.node_type = NodeType::Field;
            }
            parent.children.push(node);
            Ok(())
        }
        None if root.is_none() => {
            node.node_type = NodeType::Root;
            *root = Some(node);
            Ok(())
        }
        None => Err(Error::xml("document", "more than one root element")),
    }
}

/// Read a tree from a file. An absent file is `None`.
pub fn read_file(path: &Path) -> Result<Option<Node>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            trace!(path = %path.display(), "cache file absent");
            return Ok(None);
        }
        Err(e) => return Err(Error::storage("read", path, e)),
    };

    from_xml_str(&content)
        .map(Some)
        .map_err(|e| match e {
            Error::Xml { message, .. } => Error::xml(path.display().to_string(), message),
            other => other,
        })
}

/// Write a tree to a file.
///
/// The document is written to a sibling temporary file first and renamed
/// into place, so readers see either the previous file or the new one.
pub fn write_file(path: &Path, node: &Node) -> Result<()> {
    let content = to_xml_string(node)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::storage("create directory", parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::storage("write", path, "path has no file name"))?;
    let temporary = path.with_file_name(format!(
        ".{file_name}.{}.{}.tmp",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    fs::write(&temporary, content).map_err(|e| Error::storage("write", &temporary, e))?;
    if let Err(e) = fs::rename(&temporary, path) {
        let _ = fs::remove_file(&temporary);
        return Err(Error::storage("rename", path, e));
    }

    debug!(path = %path.display(), "wrote cache file");
    Ok(())
}
