#![allow(dead_code)]

use sap_ir::{Document, Node, NodeType};
use sap_metadata::{
    Error, Field, ParameterLists, RemoteMetadataSource, Result, SegmentField,
    SegmentMetadata, StructureDefinition,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Remote source double that counts calls per operation
#[derive(Default)]
pub struct CountingSource {
    pub bapi_calls: AtomicUsize,
    pub rfc_calls: AtomicUsize,
    pub idoc_calls: AtomicUsize,
    pub component_calls: AtomicUsize,
    pub interface_calls: AtomicUsize,
    pub segment_calls: AtomicUsize,
    /// Extra RFC rows returned after `grow_rfcs`
    pub grown: AtomicBool,
    pub fail_idocs: AtomicBool,
    pub delay: Duration,
}

impl CountingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn remote_calls(&self) -> usize {
        self.bapi_calls.load(Ordering::SeqCst)
            + self.rfc_calls.load(Ordering::SeqCst)
            + self.idoc_calls.load(Ordering::SeqCst)
    }

    fn pause(&self) {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
    }
}

pub fn table(name: &str, rows: Vec<Node>) -> Node {
    Node::new(name, NodeType::Table).with_children(rows)
}

pub fn bapi_row(objtype: &str, objname: &str, method: &str, description: &str) -> Node {
    Node::row()
        .with_field("OBJTYPE", objtype)
        .with_field("OBJECTNAME", objname)
        .with_field("METHOD", method.to_uppercase())
        .with_field("METHODNAME", method)
        .with_field("FUNCTION", format!("BAPI_{objname}_{}", method.to_uppercase()))
        .with_field("DESCRIPT", description)
}

pub fn rfc_row(name: &str, group: &str) -> Node {
    Node::row()
        .with_field("FUNCNAME", name)
        .with_field("GROUPNAME", group)
        .with_field("STEXT", format!("{name} text"))
}

pub fn idoc_row(message: &str, idoc: &str, extension: &str) -> Node {
    Node::row()
        .with_field("MESTYP", message)
        .with_field("IDOCTYP", idoc)
        .with_field("CIMTYP", extension)
        .with_field("DESCRP", format!("{message} message"))
}

fn component(id: &str, parent: &str, child: &str, next: &str, name: &str) -> Node {
    Node::row()
        .with_field("ID", id)
        .with_field("PARENT", parent)
        .with_field("CHILD", child)
        .with_field("NEXT", next)
        .with_field("NAME", name)
}

impl RemoteMetadataSource for CountingSource {
    fn fetch_all_bapis(&self) -> Result<Node> {
        self.bapi_calls.fetch_add(1, Ordering::SeqCst);
        self.pause();
        Ok(table(
            "API_METHODS",
            vec![
                bapi_row("KNA1", "CUSTOMER", "GetList", "List customers"),
                bapi_row("BUS1001", "MATERIAL", "GetList", "List materials"),
                bapi_row("KNA1", "CUSTOMER", "GetDetail", "Customer details"),
                bapi_row("KNA1", "CUSTOMER", "Create", "Create customer"),
            ],
        ))
    }

    fn fetch_all_rfcs(&self) -> Result<Node> {
        self.rfc_calls.fetch_add(1, Ordering::SeqCst);
        self.pause();
        let mut rows = vec![
            rfc_row("RFC_PING", "SYST"),
            rfc_row("RFC_READ_TABLE", "SDTX"),
        ];
        if self.grown.load(Ordering::SeqCst) {
            rows.push(rfc_row("RFC_SYSTEM_INFO", "SYST"));
            rows.push(rfc_row("BAPI_TRANSACTION_COMMIT", "BAPT"));
        }
        Ok(table("FUNCTIONS", rows))
    }

    fn fetch_all_idoc_message_types(&self) -> Result<Node> {
        self.idoc_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_idocs.load(Ordering::SeqCst) {
            return Err(Error::remote_call("IDOCTYPES_LIST_WITH_MESSAGES", "connection reset"));
        }
        Ok(table(
            "PT_MESSAGES",
            vec![
                idoc_row("ORDERS", "ORDERS05", ""),
                idoc_row("MATMAS", "MATMAS05", ""),
                idoc_row("ORDERS", "ORDERS05", "ZORDERS"),
            ],
        ))
    }

    fn fetch_component_tree(&self) -> Result<Node> {
        self.component_calls.fetch_add(1, Ordering::SeqCst);
        self.pause();
        Ok(table(
            "NODETAB",
            vec![
                component("1", "", "2", "4", "SD"),
                component("2", "1", "", "3", "KNA1"),
                component("3", "1", "", "", "VBAK"),
                component("4", "", "5", "", "MM"),
                component("5", "4", "", "", "BUS1001"),
            ],
        ))
    }

    fn fetch_function_interface(&self, name: &str) -> Result<ParameterLists> {
        self.interface_calls.fetch_add(1, Ordering::SeqCst);
        self.pause();
        if name.starts_with("Z_MISSING") {
            return Err(Error::not_found("function", name));
        }
        let line =
            StructureDefinition::new("BAPIRET2").with_field(Field::scalar("MESSAGE", "C", 220));
        Ok(ParameterLists::new(name)
            .with_import(Field::scalar("MAXROWS", "I", 4).optional())
            .with_table(Field::table("RETURN", line)))
    }

    fn fetch_idoc_segment_tree(
        &self,
        idoc_type: &str,
        extension: Option<&str>,
    ) -> Result<SegmentMetadata> {
        self.segment_calls.fetch_add(1, Ordering::SeqCst);
        Ok(SegmentMetadata::root(extension.unwrap_or(idoc_type)).with_child(
            SegmentMetadata::new("E1EDK01", 1, 1).with_field(SegmentField::new("CURCY", "CUKY", 3)),
        ))
    }

    fn execute_named_function(&self, request: &Document) -> Result<Document> {
        Err(Error::remote_call(request.function_name(), "not scripted"))
    }
}
