#![allow(dead_code)]

use sap_ir::{Document, Node, NodeType};
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn cargo_bin() -> PathBuf {
    if let Ok(path) = env::var("CARGO_BIN_EXE_sapmeta") {
        return PathBuf::from(path);
    }

    let target_dir = env::var("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| repo_root().join("target"));
    let executable_name = format!("sapmeta{}", std::env::consts::EXE_SUFFIX);
    let fallback = target_dir.join("debug").join(executable_name);

    if fallback.exists() {
        return fallback;
    }

    panic!(
        "CARGO_BIN_EXE_sapmeta is not set and fallback binary was not found at {}",
        fallback.display()
    );
}

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

/// Scratch workspace with recorded responses and a configuration file
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("temporary directory");
        let workspace = Self { dir };
        std::fs::create_dir_all(workspace.fixtures()).expect("fixtures directory");
        record_system(&workspace.fixtures());
        std::fs::write(
            workspace.config(),
            format!(
                "system_id: DEV\ncache_dir: {}\nfixtures_dir: {}\n\
                 poll_interval_ms: 50\nlog_filter: warn\n",
                workspace.cache_root().display(),
                workspace.fixtures().display()
            ),
        )
        .expect("configuration file");
        workspace
    }

    pub fn fixtures(&self) -> PathBuf {
        self.dir.path().join("fixtures")
    }

    pub fn cache_root(&self) -> PathBuf {
        self.dir.path().join("cache")
    }

    /// Cache directory of the configured system
    pub fn system_cache(&self) -> PathBuf {
        self.cache_root().join("DEV")
    }

    pub fn config(&self) -> PathBuf {
        self.dir.path().join("sapmeta.yaml")
    }

    pub fn run(&self, args: &[&str]) -> Output {
        let config = self.config();
        let mut full = vec!["--config", config.to_str().expect("UTF-8 path")];
        full.extend_from_slice(args);
        Command::new(cargo_bin())
            .args(&full)
            .env_remove("RUST_LOG")
            .output()
            .expect("run sapmeta")
    }

    /// Run and return stdout, failing the test on a non-zero exit
    pub fn stdout(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "expected {args:?} to succeed; stdout: {}; stderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).expect("stdout should be UTF-8")
    }
}

fn row(fields: &[(&str, &str)]) -> Node {
    fields
        .iter()
        .fold(Node::row(), |row, (name, value)| row.with_field(*name, *value))
}

fn record(dir: &Path, file: &str, function: &str, tables: Vec<(&str, Vec<Node>)>) {
    let root = tables
        .into_iter()
        .fold(Node::new(function, NodeType::Root), |root, (name, rows)| {
            root.with_child(Node::new(name, NodeType::Table).with_children(rows))
        });
    let json = serde_json::to_string_pretty(&Document::new(root)).expect("serializable document");
    std::fs::write(dir.join(file), json).expect("fixture file");
}

fn bapi(objtype: &str, objname: &str, method: &str, method_name: &str, function: &str) -> Node {
    let description = format!("{objname} {method_name}");
    row(&[
        ("OBJTYPE", objtype),
        ("OBJECTNAME", objname),
        ("METHOD", method),
        ("METHODNAME", method_name),
        ("FUNCTION", function),
        ("DESCRIPT", description.as_str()),
    ])
}

fn component(id: &str, parent: &str, child: &str, next: &str, name: &str, text: &str) -> Node {
    row(&[
        ("ID", id),
        ("PARENT", parent),
        ("CHILD", child),
        ("NEXT", next),
        ("NAME", name),
        ("TEXT", text),
        ("TYPE", "OBJ"),
    ])
}

/// Responses of a small system: two business objects, two functions,
/// three message type pairings and one IDOC type.
fn record_system(dir: &Path) {
    record(
        dir,
        "SWO_QUERY_API_METHODS.json",
        "SWO_QUERY_API_METHODS",
        vec![(
            "API_METHODS",
            vec![
                bapi("KNA1", "Customer", "GETLIST", "GetList", "BAPI_CUSTOMER_GETLIST"),
                bapi("KNA1", "Customer", "GETDETAIL", "GetDetail", "BAPI_CUSTOMER_GETDETAIL"),
                bapi(
                    "BUS2032",
                    "SalesOrder",
                    "CREATEFROMDAT2",
                    "CreateFromDat2",
                    "BAPI_SALESORDER_CREATEFROMDAT2",
                ),
            ],
        )],
    );
    record(
        dir,
        "RFC_FUNCTION_SEARCH.json",
        "RFC_FUNCTION_SEARCH",
        vec![(
            "FUNCTIONS",
            vec![
                row(&[
                    ("FUNCNAME", "RFC_PING"),
                    ("GROUPNAME", "SYST"),
                    ("STEXT", "Connection test"),
                ]),
                row(&[
                    ("FUNCNAME", "BAPI_CUSTOMER_GETLIST"),
                    ("GROUPNAME", "V02D"),
                    ("STEXT", "Customer list"),
                ]),
            ],
        )],
    );
    record(
        dir,
        "IDOCTYPES_LIST_WITH_MESSAGES.json",
        "IDOCTYPES_LIST_WITH_MESSAGES",
        vec![(
            "PT_MESSAGES",
            vec![
                row(&[
                    ("MESTYP", "ORDERS"),
                    ("IDOCTYP", "ORDERS05"),
                    ("CIMTYP", ""),
                    ("DESCRP", "Purchase order"),
                ]),
                row(&[
                    ("MESTYP", "ORDERS"),
                    ("IDOCTYP", "ORDERS05"),
                    ("CIMTYP", "ZORDERS"),
                    ("DESCRP", "Purchase order"),
                ]),
                row(&[
                    ("MESTYP", "MATMAS"),
                    ("IDOCTYP", "MATMAS05"),
                    ("CIMTYP", ""),
                    ("DESCRP", "Material master"),
                ]),
            ],
        )],
    );
    record(
        dir,
        "RS_COMPONENT_VIEW.json",
        "RS_COMPONENT_VIEW",
        vec![(
            "NODETAB",
            vec![
                component("1", "", "2", "4", "SD", "Sales"),
                component("2", "1", "", "3", "KNA1", "Customer"),
                component("3", "1", "", "", "VBAK", "Sales document"),
                component("4", "", "5", "", "FI", "Financials"),
                component("5", "4", "", "", "BKPF", "Accounting document"),
            ],
        )],
    );
    record(
        dir,
        "RFC_GET_FUNCTION_INTERFACE.BAPI_CUSTOMER_GETLIST.json",
        "RFC_GET_FUNCTION_INTERFACE",
        vec![(
            "PARAMS",
            vec![
                row(&[
                    ("PARAMCLASS", "I"),
                    ("PARAMETER", "MAXROWS"),
                    ("EXID", "I"),
                    ("INTLENGTH", "4"),
                    ("OPTIONAL", "X"),
                ]),
                row(&[
                    ("PARAMCLASS", "I"),
                    ("PARAMETER", "CPDONLY"),
                    ("EXID", "C"),
                    ("INTLENGTH", "2"),
                ]),
                row(&[
                    ("PARAMCLASS", "T"),
                    ("PARAMETER", "ADDRESSDATA"),
                    ("TABNAME", "BAPICUSTOMER_ADDRESSDATA"),
                ]),
            ],
        )],
    );
    record(
        dir,
        "DDIF_FIELDINFO_GET.BAPICUSTOMER_ADDRESSDATA.json",
        "DDIF_FIELDINFO_GET",
        vec![(
            "DFIES_TAB",
            vec![
                row(&[("FIELDNAME", "CUSTOMER"), ("DATATYPE", "CHAR"), ("LENG", "10")]),
                row(&[("FIELDNAME", "NAME"), ("DATATYPE", "CHAR"), ("LENG", "35")]),
                row(&[("FIELDNAME", "POSTL_COD1"), ("DATATYPE", "NUMC"), ("LENG", "5")]),
            ],
        )],
    );
    record(
        dir,
        "IDOCTYPE_READ_COMPLETE.ORDERS05.json",
        "IDOCTYPE_READ_COMPLETE",
        vec![
            (
                "PT_SEGMENTS",
                vec![
                    row(&[
                        ("NR", "1"),
                        ("SEGMENTTYP", "E1EDK01"),
                        ("OCCMIN", "1"),
                        ("OCCMAX", "1"),
                    ]),
                    row(&[
                        ("NR", "2"),
                        ("SEGMENTTYP", "E1EDP01"),
                        ("OCCMIN", "0"),
                        ("OCCMAX", "999999"),
                    ]),
                    row(&[
                        ("NR", "3"),
                        ("SEGMENTTYP", "E1EDP19"),
                        ("PARSEG", "E1EDP01"),
                        ("OCCMIN", "0"),
                        ("OCCMAX", "99"),
                    ]),
                ],
            ),
            (
                "PT_FIELDS",
                vec![
                    row(&[
                        ("SEGMENTTYP", "E1EDK01"),
                        ("FIELDNAME", "BELNR"),
                        ("DATATYPE", "CHAR"),
                        ("EXTLEN", "35"),
                    ]),
                    row(&[
                        ("SEGMENTTYP", "E1EDP01"),
                        ("FIELDNAME", "EDATU"),
                        ("DATATYPE", "DATS"),
                        ("EXTLEN", "8"),
                    ]),
                    row(&[
                        ("SEGMENTTYP", "E1EDP19"),
                        ("FIELDNAME", "IDTNR"),
                        ("DATATYPE", "CHAR"),
                        ("EXTLEN", "35"),
                    ]),
                ],
            ),
        ],
    );
}
