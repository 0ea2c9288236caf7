mod common;

use common::Workspace;

#[test]
fn reload_prints_counts_and_persists_every_kind() {
    let workspace = Workspace::new();

    let stdout = workspace.stdout(&["reload"]);

    assert_eq!(stdout.lines().collect::<Vec<_>>(), vec!["SAPBAPI: 2", "SAPRFC: 2", "SAPIDOC: 2"]);
    for file in ["BOMetadata.xml", "RFCMetadata.xml", "IDOCMetadata.xml"] {
        assert!(workspace.system_cache().join(file).exists(), "{file} should be persisted");
    }
}

#[test]
fn search_filters_with_wildcards() {
    let workspace = Workspace::new();

    let stdout = workspace.stdout(&["search", "bapi", "--primary", "kna*"]);
    let lines: Vec<_> = stdout.lines().collect();
    assert!(lines[0].starts_with("KNA1\tCustomer"), "unexpected output: {stdout}");
    assert!(lines.iter().any(|line| line.starts_with("    GETLIST\tBAPI_CUSTOMER_GETLIST")));
    assert!(!stdout.contains("BUS2032"));

    let stdout = workspace.stdout(&["search", "rfc", "-m", "SYST"]);
    assert!(stdout.starts_with("RFC_PING"));
    assert!(!stdout.contains("BAPI_CUSTOMER_GETLIST"));
}

#[test]
fn idoc_search_as_json_groups_extensions() {
    let workspace = Workspace::new();

    let stdout = workspace.stdout(&["search", "idoc", "--primary", "ORDERS", "--json"]);
    let found: serde_json::Value =
        serde_json::from_str(&stdout).expect("search output should be JSON");

    let containers = found.as_array().expect("array of containers");
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0]["value"], "ORDERS");
    assert_eq!(containers[0]["items"].as_array().map(Vec::len), Some(2));
}

#[test]
fn persisted_cache_answers_without_remote_lists() {
    let workspace = Workspace::new();
    workspace.stdout(&["reload"]);

    for fixture in [
        "SWO_QUERY_API_METHODS.json",
        "RFC_FUNCTION_SEARCH.json",
        "IDOCTYPES_LIST_WITH_MESSAGES.json",
    ] {
        std::fs::remove_file(workspace.fixtures().join(fixture)).expect("remove fixture");
    }

    let stdout = workspace.stdout(&["search", "bapi", "--primary", "BUS2032"]);
    assert!(stdout.starts_with("BUS2032\tSalesOrder"));

    let output = workspace.run(&["search", "rfc", "--remote"]);
    assert!(!output.status.success(), "a remote search needs the recorded list");
}

#[test]
fn interface_is_fetched_once_and_cached_as_file() {
    let workspace = Workspace::new();

    let stdout = workspace.stdout(&["interface", "rfc", "BAPI_CUSTOMER_GETLIST"]);
    let parameters: serde_json::Value =
        serde_json::from_str(&stdout).expect("interface output should be JSON");
    assert_eq!(parameters["imports"][1]["name"], "CPDONLY");
    assert_eq!(parameters["imports"][1]["kind"]["Scalar"]["length"], 1);
    assert_eq!(parameters["imports"][0]["optional"], true);

    let file = workspace
        .system_cache()
        .join("Interfaces")
        .join("RFC")
        .join("RFCInterface_BAPI_CUSTOMER_GETLIST.xml");
    assert!(file.exists());

    let fixture = "RFC_GET_FUNCTION_INTERFACE.BAPI_CUSTOMER_GETLIST.json";
    std::fs::remove_file(workspace.fixtures().join(fixture)).expect("remove fixture");
    let cached = workspace.stdout(&["interface", "rfc", "BAPI_CUSTOMER_GETLIST"]);
    assert_eq!(cached, stdout);

    let output = workspace.run(&["interface", "rfc", "BAPI_CUSTOMER_GETLIST", "--refresh"]);
    assert!(!output.status.success(), "a refresh goes back to the remote system");
}

#[test]
fn unknown_function_leaves_no_interface_file() {
    let workspace = Workspace::new();

    let output = workspace.run(&["interface", "rfc", "Z_UNKNOWN"]);

    assert!(!output.status.success());
    assert!(
        !workspace
            .system_cache()
            .join("Interfaces/RFC/RFCInterface_Z_UNKNOWN.xml")
            .exists()
    );
}

#[test]
fn generate_prints_function_schema() {
    let workspace = Workspace::new();

    let xsd = workspace.stdout(&["generate", "bapi", "KNA1", "--item", "GETLIST"]);

    assert!(xsd.contains(r#"<xsd:element name="BAPI_CUSTOMER_GETLIST">"#), "{xsd}");
    assert!(xsd.contains(r#"<xsd:element name="BAPI_CUSTOMER_GETLIST.Response">"#));
    assert_eq!(xsd.matches(r#"<xsd:complexType name="BAPICUSTOMER_ADDRESSDATA">"#).count(), 1);
    assert!(xsd.contains(r#"<xsd:pattern value="\d+"/>"#));
}

#[test]
fn generate_descriptor_for_idoc_extension() {
    let workspace = Workspace::new();

    let stdout = workspace.stdout(&[
        "generate",
        "idoc",
        "ORDERS",
        "--item",
        "ORDERS05:ZORDERS",
        "--descriptor",
        "--namespace",
        "urn:sap-com:document:sap:idoc:messages",
    ]);
    let descriptor: serde_json::Value =
        serde_json::from_str(&stdout).expect("descriptor should be JSON");

    assert_eq!(descriptor["operation"], "ORDERS.ORDERS05:ZORDERS");
    assert_eq!(descriptor["input_element"], "ZORDERS");
    assert_eq!(descriptor["output_element"], "ZORDERS.Response");
    assert_eq!(descriptor["extension"], "ZORDERS");
    let schema = descriptor["schema"].as_str().expect("schema text");
    assert!(schema.contains(r#"targetNamespace="urn:sap-com:document:sap:idoc:messages""#));
    assert!(schema.contains(r#"<xsd:complexType name="EDI_DC40">"#));
}

#[test]
fn generate_rejects_uncached_operations() {
    let workspace = Workspace::new();

    let output = workspace.run(&["generate", "bapi", "KNA1", "--item", "DELETE"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no operation 'DELETE'"));
}

#[test]
fn components_are_tagged_and_pruned() {
    let workspace = Workspace::new();

    let full = workspace.stdout(&["components"]);
    assert!(full.contains("  FI  Financials"));
    assert!(full.contains("    KNA1  Customer  [BO]"));

    let pruned = workspace.stdout(&["components", "--prune"]);
    assert_eq!(
        pruned.lines().collect::<Vec<_>>(),
        vec!["BOR_TREE", "  SD  Sales", "    KNA1  Customer  [BO]"]
    );
    assert!(workspace.system_cache().join("ComponentMetadata.xml").exists());
}

#[test]
fn warm_loads_every_bulk_file() {
    let workspace = Workspace::new();

    let stdout = workspace.stdout(&["warm", "--parallel", "3"]);

    assert_eq!(
        stdout.lines().collect::<Vec<_>>(),
        vec!["business_object: 2", "rfc: 2", "idoc: 2", "component: 2"]
    );
    for file in ["BOMetadata.xml", "RFCMetadata.xml", "IDOCMetadata.xml", "ComponentMetadata.xml"] {
        assert!(workspace.system_cache().join(file).exists(), "{file} should be written");
    }
}

#[test]
fn empty_system_id_fails_fast() {
    let workspace = Workspace::new();

    let output = workspace.run(&["--system", " ", "reload"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("system_id must not be empty"));
    assert!(!workspace.cache_root().exists());
}
