//! Fixed request templates for the generic metadata functions

use sap_ir::Document;

/// A metadata function, the table carrying its rows, and its fixed imports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTemplate {
    pub function: &'static str,
    pub table: &'static str,
    pub imports: &'static [(&'static str, &'static str)],
}

impl RequestTemplate {
    pub fn request(&self) -> Document {
        self.imports
            .iter()
            .fold(Document::request(self.function), |request, (name, value)| {
                request.with_import(*name, *value)
            })
    }
}

pub const BAPI_LIST: RequestTemplate = RequestTemplate {
    function: "SWO_QUERY_API_METHODS",
    table: "API_METHODS",
    imports: &[],
};

pub const RFC_LIST: RequestTemplate = RequestTemplate {
    function: "RFC_FUNCTION_SEARCH",
    table: "FUNCTIONS",
    imports: &[("FUNCNAME", "*")],
};

pub const IDOC_MESSAGE_LIST: RequestTemplate = RequestTemplate {
    function: "IDOCTYPES_LIST_WITH_MESSAGES",
    table: "PT_MESSAGES",
    imports: &[],
};

pub const COMPONENT_LIST: RequestTemplate = RequestTemplate {
    function: "RS_COMPONENT_VIEW",
    table: "NODETAB",
    imports: &[("OBJECT_TYPE", "SOBJ"), ("REFRESH", "X")],
};

pub const FUNCTION_INTERFACE: &str = "RFC_GET_FUNCTION_INTERFACE";
pub const FUNCTION_PARAMS_TABLE: &str = "PARAMS";

pub const FIELD_INFO: &str = "DDIF_FIELDINFO_GET";
pub const FIELD_INFO_TABLE: &str = "DFIES_TAB";

pub const IDOC_TYPE_READ: &str = "IDOCTYPE_READ_COMPLETE";
pub const IDOC_SEGMENTS_TABLE: &str = "PT_SEGMENTS";
pub const IDOC_FIELDS_TABLE: &str = "PT_FIELDS";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_request_carries_fixed_imports() {
        let request = COMPONENT_LIST.request();
        assert_eq!(request.function_name(), "RS_COMPONENT_VIEW");
        assert_eq!(request.field("OBJECT_TYPE"), Some("SOBJ"));
        assert_eq!(request.field("REFRESH"), Some("X"));
        assert_eq!(RFC_LIST.request().field("FUNCNAME"), Some("*"));
    }
}
