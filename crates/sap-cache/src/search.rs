//! Filtered search over containers
//!
//! A container whose identity matches the primary filter is returned whole.
//! Otherwise matching items are copied into a trimmed container with the
//! same identity, which is returned only when at least one item matched.
//!
//! For BAPIs and RFCs the item test applies the secondary filter first and
//! then, when set, the description filter, whose outcome replaces the
//! secondary result. For IDOCs the description filter tests the container
//! description alongside the primary filter and the secondary filter tests
//! the IDOC type of each item.

use sap_metadata::{Filter, OperationKind, TypeContainer, TypeMetadata};

/// Search `containers` with the optional filters.
///
/// With no filter set the input is returned unchanged.
pub fn search_containers(
    kind: OperationKind,
    containers: Vec<TypeContainer>,
    primary: Option<&dyn Filter>,
    secondary: Option<&dyn Filter>,
    description: Option<&dyn Filter>,
) -> Vec<TypeContainer> {
    if primary.is_none() && secondary.is_none() && description.is_none() {
        return containers;
    }

    containers
        .into_iter()
        .filter_map(|container| match kind {
            OperationKind::Bapi | OperationKind::Rfc => {
                search_operations(container, primary, secondary, description)
            }
            OperationKind::Idoc => search_messages(container, primary, secondary, description),
        })
        .collect()
}

fn search_operations(
    container: TypeContainer,
    primary: Option<&dyn Filter>,
    secondary: Option<&dyn Filter>,
    description: Option<&dyn Filter>,
) -> Option<TypeContainer> {
    if primary.is_some_and(|filter| {
        filter.matches(&container.value) || filter.matches(&container.display_name)
    }) {
        return Some(container);
    }
    if secondary.is_none() && description.is_none() {
        return None;
    }

    let mut trimmed = container.trimmed();
    for item in container.items() {
        let mut matched = false;
        if let Some(filter) = secondary {
            matched = operation_names(item).iter().any(|name| filter.matches(name));
        }
        if let Some(filter) = description {
            matched = item.description().is_some_and(|text| filter.matches(text));
        }
        if matched {
            trimmed.insert_item(item.clone());
        }
    }

    (trimmed.item_count() > 0).then_some(trimmed)
}

fn search_messages(
    container: TypeContainer,
    primary: Option<&dyn Filter>,
    secondary: Option<&dyn Filter>,
    description: Option<&dyn Filter>,
) -> Option<TypeContainer> {
    let primary_hit = primary.is_some_and(|filter| {
        filter.matches(&container.value) || filter.matches(&container.display_name)
    });
    let description_hit = description.is_some_and(|filter| {
        container
            .description
            .as_deref()
            .is_some_and(|text| filter.matches(text))
    });
    if primary_hit || description_hit {
        return Some(container);
    }

    let filter = secondary?;
    let mut trimmed = container.trimmed();
    for item in container.items() {
        if operation_names(item).iter().any(|name| filter.matches(name)) {
            trimmed.insert_item(item.clone());
        }
    }

    (trimmed.item_count() > 0).then_some(trimmed)
}

/// Names the secondary filter is tested against
fn operation_names(item: &TypeMetadata) -> Vec<&str> {
    match item {
        TypeMetadata::Bapi(bapi) => vec![bapi.method.as_str(), bapi.method_name.as_str()],
        TypeMetadata::Rfc(rfc) => rfc.group_name.as_deref().into_iter().collect(),
        TypeMetadata::Idoc(idoc) => {
            let mut names = vec![idoc.idoc_type.as_str()];
            names.extend(idoc.extension.as_deref());
            names
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sap_metadata::{BapiMetadata, IdocMetadata, RfcMetadata, SubstringFilter, WildcardFilter};

    fn method(key: &str, name: &str, description: &str) -> TypeMetadata {
        TypeMetadata::Bapi(BapiMetadata {
            method: key.to_string(),
            method_name: name.to_string(),
            function_name: format!("BAPI_CUSTOMER_{key}"),
            description: Some(description.to_string()),
        })
    }

    fn customer() -> TypeContainer {
        TypeContainer::new("KNA1", "Customer")
            .with_item(method("GETLIST", "GetList", "List customers"))
            .with_item(method("GETDETAIL", "GetDetail", "Read customer details"))
            .with_item(method("CREATE", "Create", "Create a customer"))
    }

    fn orders() -> TypeContainer {
        let item = |idoc: &str, extension: Option<&str>| {
            TypeMetadata::Idoc(IdocMetadata {
                message_type: "ORDERS".to_string(),
                idoc_type: idoc.to_string(),
                extension: extension.map(str::to_string),
                description: Some("Purchase order".to_string()),
            })
        };
        TypeContainer::new("ORDERS", "ORDERS")
            .with_description("Purchase order")
            .with_item(item("ORDERS04", None))
            .with_item(item("ORDERS05", Some("ZORDERS")))
    }

    #[test]
    fn no_filters_return_input_unchanged() {
        let input = vec![customer()];
        let output = search_containers(OperationKind::Bapi, input.clone(), None, None, None);
        assert_eq!(output, input);
    }

    #[test]
    fn primary_match_keeps_whole_container() {
        let object = WildcardFilter::new("kna*").unwrap();
        let method_filter = WildcardFilter::new("NOTHING").unwrap();

        let output = search_containers(
            OperationKind::Bapi,
            vec![customer()],
            Some(&object),
            Some(&method_filter),
            None,
        );
        assert_eq!(output[0].item_count(), 3);
    }

    #[test]
    fn secondary_match_trims_container() {
        let method_filter = WildcardFilter::new("GetDetail").unwrap();

        let output = search_containers(
            OperationKind::Bapi,
            vec![customer()],
            None,
            Some(&method_filter),
            None,
        );

        assert_eq!(output.len(), 1);
        assert_eq!(output[0].value, "KNA1");
        assert_eq!(output[0].display_name, "Customer");
        assert_eq!(output[0].item_count(), 1);
        assert!(output[0].item("GETDETAIL").is_some());
    }

    #[test]
    fn description_outcome_replaces_secondary_outcome() {
        let method_filter = WildcardFilter::new("GETLIST").unwrap();
        let description = SubstringFilter::new("details");

        let output = search_containers(
            OperationKind::Bapi,
            vec![customer()],
            None,
            Some(&method_filter),
            Some(&description),
        );

        let keys: Vec<String> = output[0].items().iter().map(TypeMetadata::key).collect();
        assert_eq!(keys, vec!["GETDETAIL"]);
    }

    #[test]
    fn unmatched_containers_are_dropped() {
        let method_filter = WildcardFilter::new("DELETE").unwrap();
        let output = search_containers(
            OperationKind::Bapi,
            vec![customer()],
            None,
            Some(&method_filter),
            None,
        );
        assert!(output.is_empty());
    }

    #[test]
    fn rfc_secondary_filter_tests_function_group() {
        let container = |name: &str, group: &str| {
            TypeContainer::for_rfc(RfcMetadata {
                function_name: name.to_string(),
                group_name: Some(group.to_string()),
                short_text: None,
            })
        };
        let group = WildcardFilter::new("SYST").unwrap();

        let output = search_containers(
            OperationKind::Rfc,
            vec![container("RFC_PING", "SYST"), container("RFC_READ_TABLE", "SDTX")],
            None,
            Some(&group),
            None,
        );

        assert_eq!(output.len(), 1);
        assert_eq!(output[0].value, "RFC_PING");
    }

    #[test]
    fn idoc_description_matches_container_and_secondary_matches_type() {
        let description = SubstringFilter::new("purchase");
        let whole = search_containers(
            OperationKind::Idoc,
            vec![orders()],
            None,
            None,
            Some(&description),
        );
        assert_eq!(whole[0].item_count(), 2);

        let idoc_type = WildcardFilter::new("ORDERS05").unwrap();
        let trimmed = search_containers(
            OperationKind::Idoc,
            vec![orders()],
            None,
            Some(&idoc_type),
            None,
        );
        assert_eq!(trimmed[0].item_count(), 1);
        assert!(trimmed[0].item("ORDERS05:ZORDERS").is_some());
    }

    #[test]
    fn idoc_primary_matches_display_name() {
        let renamed = TypeContainer::new("ZORD", "ORDERS_CUSTOM")
            .with_item(orders().items()[0].clone());
        let message = WildcardFilter::new("ORDERS_C*").unwrap();

        let output = search_containers(
            OperationKind::Idoc,
            vec![orders(), renamed],
            Some(&message),
            None,
            None,
        );

        assert_eq!(output.len(), 1);
        assert_eq!(output[0].value, "ZORD");
        assert_eq!(output[0].item_count(), 1);
    }
}
