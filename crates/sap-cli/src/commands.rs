//! Command implementations

use anyhow::{Context, anyhow, bail};
use sap_cache::{MetadataCache, MetadataKind};
use sap_ir::{Node, Traversal, walk};
use sap_metadata::realign::IS_BUSINESS_OBJECT;
use sap_metadata::{
    Filter, OperationKind, TypeContainer, TypeMetadata, WildcardFilter, prune_to_business_objects,
};
use sap_schema::xsd::to_xsd_string;
use sap_schema::{GeneratedSchema, MethodDescriptor, function_schema, idoc_schema};
use std::sync::Arc;
use tracing::{debug, info};

const BULK_KINDS: [MetadataKind; 3] = [
    MetadataKind::BusinessObject,
    MetadataKind::Rfc,
    MetadataKind::Idoc,
];

pub fn reload(cache: &MetadataCache, kind: Option<OperationKind>) -> anyhow::Result<()> {
    match kind {
        Some(kind) => {
            let count = cache.reload(kind)?;
            println!("{kind}: {count}");
        }
        None => {
            cache.reload_all_data()?;
            for kind in OperationKind::ALL {
                println!("{kind}: {}", cache.snapshot(kind).len());
            }
        }
    }
    Ok(())
}

/// Wildcard patterns of a search, one per search criterion
#[derive(Debug, Default)]
pub struct SearchPatterns {
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub description: Option<String>,
}

fn wildcard(pattern: &Option<String>) -> anyhow::Result<Option<WildcardFilter>> {
    Ok(pattern.as_deref().map(WildcardFilter::new).transpose()?)
}

fn as_filter(filter: &Option<WildcardFilter>) -> Option<&dyn Filter> {
    filter.as_ref().map(|f| f as &dyn Filter)
}

pub fn search(
    cache: &MetadataCache,
    kind: OperationKind,
    patterns: &SearchPatterns,
    remote: bool,
    json: bool,
) -> anyhow::Result<()> {
    let primary = wildcard(&patterns.primary)?;
    let secondary = wildcard(&patterns.secondary)?;
    let description = wildcard(&patterns.description)?;
    let (primary, secondary, description) = (
        as_filter(&primary),
        as_filter(&secondary),
        as_filter(&description),
    );

    let found = match kind {
        OperationKind::Bapi => cache.search_bapi(remote, primary, secondary, description)?,
        OperationKind::Rfc => cache.search_rfc(remote, primary, secondary, description)?,
        OperationKind::Idoc => cache.search_idoc(remote, primary, secondary, description)?,
    };
    debug!(kind = %kind, remote, hits = found.len(), "search finished");

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
    } else {
        for line in found.iter().flat_map(container_lines) {
            println!("{line}");
        }
    }
    Ok(())
}

fn container_lines(container: &TypeContainer) -> Vec<String> {
    let mut lines = vec![join_columns(&[
        container.value.as_str(),
        container.display_name.as_str(),
        container.description.as_deref().unwrap_or_default(),
    ])];
    for item in container.items() {
        lines.push(format!(
            "    {}",
            join_columns(&[
                item.key().as_str(),
                item.operation_name(),
                item.description().unwrap_or_default()
            ])
        ));
    }
    lines
}

fn join_columns(columns: &[&str]) -> String {
    columns
        .iter()
        .filter(|column| !column.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\t")
}

pub fn interface(
    cache: &MetadataCache,
    kind: OperationKind,
    name: &str,
    extension: Option<&str>,
    refresh: bool,
) -> anyhow::Result<()> {
    let json = match kind {
        OperationKind::Bapi | OperationKind::Rfc => {
            if extension.is_some() {
                bail!("extensions only apply to IDOC types");
            }
            serde_json::to_string_pretty(&cache.get_function_interface(name, refresh)?)?
        }
        OperationKind::Idoc => {
            serde_json::to_string_pretty(&cache.get_idoc_interface(name, extension, refresh)?)?
        }
    };
    println!("{json}");
    Ok(())
}

fn schema_for(
    cache: &MetadataCache,
    item: &TypeMetadata,
    refresh: bool,
) -> anyhow::Result<GeneratedSchema> {
    let schema = match item {
        TypeMetadata::Bapi(_) | TypeMetadata::Rfc(_) => {
            function_schema(&cache.get_function_interface(item.operation_name(), refresh)?)?
        }
        TypeMetadata::Idoc(idoc) => idoc_schema(&cache.get_idoc_interface(
            &idoc.idoc_type,
            idoc.extension.as_deref(),
            refresh,
        )?)?,
    };
    Ok(schema)
}

pub fn generate(
    cache: &MetadataCache,
    kind: OperationKind,
    container_key: &str,
    item_key: Option<&str>,
    namespace: Option<String>,
    descriptor: bool,
    refresh: bool,
) -> anyhow::Result<()> {
    let snapshot = cache.snapshot(kind);
    let container = snapshot
        .get(container_key)
        .ok_or_else(|| anyhow!("{kind} '{container_key}' is not cached"))?;
    let item = match item_key {
        Some(key) => container
            .item(key)
            .ok_or_else(|| anyhow!("{kind} '{container_key}' has no operation '{key}'"))?,
        None => container
            .items()
            .first()
            .ok_or_else(|| anyhow!("{kind} '{container_key}' has no operations"))?,
    };

    let mut schema = schema_for(cache, item, refresh)
        .with_context(|| format!("generating schema for {container_key} {}", item.key()))?;
    if namespace.is_some() {
        schema.document.target_namespace = namespace;
    }

    if descriptor {
        let descriptor = MethodDescriptor::for_item(container, item, &schema)?;
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
    } else {
        println!("{}", to_xsd_string(&schema.document)?);
    }
    Ok(())
}

/// Renders a component tree as indented lines
#[derive(Debug, Default)]
struct TreePrinter {
    lines: Vec<String>,
}

impl Traversal for TreePrinter {
    fn visit(&mut self, node: &Node, path: &[String]) {
        if path.is_empty() {
            self.lines.push(node.name.clone());
            return;
        }
        let mut line = format!(
            "{}{}",
            "  ".repeat(path.len()),
            node.attribute("NAME").unwrap_or(&node.name)
        );
        if let Some(text) = node.attribute("TEXT") {
            line.push_str("  ");
            line.push_str(text);
        }
        if node.attribute(IS_BUSINESS_OBJECT).is_some() {
            line.push_str("  [BO]");
        }
        self.lines.push(line);
    }
}

fn render_tree(tree: &Node) -> Vec<String> {
    let mut printer = TreePrinter::default();
    walk(tree, &mut printer);
    printer.lines
}

pub fn components(cache: &MetadataCache, prune: bool, refresh: bool) -> anyhow::Result<()> {
    let tree = cache.component_tree(refresh)?;
    let tree = if prune { prune_to_business_objects(&tree) } else { tree };
    for line in render_tree(&tree) {
        println!("{line}");
    }
    Ok(())
}

fn load_bulk(cache: &MetadataCache, kind: MetadataKind, refresh: bool) -> anyhow::Result<usize> {
    let loader = cache
        .loader()
        .ok_or_else(|| anyhow!("cache '{}' has no loader", cache.id()))?;
    let tree = match kind {
        MetadataKind::BusinessObject => loader.business_objects(refresh)?,
        MetadataKind::Rfc => loader.rfcs(refresh)?,
        MetadataKind::Idoc => loader.idocs(refresh)?,
        other => bail!("{other} is not a bulk kind"),
    };
    Ok(tree.children.len())
}

/// Load every bulk cache file with `parallel` concurrent requests per kind.
///
/// Concurrent requests for one kind share a single remote fetch. The
/// component tree is loaded last since it is tagged with the business
/// objects.
pub async fn warm(cache: Arc<MetadataCache>, parallel: usize, refresh: bool) -> anyhow::Result<()> {
    let mut handles = Vec::new();
    for kind in BULK_KINDS {
        for _ in 0..parallel.max(1) {
            let cache = Arc::clone(&cache);
            handles.push(tokio::task::spawn_blocking(move || {
                load_bulk(&cache, kind, refresh).map(|count| (kind, count))
            }));
        }
    }

    let mut loaded = Vec::with_capacity(handles.len());
    for handle in handles {
        loaded.push(handle.await??);
    }

    let components = {
        let cache = Arc::clone(&cache);
        tokio::task::spawn_blocking(move || cache.component_tree(refresh)).await??
    };

    for kind in BULK_KINDS {
        if let Some((_, count)) = loaded.iter().find(|(loaded_kind, _)| *loaded_kind == kind) {
            println!("{kind}: {count}");
        }
    }
    println!("{}: {}", MetadataKind::Component, components.children.len());
    info!(cache_id = %cache.id(), requests = loaded.len(), "cache files warmed");
    Ok(())
}
