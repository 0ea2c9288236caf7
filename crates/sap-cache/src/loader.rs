//! Per-kind metadata files and single-flight loading
//!
//! Each kind of metadata is cached as a tree file below the system's cache
//! directory. [`MetadataLoader::get_required_metadata_root`] returns the
//! cached tree when the file exists. Otherwise exactly one caller per
//! `(cache id, kind, item)` fetches and writes the file while the others
//! wait for it.

use crate::layout::{CacheLayout, MetadataKind};
use crate::{Result, xml};
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use sap_ir::Node;
use sap_metadata::convert::{
    interface_from_tree, interface_to_tree, segment_tree_from_node, segment_tree_to_node,
};
use sap_metadata::{
    ParameterLists, RealignSpec, RemoteMetadataSource, SegmentMetadata, build_component_tree,
    realign,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Loader settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// The system's cache directory
    pub cache_dir: PathBuf,
    /// Longest wait before a waiting caller re-checks the cache file
    pub poll_interval: Duration,
}

impl LoaderConfig {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// What to load: a bulk kind, or one function or IDOC type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadRequest {
    pub kind: MetadataKind,
    pub item: Option<String>,
    pub extension: Option<String>,
}

impl LoadRequest {
    pub fn bulk(kind: MetadataKind) -> Self {
        Self {
            kind,
            item: None,
            extension: None,
        }
    }

    pub fn rfc_interface(function: impl Into<String>) -> Self {
        Self {
            kind: MetadataKind::RfcInterface,
            item: Some(function.into()),
            extension: None,
        }
    }

    pub fn idoc_interface(idoc_type: impl Into<String>, extension: Option<&str>) -> Self {
        Self {
            kind: MetadataKind::IdocInterface,
            item: Some(idoc_type.into()),
            extension: extension.map(str::to_string),
        }
    }

    fn cache_file(&self, layout: &CacheLayout) -> PathBuf {
        let item = self.item.as_deref().unwrap_or_default();
        match self.kind {
            MetadataKind::RfcInterface => layout.rfc_interface_file(item),
            MetadataKind::IdocInterface => {
                layout.idoc_interface_file(item, self.extension.as_deref())
            }
            kind => layout
                .bulk_file(kind)
                .unwrap_or_else(|| layout.root().join(format!("{kind}.xml"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FlightKey {
    cache_id: String,
    request: LoadRequest,
}

#[derive(Debug, Default)]
struct Flight {
    loading: Mutex<bool>,
    finished: Condvar,
}

/// Loading flags keyed by `(cache id, kind, item)`.
///
/// Loaders of different systems can share one registry without observing
/// each other's flags.
#[derive(Debug, Default)]
pub struct LoadRegistry {
    flights: DashMap<FlightKey, Arc<Flight>>,
}

impl LoadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn flight(&self, key: &FlightKey) -> Arc<Flight> {
        self.flights.entry(key.clone()).or_default().clone()
    }

    /// Mark the key as loading. `None` when another caller already is.
    fn try_begin(&self, key: &FlightKey) -> Option<LoadGuard<'_>> {
        let flight = self.flight(key);
        {
            let mut loading = flight.loading.lock();
            if *loading {
                return None;
            }
            *loading = true;
        }
        trace!(cache_id = %key.cache_id, kind = %key.request.kind, "load started");
        Some(LoadGuard {
            registry: self,
            key: key.clone(),
            flight,
        })
    }

    /// Wait until the key is no longer loading, or at most `timeout`
    fn wait(&self, key: &FlightKey, timeout: Duration) {
        {
            let flight = self.flight(key);
            let mut loading = flight.loading.lock();
            if *loading {
                flight.finished.wait_for(&mut loading, timeout);
            }
        }
        self.release_idle(key, 0);
    }

    /// Drop the entry of an idle key nobody but the map and `held` callers
    /// refer to
    fn release_idle(&self, key: &FlightKey, held: usize) {
        let removed = self.flights.remove_if(key, |_, flight| {
            Arc::strong_count(flight) <= held + 1 && !*flight.loading.lock()
        });
        if removed.is_some() {
            trace!(cache_id = %key.cache_id, kind = %key.request.kind, "flight released");
        }
    }

    /// Whether a load for the request is in flight
    pub fn is_loading(&self, cache_id: &str, request: &LoadRequest) -> bool {
        let key = FlightKey {
            cache_id: cache_id.to_string(),
            request: request.clone(),
        };
        self.flights
            .get(&key)
            .map(|flight| *flight.loading.lock())
            .unwrap_or(false)
    }

    /// Whether no key is loading or waited on
    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }
}

/// Clears the loading flag and wakes waiters when dropped, including when
/// the load failed. The key is forgotten once no waiter holds it.
#[derive(Debug)]
pub struct LoadGuard<'a> {
    registry: &'a LoadRegistry,
    key: FlightKey,
    flight: Arc<Flight>,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        *self.flight.loading.lock() = false;
        self.flight.finished.notify_all();
        self.registry.release_idle(&self.key, 1);
    }
}

/// Fetches metadata trees and keeps them as files in a system's cache
/// directory
pub struct MetadataLoader {
    cache_id: String,
    source: Arc<dyn RemoteMetadataSource>,
    layout: CacheLayout,
    poll_interval: Duration,
    registry: Arc<LoadRegistry>,
}

impl MetadataLoader {
    pub fn new(
        cache_id: impl Into<String>,
        source: Arc<dyn RemoteMetadataSource>,
        config: LoaderConfig,
    ) -> Self {
        Self {
            cache_id: cache_id.into(),
            source,
            layout: CacheLayout::new(config.cache_dir),
            poll_interval: config.poll_interval,
            registry: Arc::new(LoadRegistry::new()),
        }
    }

    /// Share loading flags with other loaders
    pub fn with_registry(mut self, registry: Arc<LoadRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    pub fn registry(&self) -> &Arc<LoadRegistry> {
        &self.registry
    }

    /// Return the tree for `request`.
    ///
    /// With `overwrite` the tree is always fetched through `load` and the
    /// cache file replaced. Otherwise an existing cache file is read; when
    /// it is absent and another caller is loading the same request, this
    /// call waits and re-checks the file, and only fetches itself once no
    /// load is in flight and the file is still missing.
    pub fn get_required_metadata_root<F>(
        &self,
        overwrite: bool,
        request: &LoadRequest,
        load: F,
    ) -> Result<Node>
    where
        F: FnOnce() -> Result<Node>,
    {
        let key = FlightKey {
            cache_id: self.cache_id.clone(),
            request: request.clone(),
        };
        let path = request.cache_file(&self.layout);

        if overwrite {
            let _guard = self.acquire(&key);
            info!(cache_id = %self.cache_id, kind = %request.kind, "refreshing metadata");
            return load();
        }

        loop {
            if let Some(tree) = xml::read_file(&path)? {
                debug!(
                    cache_id = %self.cache_id,
                    kind = %request.kind,
                    path = %path.display(),
                    "metadata cache hit"
                );
                return Ok(tree);
            }

            match self.registry.try_begin(&key) {
                Some(_guard) => {
                    // The previous loader may have finished between the
                    // file check and the claim.
                    if let Some(tree) = xml::read_file(&path)? {
                        return Ok(tree);
                    }
                    info!(
                        cache_id = %self.cache_id,
                        kind = %request.kind,
                        "metadata cache miss, loading"
                    );
                    return load();
                }
                None => {
                    debug!(
                        cache_id = %self.cache_id,
                        kind = %request.kind,
                        "waiting for concurrent load"
                    );
                    self.registry.wait(&key, self.poll_interval);
                }
            }
        }
    }

    fn acquire(&self, key: &FlightKey) -> LoadGuard<'_> {
        loop {
            if let Some(guard) = self.registry.try_begin(key) {
                return guard;
            }
            self.registry.wait(key, self.poll_interval);
        }
    }

    fn store(&self, path: &Path, tree: Node) -> Result<Node> {
        xml::write_file(path, &tree)?;
        Ok(tree)
    }

    /// Fetch all BAPIs, group them by business object and write the file
    pub fn load_bo_metadata(&self) -> Result<Node> {
        let rows = self.source.fetch_all_bapis()?;
        let tree = realign(&rows, &RealignSpec::business_objects());
        self.store(&self.bulk_path(MetadataKind::BusinessObject), tree)
    }

    /// Fetch all RFCs and write the file
    pub fn load_rfc_metadata(&self) -> Result<Node> {
        let mut rows = self.source.fetch_all_rfcs()?;
        rows.node_type = sap_ir::NodeType::Root;
        self.store(&self.bulk_path(MetadataKind::Rfc), rows)
    }

    /// Fetch all message types, group them and write the file
    pub fn load_idoc_metadata(&self) -> Result<Node> {
        let rows = self.source.fetch_all_idoc_message_types()?;
        let tree = realign(&rows, &RealignSpec::idoc_messages());
        self.store(&self.bulk_path(MetadataKind::Idoc), tree)
    }

    /// Fetch the component list, build the tagged tree and write the file
    pub fn load_component_metadata(&self, business_objects: &HashSet<String>) -> Result<Node> {
        let rows = self.source.fetch_component_tree()?;
        let tree = build_component_tree(&rows, business_objects);
        self.store(&self.bulk_path(MetadataKind::Component), tree)
    }

    /// Fetch one function interface and write its file
    pub fn load_rfc_interface(&self, function: &str) -> Result<Node> {
        let parameters = self.source.fetch_function_interface(function)?;
        self.store(&self.layout.rfc_interface_file(function), interface_to_tree(&parameters))
    }

    /// Fetch one IDOC segment tree and write its file
    pub fn load_idoc_interface(&self, idoc_type: &str, extension: Option<&str>) -> Result<Node> {
        let segments = self.source.fetch_idoc_segment_tree(idoc_type, extension)?;
        self.store(
            &self.layout.idoc_interface_file(idoc_type, extension),
            segment_tree_to_node(&segments),
        )
    }

    fn bulk_path(&self, kind: MetadataKind) -> PathBuf {
        LoadRequest::bulk(kind).cache_file(&self.layout)
    }

    /// Grouped BAPI tree, from the cache file when present
    pub fn business_objects(&self, overwrite: bool) -> Result<Node> {
        let request = LoadRequest::bulk(MetadataKind::BusinessObject);
        self.get_required_metadata_root(overwrite, &request, || self.load_bo_metadata())
    }

    pub fn rfcs(&self, overwrite: bool) -> Result<Node> {
        self.get_required_metadata_root(overwrite, &LoadRequest::bulk(MetadataKind::Rfc), || {
            self.load_rfc_metadata()
        })
    }

    pub fn idocs(&self, overwrite: bool) -> Result<Node> {
        self.get_required_metadata_root(overwrite, &LoadRequest::bulk(MetadataKind::Idoc), || {
            self.load_idoc_metadata()
        })
    }

    /// Component tree tagged against `business_objects`
    pub fn components(&self, overwrite: bool, business_objects: &HashSet<String>) -> Result<Node> {
        self.get_required_metadata_root(overwrite, &LoadRequest::bulk(MetadataKind::Component), || {
            self.load_component_metadata(business_objects)
        })
    }

    /// Parameter lists of a function, from its interface file when present
    pub fn get_function_interface(
        &self,
        function: &str,
        overwrite: bool,
    ) -> Result<ParameterLists> {
        let request = LoadRequest::rfc_interface(function);
        let tree = self.get_required_metadata_root(overwrite, &request, || {
            self.load_rfc_interface(function)
        })?;
        Ok(interface_from_tree(&tree)?)
    }

    /// Segment tree of an IDOC type, from its interface file when present
    pub fn get_idoc_interface(
        &self,
        idoc_type: &str,
        extension: Option<&str>,
        overwrite: bool,
    ) -> Result<SegmentMetadata> {
        let request = LoadRequest::idoc_interface(idoc_type, extension);
        let tree = self.get_required_metadata_root(overwrite, &request, || {
            self.load_idoc_interface(idoc_type, extension)
        })?;
        Ok(segment_tree_from_node(&tree)?)
    }
}
