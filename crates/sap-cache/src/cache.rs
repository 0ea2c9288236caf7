//! The metadata cache of one backend system

use crate::loader::{LoaderConfig, MetadataLoader};
use crate::search::search_containers;
use crate::storage::CacheStorageProvider;
use crate::{Error, Result};
use parking_lot::RwLock;
use sap_ir::Node;
use sap_metadata::convert::containers_from_tree;
use sap_metadata::{
    ContainerMap, Filter, OperationKind, ParameterLists, RealignSpec, RemoteMetadataSource,
    SegmentMetadata, TypeContainer, build_component_tree, realign,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// BAPI, RFC and IDOC containers of one backend system.
///
/// Each collection is an immutable snapshot behind a lock. Writers build a
/// new collection and swap it in; readers clone the `Arc` and never see a
/// collection in the middle of a reload.
pub struct MetadataCache {
    id: String,
    storage: Arc<dyn CacheStorageProvider>,
    source: Arc<dyn RemoteMetadataSource>,
    loader: Option<MetadataLoader>,
    bapis: RwLock<Arc<ContainerMap>>,
    rfcs: RwLock<Arc<ContainerMap>>,
    idocs: RwLock<Arc<ContainerMap>>,
}

/// Builder for [`MetadataCache`]
#[derive(Default)]
pub struct MetadataCacheBuilder {
    id: Option<String>,
    storage: Option<Arc<dyn CacheStorageProvider>>,
    source: Option<Arc<dyn RemoteMetadataSource>>,
    loader: Option<LoaderConfig>,
}

impl MetadataCacheBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn storage(mut self, storage: Arc<dyn CacheStorageProvider>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn source(mut self, source: Arc<dyn RemoteMetadataSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Cache interfaces and trees as files through a [`MetadataLoader`]
    pub fn loader(mut self, config: LoaderConfig) -> Self {
        self.loader = Some(config);
        self
    }

    /// Create the cache and bootstrap it.
    ///
    /// Persisted state is loaded first; a full remote reload only happens
    /// when no BAPIs were persisted.
    pub fn build(self) -> Result<MetadataCache> {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| Error::Configuration("cache id must not be empty".to_string()))?;
        let storage = self
            .storage
            .ok_or_else(|| Error::Configuration(format!("cache '{id}' has no storage provider")))?;
        let source = self
            .source
            .ok_or_else(|| Error::Configuration(format!("cache '{id}' has no metadata source")))?;
        let loader = self
            .loader
            .map(|config| MetadataLoader::new(id.clone(), Arc::clone(&source), config));

        let cache = MetadataCache {
            id,
            storage,
            source,
            loader,
            bapis: RwLock::new(Arc::new(ContainerMap::new())),
            rfcs: RwLock::new(Arc::new(ContainerMap::new())),
            idocs: RwLock::new(Arc::new(ContainerMap::new())),
        };
        cache.bootstrap()?;
        Ok(cache)
    }
}

impl MetadataCache {
    pub fn builder() -> MetadataCacheBuilder {
        MetadataCacheBuilder::default()
    }

    fn bootstrap(&self) -> Result<()> {
        self.storage.load_cache(&self.id, self)?;
        if self.snapshot(OperationKind::Bapi).is_empty() {
            info!(cache_id = %self.id, "no persisted business objects, reloading from remote");
            self.reload_all_data()?;
        } else {
            debug!(cache_id = %self.id, "bootstrapped from persisted state");
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &Arc<dyn RemoteMetadataSource> {
        &self.source
    }

    pub fn loader(&self) -> Option<&MetadataLoader> {
        self.loader.as_ref()
    }

    fn slot(&self, kind: OperationKind) -> &RwLock<Arc<ContainerMap>> {
        match kind {
            OperationKind::Bapi => &self.bapis,
            OperationKind::Rfc => &self.rfcs,
            OperationKind::Idoc => &self.idocs,
        }
    }

    /// Current collection of a kind
    pub fn snapshot(&self, kind: OperationKind) -> Arc<ContainerMap> {
        Arc::clone(&self.slot(kind).read())
    }

    /// Replace a whole collection. Returns the number of containers
    /// installed after duplicate keys collapsed.
    pub fn replace_containers(
        &self,
        kind: OperationKind,
        containers: impl IntoIterator<Item = TypeContainer>,
    ) -> usize {
        let mut map = ContainerMap::new();
        for container in containers {
            if let Some(previous) = map.insert(container) {
                debug!(
                    cache_id = %self.id,
                    kind = %kind,
                    value = %previous.value,
                    "duplicate container key, keeping the later one"
                );
            }
        }
        let count = map.len();
        *self.slot(kind).write() = Arc::new(map);
        count
    }

    fn add(&self, kind: OperationKind, container: TypeContainer) {
        let mut slot = self.slot(kind).write();
        if let Some(previous) = Arc::make_mut(&mut slot).insert(container) {
            debug!(
                cache_id = %self.id,
                kind = %kind,
                value = %previous.value,
                "overwrote cached container"
            );
        }
    }

    /// Add or replace a business object by its key
    pub fn add_bapi(&self, container: TypeContainer) {
        self.add(OperationKind::Bapi, container);
    }

    pub fn add_rfc(&self, container: TypeContainer) {
        self.add(OperationKind::Rfc, container);
    }

    pub fn add_idoc(&self, container: TypeContainer) {
        self.add(OperationKind::Idoc, container);
    }

    /// Copy of the business objects, in insertion order
    pub fn get_all_bapis(&self) -> ContainerMap {
        self.snapshot(OperationKind::Bapi).as_ref().clone()
    }

    pub fn get_all_rfcs(&self) -> ContainerMap {
        self.snapshot(OperationKind::Rfc).as_ref().clone()
    }

    pub fn get_all_idocs(&self) -> ContainerMap {
        self.snapshot(OperationKind::Idoc).as_ref().clone()
    }

    /// Reload every kind from the remote source, then persist.
    ///
    /// Kinds are reloaded in order and each swap is atomic. When a later
    /// kind fails, earlier kinds keep their new contents, the error is
    /// returned and nothing is persisted.
    pub fn reload_all_data(&self) -> Result<()> {
        for kind in OperationKind::ALL {
            self.reload(kind)?;
        }
        self.storage.persist_cache(self)?;
        info!(
            cache_id = %self.id,
            bapis = self.snapshot(OperationKind::Bapi).len(),
            rfcs = self.snapshot(OperationKind::Rfc).len(),
            idocs = self.snapshot(OperationKind::Idoc).len(),
            "reloaded all metadata"
        );
        Ok(())
    }

    /// Reload one kind from the remote source without persisting
    pub fn reload(&self, kind: OperationKind) -> Result<usize> {
        let containers = fetch_containers(self.source.as_ref(), kind)?;
        let count = self.replace_containers(kind, containers);
        info!(cache_id = %self.id, kind = %kind, count, "reloaded containers");
        Ok(count)
    }

    fn search(
        &self,
        kind: OperationKind,
        read_from_sap: bool,
        primary: Option<&dyn Filter>,
        secondary: Option<&dyn Filter>,
        description: Option<&dyn Filter>,
    ) -> Result<Vec<TypeContainer>> {
        let containers = if read_from_sap {
            fetch_containers(self.source.as_ref(), kind)?
        } else {
            self.snapshot(kind).to_vec()
        };
        Ok(search_containers(kind, containers, primary, secondary, description))
    }

    /// Search business objects by object type, method and method description
    pub fn search_bapi(
        &self,
        read_from_sap: bool,
        object: Option<&dyn Filter>,
        method: Option<&dyn Filter>,
        description: Option<&dyn Filter>,
    ) -> Result<Vec<TypeContainer>> {
        self.search(OperationKind::Bapi, read_from_sap, object, method, description)
    }

    /// Search functions by name, function group and short text
    pub fn search_rfc(
        &self,
        read_from_sap: bool,
        function: Option<&dyn Filter>,
        group: Option<&dyn Filter>,
        description: Option<&dyn Filter>,
    ) -> Result<Vec<TypeContainer>> {
        self.search(OperationKind::Rfc, read_from_sap, function, group, description)
    }

    /// Search message types by name and description, or by IDOC type
    pub fn search_idoc(
        &self,
        read_from_sap: bool,
        message_type: Option<&dyn Filter>,
        idoc_type: Option<&dyn Filter>,
        description: Option<&dyn Filter>,
    ) -> Result<Vec<TypeContainer>> {
        self.search(OperationKind::Idoc, read_from_sap, message_type, idoc_type, description)
    }

    /// Parameter lists of a function
    pub fn get_function_interface(
        &self,
        function: &str,
        overwrite: bool,
    ) -> Result<ParameterLists> {
        match &self.loader {
            Some(loader) => loader.get_function_interface(function, overwrite),
            None => Ok(self.source.fetch_function_interface(function)?),
        }
    }

    /// Segment tree of an IDOC type
    pub fn get_idoc_interface(
        &self,
        idoc_type: &str,
        extension: Option<&str>,
        overwrite: bool,
    ) -> Result<SegmentMetadata> {
        match &self.loader {
            Some(loader) => loader.get_idoc_interface(idoc_type, extension, overwrite),
            None => Ok(self.source.fetch_idoc_segment_tree(idoc_type, extension)?),
        }
    }

    /// Business object repository tree tagged with the cached business
    /// objects
    pub fn component_tree(&self, overwrite: bool) -> Result<Node> {
        let business_objects: HashSet<String> = self
            .snapshot(OperationKind::Bapi)
            .keys()
            .map(str::to_string)
            .collect();
        if business_objects.is_empty() {
            warn!(
                cache_id = %self.id,
                "no cached business objects, component tree will not be tagged"
            );
        }

        match &self.loader {
            Some(loader) => loader.components(overwrite, &business_objects),
            None => Ok(build_component_tree(
                &self.source.fetch_component_tree()?,
                &business_objects,
            )),
        }
    }
}

/// Fetch the remote list of a kind and turn it into containers
pub(crate) fn fetch_containers(
    source: &dyn RemoteMetadataSource,
    kind: OperationKind,
) -> Result<Vec<TypeContainer>> {
    let rows = source.fetch_rows(kind)?;
    let tree = match kind {
        OperationKind::Bapi => realign(&rows, &RealignSpec::business_objects()),
        OperationKind::Idoc => realign(&rows, &RealignSpec::idoc_messages()),
        OperationKind::Rfc => rows,
    };
    Ok(containers_from_tree(kind, &tree)?)
}
