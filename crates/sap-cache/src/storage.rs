//! Durable storage of cached containers

use crate::cache::MetadataCache;
use crate::layout::CacheLayout;
use crate::{Result, xml};
use parking_lot::Mutex;
use sap_metadata::convert::{containers_from_tree, containers_to_tree};
use sap_metadata::{OperationKind, TypeContainer};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

/// Durable backing store of a [`MetadataCache`]
pub trait CacheStorageProvider: Send + Sync {
    /// Populate `cache` with the state persisted for `id`. Absent state
    /// leaves the cache untouched.
    fn load_cache(&self, id: &str, cache: &MetadataCache) -> Result<()>;

    /// Flush the cache's current collections
    fn persist_cache(&self, cache: &MetadataCache) -> Result<()>;
}

/// One XML file per operation kind below a system's cache directory
#[derive(Debug, Clone)]
pub struct FileCacheStorage {
    layout: CacheLayout,
}

impl FileCacheStorage {
    pub fn new(layout: CacheLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    fn file(&self, kind: OperationKind) -> PathBuf {
        let fallback = || self.layout.root().join(format!("{kind}.xml"));
        self.layout.bulk_file(kind.into()).unwrap_or_else(fallback)
    }
}

impl CacheStorageProvider for FileCacheStorage {
    fn load_cache(&self, id: &str, cache: &MetadataCache) -> Result<()> {
        for kind in OperationKind::ALL {
            let path = self.file(kind);
            let Some(tree) = xml::read_file(&path)? else {
                debug!(cache_id = id, kind = %kind, "no persisted containers");
                continue;
            };
            let count = cache.replace_containers(kind, containers_from_tree(kind, &tree)?);
            info!(
                cache_id = id,
                kind = %kind,
                count,
                path = %path.display(),
                "loaded persisted containers"
            );
        }
        Ok(())
    }

    fn persist_cache(&self, cache: &MetadataCache) -> Result<()> {
        for kind in OperationKind::ALL {
            let snapshot = cache.snapshot(kind);
            let tree = containers_to_tree(kind, snapshot.iter());
            xml::write_file(&self.file(kind), &tree)?;
        }
        info!(cache_id = cache.id(), root = %self.layout.root().display(), "persisted cache");
        Ok(())
    }
}

/// Process-local storage, mainly for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    entries: Mutex<HashMap<(String, OperationKind), Vec<TypeContainer>>>,
    loads: AtomicUsize,
    persists: AtomicUsize,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed persisted state for a cache id
    pub fn with_containers(
        self,
        id: impl Into<String>,
        kind: OperationKind,
        containers: Vec<TypeContainer>,
    ) -> Self {
        self.entries.lock().insert((id.into(), kind), containers);
        self
    }

    pub fn containers(&self, id: &str, kind: OperationKind) -> Vec<TypeContainer> {
        self.entries
            .lock()
            .get(&(id.to_string(), kind))
            .cloned()
            .unwrap_or_default()
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn persist_count(&self) -> usize {
        self.persists.load(Ordering::SeqCst)
    }
}

impl CacheStorageProvider for MemoryCacheStorage {
    fn load_cache(&self, id: &str, cache: &MetadataCache) -> Result<()> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        for kind in OperationKind::ALL {
            let stored = self.entries.lock().get(&(id.to_string(), kind)).cloned();
            if let Some(containers) = stored {
                cache.replace_containers(kind, containers);
            }
        }
        Ok(())
    }

    fn persist_cache(&self, cache: &MetadataCache) -> Result<()> {
        self.persists.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.lock();
        for kind in OperationKind::ALL {
            entries.insert((cache.id().to_string(), kind), cache.snapshot(kind).to_vec());
        }
        Ok(())
    }
}
