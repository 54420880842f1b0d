//! In-memory version store.
//!
//! Each logical resource owns a [`VersionChain`]: a vector of immutable
//! records behind its own `RwLock`. The map from key to chain is only
//! write-locked to insert a new chain, so appends to different resources
//! never contend on anything but that brief insertion.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::core::{NewVersion, VersionStore};
use crate::error::StorageResult;
use crate::types::{HistoryParams, ResourceKey, VersionRecord, next_last_modified};

#[derive(Debug, Default)]
struct VersionChain {
    versions: RwLock<Vec<Arc<VersionRecord>>>,
}

/// Volatile [`VersionStore`] backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    chains: RwLock<HashMap<ResourceKey, Arc<VersionChain>>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn chain(&self, key: &ResourceKey) -> Option<Arc<VersionChain>> {
        self.chains.read().get(key).cloned()
    }

    fn chain_or_insert(&self, key: &ResourceKey) -> Arc<VersionChain> {
        if let Some(chain) = self.chain(key) {
            return chain;
        }
        self.chains
            .write()
            .entry(key.clone())
            .or_default()
            .clone()
    }
}

#[async_trait]
impl VersionStore for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn append(
        &self,
        key: &ResourceKey,
        version: NewVersion,
    ) -> StorageResult<Arc<VersionRecord>> {
        let chain = self.chain_or_insert(key);
        let mut versions = chain.versions.write();

        let previous = versions.last().map(Arc::as_ref);
        let version_id = previous.map_or(1, |prev| prev.version_id() + 1);
        let last_modified = next_last_modified(previous);

        let record = Arc::new(version.into_record(key.clone(), version_id, last_modified));
        versions.push(record.clone());

        Ok(record)
    }

    async fn head(&self, key: &ResourceKey) -> StorageResult<Option<Arc<VersionRecord>>> {
        Ok(self
            .chain(key)
            .and_then(|chain| chain.versions.read().last().cloned()))
    }

    async fn history(
        &self,
        key: &ResourceKey,
        params: &HistoryParams,
    ) -> StorageResult<Vec<Arc<VersionRecord>>> {
        let Some(chain) = self.chain(key) else {
            return Ok(Vec::new());
        };

        let versions = chain.versions.read();
        Ok(versions
            .iter()
            .rev()
            .filter(|record| params.includes(record))
            .take(params.count.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn at(
        &self,
        key: &ResourceKey,
        version_id: u64,
    ) -> StorageResult<Option<Arc<VersionRecord>>> {
        let Some(chain) = self.chain(key) else {
            return Ok(None);
        };

        // Versions are dense from 1, so the version number is the index + 1.
        let index = match usize::try_from(version_id) {
            Ok(v) if v >= 1 => v - 1,
            _ => return Ok(None),
        };
        Ok(chain.versions.read().get(index).cloned())
    }

    async fn resource_count(&self) -> StorageResult<u64> {
        Ok(self.chains.read().len() as u64)
    }
}
