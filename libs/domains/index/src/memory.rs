use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{IndexError, IndexResult};
use crate::models::{IndexDescriptor, IndexInfo, IndexStatus, VectorRecord};
use crate::store::{IndexHandle, IndexStore};

/// In-memory implementation of the store capability.
///
/// Indexes become ready immediately and records live in a map keyed by id,
/// so writes carry real upsert semantics. Used by tests and local
/// development; cloning shares the underlying state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    indexes: Arc<RwLock<HashMap<String, StoredIndex>>>,
}

#[derive(Clone)]
struct StoredIndex {
    descriptor: IndexDescriptor,
    records: Arc<RwLock<HashMap<String, VectorRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything stored in one index, for assertions and
    /// local inspection
    pub async fn stored(&self, index: &str) -> Vec<VectorRecord> {
        let indexes = self.indexes.read().await;
        match indexes.get(index) {
            Some(stored) => stored.records.read().await.values().cloned().collect(),
            None => Vec::new(),
        }
    }

    pub async fn stored_record(&self, index: &str, id: &str) -> Option<VectorRecord> {
        let indexes = self.indexes.read().await;
        match indexes.get(index) {
            Some(stored) => stored.records.read().await.get(id).cloned(),
            None => None,
        }
    }

    fn info(stored: &StoredIndex) -> IndexInfo {
        IndexInfo {
            name: stored.descriptor.name.clone(),
            dimension: stored.descriptor.dimension,
            metric: stored.descriptor.metric,
            status: IndexStatus::Ready,
            host: None,
        }
    }
}

#[async_trait]
impl IndexStore for InMemoryStore {
    async fn list_indexes(&self) -> IndexResult<Vec<IndexInfo>> {
        let indexes = self.indexes.read().await;
        Ok(indexes.values().map(Self::info).collect())
    }

    async fn create_index(&self, descriptor: &IndexDescriptor) -> IndexResult<()> {
        let mut indexes = self.indexes.write().await;
        if indexes.contains_key(&descriptor.name) {
            return Err(IndexError::Config(format!(
                "Index '{}' already exists",
                descriptor.name
            )));
        }
        indexes.insert(
            descriptor.name.clone(),
            StoredIndex {
                descriptor: descriptor.clone(),
                records: Arc::new(RwLock::new(HashMap::new())),
            },
        );
        Ok(())
    }

    async fn describe_index(&self, name: &str) -> IndexResult<Option<IndexInfo>> {
        let indexes = self.indexes.read().await;
        Ok(indexes.get(name).map(Self::info))
    }

    async fn open_index(&self, name: &str) -> IndexResult<Arc<dyn IndexHandle>> {
        let indexes = self.indexes.read().await;
        let stored = indexes.get(name).ok_or_else(|| {
            IndexError::Config(format!("Index '{}' does not exist", name))
        })?;

        Ok(Arc::new(InMemoryIndexHandle {
            dimension: stored.descriptor.dimension,
            records: stored.records.clone(),
        }))
    }
}

/// Handle over one in-memory index
pub struct InMemoryIndexHandle {
    dimension: u32,
    records: Arc<RwLock<HashMap<String, VectorRecord>>>,
}

#[async_trait]
impl IndexHandle for InMemoryIndexHandle {
    async fn upsert(&self, records: Vec<VectorRecord>) -> IndexResult<()> {
        // Mirror the remote store's own shape check
        for record in &records {
            if record.values.len() != self.dimension as usize {
                return Err(IndexError::Validation(format!(
                    "Record '{}' has {} values, index expects {}",
                    record.id,
                    record.values.len(),
                    self.dimension
                )));
            }
        }

        let mut stored = self.records.write().await;
        for record in records {
            stored.insert(record.id.clone(), record);
        }
        Ok(())
    }
}
