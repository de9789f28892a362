use std::sync::Arc;

use async_trait::async_trait;

use crate::error::IndexResult;
use crate::models::{IndexDescriptor, IndexInfo, VectorRecord};

/// Capability trait for the remote indexed store.
///
/// This is the minimal operation set the client orchestration depends on;
/// implementations can target any vendor's control plane (or stay in
/// memory for tests).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// List the indexes visible to this credential
    async fn list_indexes(&self) -> IndexResult<Vec<IndexInfo>>;

    /// Ask the store to provision a new index
    async fn create_index(&self, descriptor: &IndexDescriptor) -> IndexResult<()>;

    /// Look up a single index, `None` if the store does not know it
    async fn describe_index(&self, name: &str) -> IndexResult<Option<IndexInfo>>;

    /// Open a data-plane handle bound to one index
    async fn open_index(&self, name: &str) -> IndexResult<Arc<dyn IndexHandle>>;
}

/// Data-plane capability bound to a single index.
///
/// Handles are shared read-only; nothing mutates them after `open_index`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IndexHandle: Send + Sync {
    /// Write one batch of records; insert-if-new, overwrite-if-existing by id
    async fn upsert(&self, records: Vec<VectorRecord>) -> IndexResult<()>;
}
