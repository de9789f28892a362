//! Indexed Store Client
//!
//! Client-side orchestration for a remote indexed vector store: idempotent
//! index initialization with connection memoization, and order-preserving
//! batch upserts with structured partial-failure reporting.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  BatchUpserter   │  ← validation, chunking, report aggregation
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │ ConnectionManager│  ← memoized connect, ensure-index, readiness wait
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │   IndexStore     │
//! │    (trait)       │
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │  PineconeStore   │
//! │  InMemoryStore   │
//! └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use domain_index::{
//!     BatchUpserter, ConnectionManager, DistanceMetric, IndexDescriptor,
//!     PineconeStore, VectorRecord,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PineconeStore::from_env()?;
//!
//! let descriptor = IndexDescriptor::new("gmail-emails", 1536)
//!     .with_metric(DistanceMetric::Cosine);
//!
//! let connection = Arc::new(ConnectionManager::new(store, descriptor)?);
//! let upserter = BatchUpserter::new(connection);
//!
//! let records = vec![
//!     VectorRecord::new("email-1", vec![0.1; 1536])
//!         .with_metadata("subject", "Meeting notes"),
//! ];
//!
//! let report = upserter.upsert(records).await?;
//! assert!(report.is_complete());
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod memory;
pub mod models;
pub mod pinecone;
pub mod store;
pub mod upsert;

// Re-export commonly used types
pub use connection::{ConnectSettings, ConnectionManager};
pub use error::{IndexError, IndexResult};
pub use memory::InMemoryStore;
pub use models::{
    DistanceMetric, FailedChunk, IndexDescriptor, IndexInfo, IndexStatus, MetadataValue,
    Placement, RejectedRecord, UpsertReport, VectorRecord,
};
pub use pinecone::{PineconeConfig, PineconeStore};
pub use store::{IndexHandle, IndexStore};
pub use upsert::{BatchUpserter, DEFAULT_CHUNK_SIZE};
