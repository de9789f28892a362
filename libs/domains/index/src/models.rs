use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, IndexResult};

/// Distance metric used by an index for similarity calculations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
    DotProduct,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::DotProduct => "dotproduct",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "euclidean" => Ok(DistanceMetric::Euclidean),
            "dotproduct" | "dot" => Ok(DistanceMetric::DotProduct),
            other => Err(IndexError::Config(format!(
                "Unknown distance metric: '{}'",
                other
            ))),
        }
    }
}

/// Serverless placement of an index (cloud provider + region)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub cloud: String,
    pub region: String,
}

impl Placement {
    pub fn new(cloud: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            cloud: cloud.into(),
            region: region.into(),
        }
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
        }
    }
}

/// Full description of an index: name, dimension, metric, and placement.
///
/// Created once and immutable thereafter. On connect, existence is checked
/// against the remote store; the descriptor is never re-asserted against an
/// index that already exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub dimension: u32,
    pub metric: DistanceMetric,
    pub placement: Placement,
}

impl IndexDescriptor {
    pub fn new(name: impl Into<String>, dimension: u32) -> Self {
        Self {
            name: name.into(),
            dimension,
            metric: DistanceMetric::default(),
            placement: Placement::default(),
        }
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Check the descriptor is usable before any remote call is made
    pub fn validate(&self) -> IndexResult<()> {
        if self.name.trim().is_empty() {
            return Err(IndexError::Config("Index name must not be empty".to_string()));
        }
        if self.dimension == 0 {
            return Err(IndexError::Config(format!(
                "Index '{}' must have a dimension greater than zero",
                self.name
            )));
        }
        Ok(())
    }
}

/// Scalar metadata value attached to a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    Number(f64),
    Flag(bool),
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Number(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Flag(value)
    }
}

/// A vector record keyed by id.
///
/// A later record with the same id overwrites the stored one (upsert
/// semantics). Records are immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, MetadataValue>,
}

impl VectorRecord {
    pub fn new(id: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            values,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Readiness of a remote index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexStatus {
    Ready,
    Initializing,
    Failed,
}

impl IndexStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, IndexStatus::Ready)
    }
}

/// Remote-side view of an index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub dimension: u32,
    pub metric: DistanceMetric,
    pub status: IndexStatus,
    /// Data-plane endpoint, present once the index is provisioned
    pub host: Option<String>,
}

/// A chunk that the store rejected server-side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedChunk {
    /// Zero-based position of the chunk in the write sequence
    pub index: usize,
    /// Number of records the chunk carried
    pub records: usize,
    pub reason: String,
}

/// A record rejected client-side, before any network call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub id: String,
    pub reason: String,
}

/// Aggregated outcome of a bulk upsert.
///
/// Partial failure is data, not an error: a failed chunk shows up here and
/// the call still returns `Ok`, so the caller can retry just the failed
/// subset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpsertReport {
    pub total_accepted: usize,
    pub total_failed: usize,
    pub failed_chunks: Vec<FailedChunk>,
    pub rejected_before_send: Vec<RejectedRecord>,
}

impl UpsertReport {
    pub fn failed_chunk_indices(&self) -> Vec<usize> {
        self.failed_chunks.iter().map(|c| c.index).collect()
    }

    /// True when every input record was accepted by the store
    pub fn is_complete(&self) -> bool {
        self.total_failed == 0 && self.rejected_before_send.is_empty()
    }
}
