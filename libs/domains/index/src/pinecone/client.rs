use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::PineconeConfig;
use crate::error::{IndexError, IndexResult};
use crate::models::{DistanceMetric, IndexDescriptor, IndexInfo, IndexStatus, VectorRecord};
use crate::store::{IndexHandle, IndexStore};

/// Pinecone-backed implementation of `IndexStore`.
///
/// Talks to the serverless control plane (`/indexes`) for index lifecycle
/// and hands out data-plane handles bound to an index host.
pub struct PineconeStore {
    client: Client,
    config: PineconeConfig,
}

impl PineconeStore {
    pub fn new(config: PineconeConfig) -> IndexResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IndexError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> IndexResult<Self> {
        Self::new(PineconeConfig::from_env()?)
    }

    fn indexes_url(&self) -> String {
        format!("{}/indexes", self.config.base_url)
    }
}

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: u32,
    metric: DistanceMetric,
    spec: IndexSpec<'a>,
}

#[derive(Debug, Serialize)]
struct IndexSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Debug, Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Debug, Deserialize)]
struct IndexListModel {
    #[serde(default)]
    indexes: Vec<IndexModel>,
}

#[derive(Debug, Deserialize)]
struct IndexModel {
    name: String,
    dimension: u32,
    metric: DistanceMetric,
    #[serde(default)]
    host: Option<String>,
    status: IndexStatusModel,
}

#[derive(Debug, Deserialize)]
struct IndexStatusModel {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    state: String,
}

impl IndexModel {
    fn into_info(self) -> IndexInfo {
        let status = if self.status.ready || self.status.state == "Ready" {
            IndexStatus::Ready
        } else if self.status.state == "InitializationFailed" {
            IndexStatus::Failed
        } else {
            IndexStatus::Initializing
        };

        IndexInfo {
            name: self.name,
            dimension: self.dimension,
            metric: self.metric,
            status,
            host: self.host,
        }
    }
}

/// Map a non-success control-plane response onto the error taxonomy:
/// the store rejecting the request is a configuration problem, the store
/// misbehaving is a transport problem.
fn classify_status(status: StatusCode, body: &str, context: &str) -> IndexError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            IndexError::Config(format!("{}: credential rejected ({})", context, status))
        }
        s if s.is_client_error() => {
            IndexError::Config(format!("{} rejected ({}): {}", context, status, body))
        }
        s => IndexError::Transport(format!("{} failed ({}): {}", context, s, body)),
    }
}

#[async_trait]
impl IndexStore for PineconeStore {
    async fn list_indexes(&self) -> IndexResult<Vec<IndexInfo>> {
        let response = self
            .client
            .get(self.indexes_url())
            .header("Api-Key", &self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body, "List indexes"));
        }

        let list: IndexListModel = serde_json::from_str(&response.text().await?)?;
        Ok(list.indexes.into_iter().map(IndexModel::into_info).collect())
    }

    async fn create_index(&self, descriptor: &IndexDescriptor) -> IndexResult<()> {
        let request = CreateIndexRequest {
            name: &descriptor.name,
            dimension: descriptor.dimension,
            metric: descriptor.metric,
            spec: IndexSpec {
                serverless: ServerlessSpec {
                    cloud: &descriptor.placement.cloud,
                    region: &descriptor.placement.region,
                },
            },
        };

        let response = self
            .client
            .post(self.indexes_url())
            .header("Api-Key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body, "Create index"));
        }

        Ok(())
    }

    async fn describe_index(&self, name: &str) -> IndexResult<Option<IndexInfo>> {
        let response = self
            .client
            .get(format!("{}/{}", self.indexes_url(), name))
            .header("Api-Key", &self.config.api_key)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body, "Describe index"));
        }

        let model: IndexModel = serde_json::from_str(&response.text().await?)?;
        Ok(Some(model.into_info()))
    }

    async fn open_index(&self, name: &str) -> IndexResult<Arc<dyn IndexHandle>> {
        let info = self.describe_index(name).await?.ok_or_else(|| {
            IndexError::Config(format!("Index '{}' does not exist", name))
        })?;

        let host = info.host.ok_or_else(|| {
            IndexError::Transport(format!("Index '{}' has no data-plane host yet", name))
        })?;

        Ok(Arc::new(PineconeIndexHandle {
            client: self.client.clone(),
            api_key: self.config.api_key.clone(),
            endpoint: format!("https://{}/vectors/upsert", host),
            index: name.to_string(),
        }))
    }
}

/// Data-plane handle bound to one index host
pub struct PineconeIndexHandle {
    client: Client,
    api_key: String,
    endpoint: String,
    index: String,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
}

#[derive(Debug, Deserialize)]
struct UpsertResponse {
    #[serde(rename = "upsertedCount", default)]
    upserted_count: usize,
}

#[async_trait]
impl IndexHandle for PineconeIndexHandle {
    async fn upsert(&self, records: Vec<VectorRecord>) -> IndexResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header("Api-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&UpsertRequest { vectors: &records })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNPROCESSABLE_ENTITY | StatusCode::BAD_REQUEST => {
                    IndexError::Validation(format!("Upsert rejected ({}): {}", status, body))
                }
                s => classify_status(s, &body, "Upsert"),
            });
        }

        let accepted: UpsertResponse = serde_json::from_str(&response.text().await?)?;
        debug!(
            index = %self.index,
            records = accepted.upserted_count,
            "Chunk upserted"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_serializes_documented_shape() {
        let descriptor = IndexDescriptor::new("gmail-emails", 1536);
        let request = CreateIndexRequest {
            name: &descriptor.name,
            dimension: descriptor.dimension,
            metric: descriptor.metric,
            spec: IndexSpec {
                serverless: ServerlessSpec {
                    cloud: &descriptor.placement.cloud,
                    region: &descriptor.placement.region,
                },
            },
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["name"], "gmail-emails");
        assert_eq!(body["dimension"], 1536);
        assert_eq!(body["metric"], "cosine");
        assert_eq!(body["spec"]["serverless"]["cloud"], "aws");
        assert_eq!(body["spec"]["serverless"]["region"], "us-east-1");
    }

    #[test]
    fn test_index_model_maps_ready_status() {
        let model: IndexModel = serde_json::from_str(
            r#"{
                "name": "gmail-emails",
                "dimension": 1536,
                "metric": "cosine",
                "host": "gmail-emails-abc123.svc.pinecone.io",
                "status": {"ready": true, "state": "Ready"}
            }"#,
        )
        .unwrap();

        let info = model.into_info();
        assert_eq!(info.status, IndexStatus::Ready);
        assert_eq!(info.host.as_deref(), Some("gmail-emails-abc123.svc.pinecone.io"));
    }

    #[test]
    fn test_index_model_maps_initializing_status() {
        let model: IndexModel = serde_json::from_str(
            r#"{
                "name": "gmail-emails",
                "dimension": 1536,
                "metric": "euclidean",
                "status": {"ready": false, "state": "Initializing"}
            }"#,
        )
        .unwrap();

        let info = model.into_info();
        assert_eq!(info.status, IndexStatus::Initializing);
        assert_eq!(info.metric, DistanceMetric::Euclidean);
        assert!(info.host.is_none());
    }

    #[test]
    fn test_index_model_maps_failed_status() {
        let model: IndexModel = serde_json::from_str(
            r#"{
                "name": "gmail-emails",
                "dimension": 1536,
                "metric": "cosine",
                "status": {"ready": false, "state": "InitializationFailed"}
            }"#,
        )
        .unwrap();

        assert_eq!(model.into_info().status, IndexStatus::Failed);
    }

    #[test]
    fn test_index_list_tolerates_empty_payload() {
        let list: IndexListModel = serde_json::from_str("{}").unwrap();
        assert!(list.indexes.is_empty());
    }

    #[test]
    fn test_classify_unauthorized_as_config() {
        let err = classify_status(StatusCode::UNAUTHORIZED, "", "List indexes");
        assert!(matches!(err, IndexError::Config(_)));
    }

    #[test]
    fn test_classify_quota_rejection_as_config() {
        let err = classify_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            "quota exceeded",
            "Create index",
        );
        match err {
            IndexError::Config(msg) => assert!(msg.contains("quota exceeded")),
            other => panic!("Expected Config, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_server_error_as_transport() {
        let err = classify_status(StatusCode::BAD_GATEWAY, "", "Upsert");
        assert!(matches!(err, IndexError::Transport(_)));
    }

    #[test]
    fn test_upsert_request_omits_empty_metadata() {
        let records = vec![VectorRecord::new("a", vec![0.1, 0.2])];
        let body = serde_json::to_value(&UpsertRequest { vectors: &records }).unwrap();

        assert_eq!(body["vectors"][0]["id"], "a");
        assert!(body["vectors"][0].get("metadata").is_none());
    }
}
