use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{IndexError, IndexResult};
use crate::models::{IndexDescriptor, IndexStatus};
use crate::store::{IndexHandle, IndexStore};

/// Tuning for the post-create readiness wait
#[derive(Debug, Clone)]
pub struct ConnectSettings {
    /// Upper bound on how long a freshly created index may take to become ready
    pub ready_timeout: Duration,
    /// How often to re-check readiness while waiting
    pub poll_interval: Duration,
}

impl Default for ConnectSettings {
    fn default() -> Self {
        Self {
            ready_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Memoizing connection manager for one index.
///
/// Owns the store capability and a single lazily established data-plane
/// handle. The first `connect` call ensures the index exists (creating and
/// waiting for it if needed); every later call returns the same handle.
/// Concurrent callers share one in-flight attempt, so the index is never
/// created twice.
pub struct ConnectionManager<S: IndexStore> {
    store: S,
    descriptor: IndexDescriptor,
    settings: ConnectSettings,
    handle: OnceCell<Arc<dyn IndexHandle>>,
}

impl<S: IndexStore> ConnectionManager<S> {
    /// Bind a store capability to an index descriptor.
    ///
    /// Fails fast with a configuration error when the descriptor itself is
    /// unusable, before any remote call.
    pub fn new(store: S, descriptor: IndexDescriptor) -> IndexResult<Self> {
        descriptor.validate()?;
        Ok(Self {
            store,
            descriptor,
            settings: ConnectSettings::default(),
            handle: OnceCell::new(),
        })
    }

    pub fn with_settings(mut self, settings: ConnectSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn descriptor(&self) -> &IndexDescriptor {
        &self.descriptor
    }

    /// Return the memoized handle, establishing it on first use.
    ///
    /// A failed attempt leaves nothing memoized; the next caller starts a
    /// fresh one.
    pub async fn connect(&self) -> IndexResult<Arc<dyn IndexHandle>> {
        self.handle
            .get_or_try_init(|| self.establish())
            .await
            .cloned()
    }

    async fn establish(&self) -> IndexResult<Arc<dyn IndexHandle>> {
        let name = &self.descriptor.name;

        let existing = self.store.list_indexes().await?;
        if existing.iter().any(|info| info.name == *name) {
            debug!(index = %name, "Index already exists");
        } else {
            info!(
                index = %name,
                dimension = self.descriptor.dimension,
                metric = %self.descriptor.metric,
                "Creating index"
            );
            self.store.create_index(&self.descriptor).await?;
            self.await_ready().await?;
        }

        let handle = self.store.open_index(name).await?;
        info!(index = %name, "Connected");
        Ok(handle)
    }

    /// Poll the store until the index reports ready, bounded by the
    /// configured timeout. A slow-but-successful creation inside the window
    /// is not an error; running out of the window is.
    async fn await_ready(&self) -> IndexResult<()> {
        let name = &self.descriptor.name;
        let deadline = tokio::time::Instant::now() + self.settings.ready_timeout;

        loop {
            match self.store.describe_index(name).await? {
                Some(info) if info.status.is_ready() => {
                    debug!(index = %name, "Index ready");
                    return Ok(());
                }
                Some(info) if info.status == IndexStatus::Failed => {
                    return Err(IndexError::Config(format!(
                        "Index '{}' failed to initialize",
                        name
                    )));
                }
                _ => {
                    debug!(index = %name, "Index not ready yet");
                }
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(IndexError::ReadyTimeout {
                    name: name.clone(),
                    waited_secs: self.settings.ready_timeout.as_secs(),
                });
            }

            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DistanceMetric, IndexInfo};
    use crate::store::{MockIndexHandle, MockIndexStore};

    fn descriptor() -> IndexDescriptor {
        IndexDescriptor::new("gmail-emails", 1536).with_metric(DistanceMetric::Cosine)
    }

    fn info(status: IndexStatus) -> IndexInfo {
        IndexInfo {
            name: "gmail-emails".to_string(),
            dimension: 1536,
            metric: DistanceMetric::Cosine,
            status,
            host: Some("gmail-emails.example.test".to_string()),
        }
    }

    fn stub_handle() -> Arc<dyn IndexHandle> {
        Arc::new(MockIndexHandle::new())
    }

    #[tokio::test]
    async fn test_connect_creates_missing_index_and_waits_for_ready() {
        let mut store = MockIndexStore::new();
        store.expect_list_indexes().times(1).returning(|| Ok(vec![]));
        store
            .expect_create_index()
            .withf(|d| d.name == "gmail-emails" && d.dimension == 1536)
            .times(1)
            .returning(|_| Ok(()));
        store
            .expect_describe_index()
            .times(1)
            .returning(|_| Ok(Some(info(IndexStatus::Ready))));
        let handle = stub_handle();
        store
            .expect_open_index()
            .times(1)
            .returning(move |_| Ok(handle.clone()));

        let manager = ConnectionManager::new(store, descriptor()).unwrap();
        assert!(manager.connect().await.is_ok());
    }

    #[tokio::test]
    async fn test_connect_skips_create_when_index_exists() {
        let mut store = MockIndexStore::new();
        store
            .expect_list_indexes()
            .times(1)
            .returning(|| Ok(vec![info(IndexStatus::Ready)]));
        store.expect_create_index().never();
        let handle = stub_handle();
        store
            .expect_open_index()
            .times(1)
            .returning(move |_| Ok(handle.clone()));

        let manager = ConnectionManager::new(store, descriptor()).unwrap();
        assert!(manager.connect().await.is_ok());
    }

    #[tokio::test]
    async fn test_second_connect_reuses_handle_with_no_store_calls() {
        let mut store = MockIndexStore::new();
        store
            .expect_list_indexes()
            .times(1)
            .returning(|| Ok(vec![info(IndexStatus::Ready)]));
        let handle = stub_handle();
        store
            .expect_open_index()
            .times(1)
            .returning(move |_| Ok(handle.clone()));

        let manager = ConnectionManager::new(store, descriptor()).unwrap();
        let first = manager.connect().await.unwrap();
        let second = manager.connect().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_concurrent_connects_share_one_attempt() {
        let mut store = MockIndexStore::new();
        store.expect_list_indexes().times(1).returning(|| Ok(vec![]));
        store.expect_create_index().times(1).returning(|_| Ok(()));
        store
            .expect_describe_index()
            .times(1)
            .returning(|_| Ok(Some(info(IndexStatus::Ready))));
        let handle = stub_handle();
        store
            .expect_open_index()
            .times(1)
            .returning(move |_| Ok(handle.clone()));

        let manager = Arc::new(ConnectionManager::new(store, descriptor()).unwrap());
        let (first, second) = tokio::join!(manager.connect(), manager.connect());

        assert!(Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_polls_until_ready() {
        let mut store = MockIndexStore::new();
        store.expect_list_indexes().times(1).returning(|| Ok(vec![]));
        store.expect_create_index().times(1).returning(|_| Ok(()));

        let mut seq = mockall::Sequence::new();
        store
            .expect_describe_index()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(info(IndexStatus::Initializing))));
        store
            .expect_describe_index()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(info(IndexStatus::Ready))));
        let handle = stub_handle();
        store
            .expect_open_index()
            .times(1)
            .returning(move |_| Ok(handle.clone()));

        let manager = ConnectionManager::new(store, descriptor()).unwrap();
        assert!(manager.connect().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_times_out_when_index_never_ready() {
        let mut store = MockIndexStore::new();
        store.expect_list_indexes().times(1).returning(|| Ok(vec![]));
        store.expect_create_index().times(1).returning(|_| Ok(()));
        store
            .expect_describe_index()
            .returning(|_| Ok(Some(info(IndexStatus::Initializing))));
        store.expect_open_index().never();

        let manager = ConnectionManager::new(store, descriptor())
            .unwrap()
            .with_settings(ConnectSettings {
                ready_timeout: Duration::from_secs(5),
                poll_interval: Duration::from_secs(1),
            });

        match manager.connect().await {
            Err(IndexError::ReadyTimeout { name, waited_secs }) => {
                assert_eq!(name, "gmail-emails");
                assert_eq!(waited_secs, 5);
            }
            other => panic!("Expected ReadyTimeout, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_failed_initialization_is_a_config_error() {
        let mut store = MockIndexStore::new();
        store.expect_list_indexes().times(1).returning(|| Ok(vec![]));
        store.expect_create_index().times(1).returning(|_| Ok(()));
        store
            .expect_describe_index()
            .times(1)
            .returning(|_| Ok(Some(info(IndexStatus::Failed))));
        store.expect_open_index().never();

        let manager = ConnectionManager::new(store, descriptor()).unwrap();
        assert!(matches!(
            manager.connect().await,
            Err(IndexError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_create_failure_surfaces_config_error() {
        let mut store = MockIndexStore::new();
        store.expect_list_indexes().times(1).returning(|| Ok(vec![]));
        store.expect_create_index().times(1).returning(|_| {
            Err(IndexError::Config("Quota exceeded".to_string()))
        });
        store.expect_open_index().never();

        let manager = ConnectionManager::new(store, descriptor()).unwrap();
        assert!(matches!(
            manager.connect().await,
            Err(IndexError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_store_surfaces_transport_error() {
        let mut store = MockIndexStore::new();
        store.expect_list_indexes().times(1).returning(|| {
            Err(IndexError::Transport("Connection refused".to_string()))
        });

        let manager = ConnectionManager::new(store, descriptor()).unwrap();
        assert!(matches!(
            manager.connect().await,
            Err(IndexError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_attempt_is_not_memoized() {
        let mut store = MockIndexStore::new();
        let mut seq = mockall::Sequence::new();
        store
            .expect_list_indexes()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(IndexError::Transport("Connection refused".to_string())));
        store
            .expect_list_indexes()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![info(IndexStatus::Ready)]));
        let handle = stub_handle();
        store
            .expect_open_index()
            .times(1)
            .returning(move |_| Ok(handle.clone()));

        let manager = ConnectionManager::new(store, descriptor()).unwrap();
        assert!(manager.connect().await.is_err());
        assert!(manager.connect().await.is_ok());
    }

    #[test]
    fn test_invalid_descriptor_rejected_before_any_remote_call() {
        let store = MockIndexStore::new();
        let result = ConnectionManager::new(store, IndexDescriptor::new("emails", 0));
        assert!(matches!(result, Err(IndexError::Config(_))));
    }
}
