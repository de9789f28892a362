use crate::error::{IndexError, IndexResult};

/// Pinecone connection configuration
#[derive(Debug, Clone)]
pub struct PineconeConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl PineconeConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: "https://api.pinecone.io".to_string(),
            timeout_secs: 30,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn from_env() -> IndexResult<Self> {
        let api_key = std::env::var("PINECONE_API_KEY")
            .map_err(|_| IndexError::Config("PINECONE_API_KEY not set".to_string()))?;

        let base_url = std::env::var("PINECONE_BASE_URL")
            .unwrap_or_else(|_| "https://api.pinecone.io".to_string());

        let timeout_secs = std::env::var("PINECONE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            api_key,
            base_url,
            timeout_secs,
        })
    }
}
