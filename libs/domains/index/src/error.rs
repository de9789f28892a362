use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid record: {0}")]
    Validation(String),

    #[error("Index '{name}' not ready after {waited_secs}s")]
    ReadyTimeout { name: String, waited_secs: u64 },
}

pub type IndexResult<T> = Result<T, IndexError>;

impl From<reqwest::Error> for IndexError {
    fn from(err: reqwest::Error) -> Self {
        IndexError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(err: serde_json::Error) -> Self {
        IndexError::Transport(format!("Malformed store payload: {}", err))
    }
}
