use thiserror::Error;

#[derive(Debug, Error)]
pub enum SentinelError {
    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("watch error: {0}")]
    Watch(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SentinelResult<T> = Result<T, SentinelError>;
