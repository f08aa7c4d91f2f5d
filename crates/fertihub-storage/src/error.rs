#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object storage is not configured: missing {0}")]
    NotConfigured(&'static str),

    #[error("invalid storage endpoint {0:?}")]
    InvalidEndpoint(String),

    #[error("invalid object key {0:?}")]
    InvalidKey(String),

    #[error("request signing failed: {0}")]
    Signing(String),

    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage {operation} failed (status {status})")]
    Status { operation: &'static str, status: u16 },
}

pub type Result<T> = std::result::Result<T, StorageError>;
