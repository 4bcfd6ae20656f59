use thiserror::Error;

pub type KeystoreResult<T> = Result<T, KeystoreError>;

#[derive(Error, Debug)]
pub enum KeystoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}
