use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Client error: {0}")]
    Client(#[from] poolvote_client::ClientError),

    #[error("Keystore error: {0}")]
    Keystore(#[from] poolvote_keystore::KeystoreError),

    #[error("Transaction building failed: {0}")]
    Build(#[from] poolvote_batch_tx::BuildError),

    #[error("Batch submission failed: {0}")]
    Batch(#[from] poolvote_batch_tx::BatchError),

    #[error("Interrupted")]
    Interrupted,
}
