use thiserror::Error;

pub type KeyResult<T> = Result<T, KeyError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid account id: {0}")]
    InvalidAccountId(String),

    // The offending string is a secret and is never echoed.
    #[error("invalid secret seed")]
    InvalidSecret,
}
