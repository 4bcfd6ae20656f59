use serde::{Deserialize, Serialize};
use std::fmt;

/// An account address paired with the secret that signs for it
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signer {
    address: String,
    secret: String,
}

impl Signer {
    pub fn new(address: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            secret: secret.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

// Secrets never reach the logs.
impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("address", &self.address)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// A signed, encoded transaction ready for submission
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Envelope(String);

impl Envelope {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Confirmation returned by the ledger for an applied transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub hash: String,
    pub ledger: u64,
    #[serde(default)]
    pub envelope_xdr: Option<String>,
    #[serde(default)]
    pub result_xdr: Option<String>,
}

/// Transaction-level code plus one code per operation, in envelope order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResultCodes {
    pub transaction: String,
    #[serde(default)]
    pub operations: Vec<String>,
}

impl TransactionResultCodes {
    pub fn new<I, S>(transaction: impl Into<String>, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            transaction: transaction.into(),
            operations: operations.into_iter().map(Into::into).collect(),
        }
    }
}
