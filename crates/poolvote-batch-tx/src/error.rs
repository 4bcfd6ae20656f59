use crate::types::TransactionResultCodes;
use thiserror::Error;

pub type BatchResult<T> = Result<T, BatchError>;

/// HTTP status the ledger service reports when it gave up waiting on consensus
pub const GATEWAY_TIMEOUT: u16 = 504;

/// Structured rejection returned by the ledger service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRejection {
    pub status: u16,
    pub problem_type: String,
    pub title: String,
    pub detail: Option<String>,
    pub result_xdr: Option<String>,
    pub result_codes: Option<TransactionResultCodes>,
}

impl LedgerRejection {
    /// A rejection with only a status and problem type, as a gateway would produce
    pub fn new(status: u16, problem_type: impl Into<String>) -> Self {
        Self {
            status,
            problem_type: problem_type.into(),
            title: String::new(),
            detail: None,
            result_xdr: None,
            result_codes: None,
        }
    }

    pub fn with_result_codes(mut self, codes: TransactionResultCodes) -> Self {
        self.result_codes = Some(codes);
        self
    }

    pub fn is_timeout(&self) -> bool {
        self.status == GATEWAY_TIMEOUT
    }
}

/// Errors produced at the ledger client boundary
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("ledger rejected the request: status {} ({})", .0.status, .0.problem_type)]
    Rejected(Box<LedgerRejection>),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to decode ledger response: {0}")]
    Decode(String),
}

impl LedgerError {
    pub fn rejected(rejection: LedgerRejection) -> Self {
        LedgerError::Rejected(Box::new(rejection))
    }

    /// The structured rejection, if the service produced one
    pub fn rejection(&self) -> Option<&LedgerRejection> {
        match self {
            LedgerError::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }

    pub fn result_codes(&self) -> Option<&TransactionResultCodes> {
        self.rejection().and_then(|r| r.result_codes.as_ref())
    }

    pub fn is_timeout(&self) -> bool {
        self.rejection().is_some_and(LedgerRejection::is_timeout)
    }
}

/// Errors a transaction builder reports when it cannot produce an envelope
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("no signers to build a transaction for")]
    EmptyBatch,

    #[error("too many operations: {count} (max: {max})")]
    TooManyOperations { count: usize, max: usize },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid secret for {0}")]
    InvalidSecret(String),

    #[error("could not resolve source sequence: {0}")]
    Sequence(String),

    #[error("envelope encoding failed: {0}")]
    Encoding(String),
}

/// Terminal failures of a batch or of the whole run
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("transaction build failed: {0}")]
    Build(#[from] BuildError),

    #[error("submission rejected: {0}")]
    FatalService(#[source] LedgerError),

    #[error("every operation failed: {}", .codes.operations.join(", "))]
    AllOperationsFailed { codes: TransactionResultCodes },

    #[error("ledger reported {found} operation codes for {expected} operations")]
    ResultCodeMismatch { expected: usize, found: usize },

    #[error("partial failure reported but no operation was dropped ({remaining} remaining)")]
    NoProgress { remaining: usize },

    #[error("failed to fetch sequence for {account}: {source}")]
    SequenceFetch {
        account: String,
        #[source]
        source: LedgerError,
    },

    #[error("ledger reported negative sequence {reported} for {account}")]
    NegativeSequence { account: String, reported: i64 },

    #[error("dispatcher is closed")]
    DispatcherClosed,
}

impl BatchError {
    /// Whether this error stops a chain of batches that share one source account
    pub fn halts_sequential_chain(&self) -> bool {
        matches!(
            self,
            BatchError::SequenceFetch { .. } | BatchError::NegativeSequence { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_detection() {
        let timeout = LedgerError::rejected(LedgerRejection::new(504, "timeout"));
        assert!(timeout.is_timeout());

        let bad_request = LedgerError::rejected(LedgerRejection::new(400, "transaction_failed"));
        assert!(!bad_request.is_timeout());

        let transport = LedgerError::Transport("connection reset".to_string());
        assert!(!transport.is_timeout());
        assert!(transport.rejection().is_none());
    }

    #[test]
    fn test_result_codes_accessor() {
        let codes = TransactionResultCodes::new("tx_failed", ["op_success"]);
        let err = LedgerError::rejected(
            LedgerRejection::new(400, "transaction_failed").with_result_codes(codes.clone()),
        );
        assert_eq!(err.result_codes(), Some(&codes));
    }

    #[test]
    fn test_halts_sequential_chain() {
        let fetch = BatchError::SequenceFetch {
            account: "GABC".to_string(),
            source: LedgerError::Transport("down".to_string()),
        };
        assert!(fetch.halts_sequential_chain());
        assert!(!BatchError::Build(BuildError::EmptyBatch).halts_sequential_chain());
    }
}
