use crate::{BatchError, BatchResult};
use std::time::Duration;

/// Hard ceiling on operations per transaction imposed by the ledger
pub const OPS_PER_TX_MAX: usize = 100;

/// Hard ceiling on distinct signatures per transaction
pub const SIGNERS_PER_TX_MAX: usize = 20;

/// Default number of submission jobs allowed in flight at once
pub const DEFAULT_MAX_PARALLEL_JOBS: usize = 25;

/// Default wait before resubmitting an envelope after a gateway timeout
pub const DEFAULT_TIMEOUT_BACKOFF: Duration = Duration::from_secs(5);

/// Configuration for batch submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxBatchConfig {
    /// Maximum number of operations packed into a transaction with a single source
    pub ops_per_tx: usize,

    /// Maximum number of signers per transaction when every operation carries its own signature
    pub signers_per_tx: usize,

    /// Maximum number of submission jobs running at once in the parallel regime
    pub max_parallel_jobs: usize,

    /// Fixed wait between resubmissions of a timed-out envelope
    pub timeout_backoff: Duration,
}

impl Default for TxBatchConfig {
    fn default() -> Self {
        Self {
            ops_per_tx: OPS_PER_TX_MAX,
            signers_per_tx: SIGNERS_PER_TX_MAX,
            max_parallel_jobs: DEFAULT_MAX_PARALLEL_JOBS,
            timeout_backoff: DEFAULT_TIMEOUT_BACKOFF,
        }
    }
}

impl TxBatchConfig {
    /// Check every limit against the ledger ceilings
    pub fn validate(&self) -> BatchResult<()> {
        if self.ops_per_tx == 0 || self.ops_per_tx > OPS_PER_TX_MAX {
            return Err(BatchError::Validation(format!(
                "ops_per_tx must be within 1..={}, got {}",
                OPS_PER_TX_MAX, self.ops_per_tx
            )));
        }
        if self.signers_per_tx == 0 || self.signers_per_tx > SIGNERS_PER_TX_MAX {
            return Err(BatchError::Validation(format!(
                "signers_per_tx must be within 1..={}, got {}",
                SIGNERS_PER_TX_MAX, self.signers_per_tx
            )));
        }
        if self.max_parallel_jobs == 0 {
            return Err(BatchError::Validation(
                "max_parallel_jobs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Clamp a requested operations-per-transaction value into the accepted range
    pub fn clamp_ops_per_tx(requested: i64) -> usize {
        requested.clamp(1, OPS_PER_TX_MAX as i64) as usize
    }
}
