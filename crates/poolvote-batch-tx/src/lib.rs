/*!
# Poolvote Batch Transaction Engine

Packs signers into multi-operation transactions and keeps going when a
transaction is rejected because some of its operations failed. The ledger
applies a transaction all-or-nothing, so a single bad operation aborts the
rest; the submitter rebuilds the batch without the failing operations and
submits it with the next sequence number.

## Components

- [`partition`]: fixed-size chunks that respect the per-transaction operation ceiling
- [`next_sequence`]: the next usable sequence of an account
- [`interpret`]: which operations of a `tx_failed` rejection would have applied
- [`BatchSubmitter`]: the build → submit → retry state machine
- [`BoundedDispatcher`]: a fixed-width job pool with a join barrier
- [`run_sequential`] / [`run_parallel`]: the two submission regimes

Ledger access and envelope encoding are supplied by the caller through
[`LedgerClient`] and [`TransactionBuilder`].

## Usage

```rust,no_run
use poolvote_batch_tx::{
    partition, run_sequential, BatchSubmitter, LedgerClient, Signer, TransactionBuilder,
    TxBatchConfig,
};
use std::sync::Arc;

async fn fund<C, B>(client: Arc<C>, builder: Arc<B>, funder: &str, signers: Vec<Signer>)
where
    C: LedgerClient + 'static,
    B: TransactionBuilder + 'static,
{
    let config = TxBatchConfig::default();
    let submitter = BatchSubmitter::new(client, builder, config.timeout_backoff);

    let chunks = partition(&signers, config.ops_per_tx).expect("non-zero chunk size");
    let report = run_sequential(&submitter, funder, chunks).await;
    println!("{} signers funded", report.survivors().len());
}
```
*/

mod config;
mod dispatcher;
mod error;
mod ledger;
mod partition;
mod regimes;
mod result_codes;
mod sequence;
mod submitter;
mod types;

pub use config::{
    TxBatchConfig, DEFAULT_MAX_PARALLEL_JOBS, DEFAULT_TIMEOUT_BACKOFF, OPS_PER_TX_MAX,
    SIGNERS_PER_TX_MAX,
};
pub use dispatcher::BoundedDispatcher;
pub use error::{
    BatchError, BatchResult, BuildError, LedgerError, LedgerRejection, GATEWAY_TIMEOUT,
};
pub use ledger::{LedgerClient, TransactionBuilder};
pub use partition::{chunk_count, partition};
pub use regimes::{run_parallel, run_sequential, ParallelReport, SequencePolicy, SequentialReport};
pub use result_codes::{interpret, retain_survivors, Interpretation, OP_SUCCESS, TX_FAILED};
pub use sequence::next_sequence;
pub use submitter::{BatchOutcome, BatchStatus, BatchSubmitter};
pub use types::{Envelope, Receipt, Signer, TransactionResultCodes};

// Collaborator implementations need the same macro the traits are declared with
pub use async_trait::async_trait;
