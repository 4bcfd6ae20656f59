use crate::error::CliResult;
use poolvote_batch_tx::{
    partition, run_parallel, BatchSubmitter, LedgerClient, SequencePolicy, Signer,
    TransactionBuilder, TxBatchConfig,
};
use std::sync::Arc;
use tracing::info;

/// Point every signer's inflation destination at the pool, `signers_per_tx`
/// signers per transaction, batches running in parallel
///
/// The builder picks the source and its sequence itself, since the source is
/// whichever signer is first in the batch at build time.
pub async fn execute<C, B>(
    client: Arc<C>,
    builder: Arc<B>,
    signers: Vec<Signer>,
    config: &TxBatchConfig,
) -> CliResult<Vec<Signer>>
where
    C: LedgerClient + ?Sized + 'static,
    B: TransactionBuilder + ?Sized + 'static,
{
    let chunks = partition(&signers, config.signers_per_tx)?;
    info!(
        signers = signers.len(),
        batches = chunks.len(),
        "Setting inflation destination"
    );

    let submitter = BatchSubmitter::new(client, builder, config.timeout_backoff);
    let report = run_parallel(
        &submitter,
        chunks,
        config.max_parallel_jobs,
        SequencePolicy::BuilderManaged,
    )
    .await?;

    let voters = report.survivors();
    info!(
        voters = voters.len(),
        aborted_batches = report.aborted(),
        "Inflation destination set"
    );
    Ok(voters)
}
