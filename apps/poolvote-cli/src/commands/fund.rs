/*!
# Account Funding

Two ways to bring generated accounts into existence:

- **Friendbot**: one faucet request per account, run through a
  [`BoundedDispatcher`]. Any 2xx answer counts as funded.
- **Direct**: `CreateAccount` operations from the funder's balance, submitted
  in the sequential regime because every batch spends the funder's sequence.
*/

use crate::error::{CliError, CliResult};
use poolvote_batch_tx::{
    partition, run_sequential, BatchSubmitter, BoundedDispatcher, LedgerClient, Signer,
    TransactionBuilder, TxBatchConfig,
};
use std::{future::Future, sync::Arc};
use tracing::{error, info};

/// Ask a faucet to fund every signer, at most `max_parallel` requests at once
///
/// Returns the funded signers in their original order.
pub async fn with_faucet<F, Fut>(
    signers: Vec<Signer>,
    max_parallel: usize,
    fund_one: F,
) -> CliResult<Vec<Signer>>
where
    F: Fn(Signer) -> Fut,
    Fut: Future<Output = bool> + Send + 'static,
{
    let mut dispatcher = BoundedDispatcher::new(max_parallel);

    for (index, signer) in signers.into_iter().enumerate() {
        info!(index, account = %signer.address(), "Asking friendbot to fund account");
        let request = fund_one(signer.clone());
        dispatcher
            .dispatch(async move { (index, request.await.then_some(signer)) })
            .await?;
    }

    let mut results = dispatcher.join_all().await;
    results.sort_by_key(|(index, _)| *index);
    let funded: Vec<Signer> = results.into_iter().filter_map(|(_, s)| s).collect();

    info!(funded = funded.len(), "Friendbot funding finished");
    Ok(funded)
}

/// Fund every signer from `funder_address`, `ops_per_tx` accounts per transaction
///
/// A failed funder sequence lookup stops the chain and is returned as an
/// error after logging how far the run got.
pub async fn directly<C, B>(
    client: Arc<C>,
    builder: Arc<B>,
    funder_address: &str,
    signers: Vec<Signer>,
    config: &TxBatchConfig,
) -> CliResult<Vec<Signer>>
where
    C: LedgerClient + ?Sized,
    B: TransactionBuilder + ?Sized,
{
    let chunks = partition(&signers, config.ops_per_tx)?;
    let submitter = BatchSubmitter::new(client, builder, config.timeout_backoff);

    let report = run_sequential(&submitter, funder_address, chunks).await;
    let funded = report.survivors();
    info!(
        funded = funded.len(),
        requested = signers.len(),
        "Direct funding finished"
    );

    if let Some(err) = report.halted {
        error!(funded = funded.len(), "Funding halted: {}", err);
        return Err(CliError::Batch(err));
    }
    Ok(funded)
}
