use crate::{ledger::LedgerClient, BatchError, BatchResult};
use tracing::debug;

/// Fetch the account's current sequence and return the next usable value
///
/// A negative sequence from the service is an error, never clamped.
pub async fn next_sequence<C>(client: &C, account: &str) -> BatchResult<u64>
where
    C: LedgerClient + ?Sized,
{
    let reported = client
        .sequence_for_account(account)
        .await
        .map_err(|source| BatchError::SequenceFetch {
            account: account.to_string(),
            source,
        })?;

    let current = u64::try_from(reported).map_err(|_| BatchError::NegativeSequence {
        account: account.to_string(),
        reported,
    })?;

    debug!(account, current, "fetched account sequence");
    Ok(current + 1)
}
