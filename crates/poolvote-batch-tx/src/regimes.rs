/*!
# Submission Regimes

Two ways of driving many batches:

- **Sequential**: batches share one source account. Each batch fetches the
  source's sequence only after the previous batch resolved, and a failed
  sequence fetch halts the rest of the chain.
- **Parallel**: batches touch independent accounts and run under a
  [`BoundedDispatcher`]. A failure only affects its own job.
*/

use crate::{
    dispatcher::BoundedDispatcher,
    ledger::{LedgerClient, TransactionBuilder},
    sequence::next_sequence,
    submitter::{BatchOutcome, BatchSubmitter},
    types::Signer,
    BatchError, BatchResult,
};
use tracing::{error, info};

/// Where a parallel job gets its starting sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencePolicy {
    /// The batch's first signer is the source; its next sequence is fetched
    /// before building and again whenever a retry drops that signer
    AcquireFromFirstSigner,
    /// The builder resolves the source sequence itself; the job passes zero
    BuilderManaged,
}

/// Result of a chain of batches sharing one source account
#[derive(Debug, Default)]
pub struct SequentialReport {
    pub outcomes: Vec<BatchOutcome>,
    /// Set when the chain stopped before every batch was attempted
    pub halted: Option<BatchError>,
}

impl SequentialReport {
    pub fn survivors(&self) -> Vec<Signer> {
        collect_survivors(&self.outcomes)
    }
}

/// Result of a set of independent batches
#[derive(Debug, Default)]
pub struct ParallelReport {
    /// One outcome per batch, in completion order
    pub outcomes: Vec<BatchOutcome>,
}

impl ParallelReport {
    pub fn survivors(&self) -> Vec<Signer> {
        collect_survivors(&self.outcomes)
    }

    pub fn aborted(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }
}

fn collect_survivors(outcomes: &[BatchOutcome]) -> Vec<Signer> {
    outcomes
        .iter()
        .flat_map(|outcome| outcome.survivors.iter().cloned())
        .collect()
}

/// Submit `chunks` one after another from `source`
pub async fn run_sequential<C, B>(
    submitter: &BatchSubmitter<C, B>,
    source: &str,
    chunks: Vec<Vec<Signer>>,
) -> SequentialReport
where
    C: LedgerClient + ?Sized,
    B: TransactionBuilder + ?Sized,
{
    let total = chunks.len();
    let mut report = SequentialReport::default();
    let mut succeeded = 0usize;

    for (index, chunk) in chunks.into_iter().enumerate() {
        info!(
            batch = index + 1,
            of = total,
            signers = chunk.len(),
            account = source,
            "processing batch"
        );

        let sequence = match next_sequence(&**submitter.client(), source).await {
            Ok(sequence) => sequence,
            Err(err) => {
                error!(
                    batch = index + 1,
                    account = source,
                    "halting remaining batches: {}",
                    err
                );
                report.halted = Some(err);
                break;
            }
        };

        let outcome = submitter.submit(sequence, chunk).await;
        succeeded += outcome.survivors.len();
        info!(batch = index + 1, succeeded, "batch resolved");
        report.outcomes.push(outcome);
    }

    report
}

/// Submit `chunks` concurrently, at most `max_parallel` at a time
pub async fn run_parallel<C, B>(
    submitter: &BatchSubmitter<C, B>,
    chunks: Vec<Vec<Signer>>,
    max_parallel: usize,
    policy: SequencePolicy,
) -> BatchResult<ParallelReport>
where
    C: LedgerClient + ?Sized + 'static,
    B: TransactionBuilder + ?Sized + 'static,
{
    let mut dispatcher = BoundedDispatcher::new(max_parallel);

    for (index, chunk) in chunks.into_iter().enumerate() {
        info!(batch = index + 1, signers = chunk.len(), "dispatching batch");
        let submitter = submitter.clone();
        dispatcher
            .dispatch(async move { run_job(submitter, index, chunk, policy).await })
            .await?;
    }

    let outcomes = dispatcher.join_all().await;
    let report = ParallelReport { outcomes };
    info!(
        batches = report.outcomes.len(),
        aborted = report.aborted(),
        "all dispatched batches resolved"
    );
    Ok(report)
}

async fn run_job<C, B>(
    submitter: BatchSubmitter<C, B>,
    index: usize,
    chunk: Vec<Signer>,
    policy: SequencePolicy,
) -> BatchOutcome
where
    C: LedgerClient + ?Sized,
    B: TransactionBuilder + ?Sized,
{
    let outcome = match policy {
        SequencePolicy::BuilderManaged => submitter.submit(0, chunk).await,
        SequencePolicy::AcquireFromFirstSigner => submitter.submit_from_first_signer(chunk).await,
    };
    info!(
        batch = index + 1,
        survivors = outcome.survivors.len(),
        attempts = outcome.attempts,
        "batch resolved"
    );
    outcome
}
