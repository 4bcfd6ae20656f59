/*!
# Batch Submitter

Drives one batch through build → submit → {succeeded, retrying, aborted}.

- A gateway timeout resubmits the same envelope after a fixed wait, forever.
  Dropping the future is the only way out of that loop.
- `tx_failed` rebuilds the batch with the operations that reported
  `op_success` and the next sequence number. The failed transaction was
  sequenced by the ledger, so its sequence number is spent. A batch sourced
  from its first signer looks the sequence up again when that signer was
  dropped, since the rebuilt transaction then comes from another account.
- Everything else aborts the batch with no survivors.
*/

use crate::{
    error::{BuildError, LedgerError},
    ledger::{LedgerClient, TransactionBuilder},
    result_codes::{interpret, retain_survivors},
    sequence::next_sequence,
    types::{Envelope, Receipt, Signer},
    BatchError,
};
use backoff::{backoff::Constant, future::retry_notify};
use std::{sync::Arc, time::Duration};
use tracing::{error, info, warn};

/// How a batch ended
#[derive(Debug)]
pub enum BatchStatus {
    Succeeded(Receipt),
    Aborted(BatchError),
}

/// Final state of a batch after the retry loop stops
#[derive(Debug)]
pub struct BatchOutcome {
    /// Signers whose operations were applied; empty unless the batch succeeded
    pub survivors: Vec<Signer>,
    /// Number of envelopes built (timeout resubmissions are not counted)
    pub attempts: usize,
    /// Sequence of the last envelope built, or the starting sequence if none was
    pub last_sequence: u64,
    pub status: BatchStatus,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, BatchStatus::Succeeded(_))
    }

    pub fn error(&self) -> Option<&BatchError> {
        match &self.status {
            BatchStatus::Aborted(err) => Some(err),
            BatchStatus::Succeeded(_) => None,
        }
    }

    /// An outcome for a batch that never reached the builder
    pub fn not_started(sequence: u64, err: BatchError) -> Self {
        Self {
            survivors: Vec::new(),
            attempts: 0,
            last_sequence: sequence,
            status: BatchStatus::Aborted(err),
        }
    }
}

/// One build-and-submit attempt: a sequence and the signers it covers
#[derive(Debug, Clone)]
struct Attempt {
    number: usize,
    sequence: u64,
    signers: Vec<Signer>,
}

impl Attempt {
    /// The follow-up attempt after a partial failure
    fn retry_with(&self, survivor_indices: &[usize]) -> Attempt {
        Attempt {
            number: self.number + 1,
            sequence: self.sequence + 1,
            signers: retain_survivors(&self.signers, survivor_indices),
        }
    }
}

/// Where each attempt's sequence number comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SequenceSource {
    /// One source account for every attempt; retries advance by one
    Fixed,
    /// The first signer is the source, and may change between attempts
    FirstSigner,
}

/// Retry state machine for batches built by `B` and submitted through `C`
pub struct BatchSubmitter<C: ?Sized, B: ?Sized> {
    client: Arc<C>,
    builder: Arc<B>,
    timeout_backoff: Duration,
}

impl<C: ?Sized, B: ?Sized> Clone for BatchSubmitter<C, B> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            builder: self.builder.clone(),
            timeout_backoff: self.timeout_backoff,
        }
    }
}

impl<C, B> BatchSubmitter<C, B>
where
    C: LedgerClient + ?Sized,
    B: TransactionBuilder + ?Sized,
{
    pub fn new(client: Arc<C>, builder: Arc<B>, timeout_backoff: Duration) -> Self {
        Self {
            client,
            builder,
            timeout_backoff,
        }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Submit `signers` starting at `sequence`, retrying with survivors on partial failure
    pub async fn submit(&self, sequence: u64, signers: Vec<Signer>) -> BatchOutcome {
        let attempt = Attempt {
            number: 1,
            sequence,
            signers,
        };
        self.drive(attempt, SequenceSource::Fixed).await
    }

    /// Submit `signers` with the first signer as the transaction source
    ///
    /// The source's sequence is fetched before the first attempt and again
    /// whenever a partial failure removes the current first signer.
    pub async fn submit_from_first_signer(&self, signers: Vec<Signer>) -> BatchOutcome {
        let Some(first) = signers.first() else {
            return BatchOutcome::not_started(0, BatchError::Build(BuildError::EmptyBatch));
        };
        let sequence = match next_sequence(&*self.client, first.address()).await {
            Ok(sequence) => sequence,
            Err(err) => {
                error!(account = first.address(), "batch aborted: {}", err);
                return BatchOutcome::not_started(0, err);
            }
        };

        let attempt = Attempt {
            number: 1,
            sequence,
            signers,
        };
        self.drive(attempt, SequenceSource::FirstSigner).await
    }

    async fn drive(&self, mut attempt: Attempt, source: SequenceSource) -> BatchOutcome {
        loop {
            let envelope = match self
                .builder
                .create_transaction(attempt.sequence, &attempt.signers)
                .await
            {
                Ok(envelope) => envelope,
                Err(err) => {
                    error!(
                        attempt = attempt.number,
                        sequence = attempt.sequence,
                        signers = attempt.signers.len(),
                        "failed to build transaction: {}",
                        err
                    );
                    return self.aborted(&attempt, BatchError::Build(err));
                }
            };

            match self.submit_envelope(&envelope).await {
                Ok(receipt) => {
                    info!(
                        attempt = attempt.number,
                        sequence = attempt.sequence,
                        signers = attempt.signers.len(),
                        ledger = receipt.ledger,
                        hash = %receipt.hash,
                        "transaction applied"
                    );
                    return BatchOutcome {
                        survivors: attempt.signers,
                        attempts: attempt.number,
                        last_sequence: attempt.sequence,
                        status: BatchStatus::Succeeded(receipt),
                    };
                }
                Err(err) => {
                    log_rejection(&attempt, &envelope, &err);
                    match survivors_after_rejection(&attempt, err) {
                        Ok(indices) => {
                            let next = match self
                                .resequence(attempt.retry_with(&indices), &attempt, source)
                                .await
                            {
                                Ok(next) => next,
                                Err(err) => {
                                    error!(
                                        attempt = attempt.number,
                                        "batch aborted before retry: {}", err
                                    );
                                    return self.aborted(&attempt, err);
                                }
                            };
                            warn!(
                                attempt = attempt.number,
                                sequence = attempt.sequence,
                                dropped = attempt.signers.len() - next.signers.len(),
                                remaining = next.signers.len(),
                                next_sequence = next.sequence,
                                "partial failure, retrying with surviving operations"
                            );
                            attempt = next;
                        }
                        Err(err) => {
                            error!(
                                attempt = attempt.number,
                                sequence = attempt.sequence,
                                "batch aborted: {}",
                                err
                            );
                            return self.aborted(&attempt, err);
                        }
                    }
                }
            }
        }
    }

    /// Submit one envelope, resubmitting it unchanged while the service times out
    async fn submit_envelope(&self, envelope: &Envelope) -> Result<Receipt, LedgerError> {
        let client = &self.client;
        let wait = self.timeout_backoff;

        retry_notify(
            Constant::new(wait),
            move || async move {
                client.submit_transaction(envelope).await.map_err(|err| {
                    if err.is_timeout() {
                        backoff::Error::transient(err)
                    } else {
                        backoff::Error::permanent(err)
                    }
                })
            },
            |err: LedgerError, delay: Duration| {
                warn!(
                    delay_ms = delay.as_millis() as u64,
                    "ledger timed out, resubmitting same envelope: {}", err
                );
            },
        )
        .await
    }

    /// Fetch the new source's sequence when a retry changed the first signer
    async fn resequence(
        &self,
        mut next: Attempt,
        previous: &Attempt,
        source: SequenceSource,
    ) -> Result<Attempt, BatchError> {
        if source == SequenceSource::Fixed {
            return Ok(next);
        }
        let (Some(before), Some(after)) = (previous.signers.first(), next.signers.first()) else {
            return Ok(next);
        };
        if before.address() == after.address() {
            return Ok(next);
        }

        next.sequence = next_sequence(&*self.client, after.address()).await?;
        info!(
            previous = before.address(),
            account = after.address(),
            sequence = next.sequence,
            "first signer dropped, using the new source's sequence"
        );
        Ok(next)
    }

    fn aborted(&self, attempt: &Attempt, err: BatchError) -> BatchOutcome {
        BatchOutcome {
            survivors: Vec::new(),
            attempts: attempt.number,
            last_sequence: attempt.sequence,
            status: BatchStatus::Aborted(err),
        }
    }
}

/// Decide which operations of `attempt` deserve another try after `err`
fn survivors_after_rejection(attempt: &Attempt, err: LedgerError) -> Result<Vec<usize>, BatchError> {
    let codes = match err.result_codes() {
        Some(codes) => codes.clone(),
        None => return Err(BatchError::FatalService(err)),
    };

    let interpretation = interpret(&codes.transaction, &codes.operations);
    if !interpretation.is_partial_failure {
        return Err(BatchError::FatalService(err));
    }
    if codes.operations.len() != attempt.signers.len() {
        return Err(BatchError::ResultCodeMismatch {
            expected: attempt.signers.len(),
            found: codes.operations.len(),
        });
    }
    if interpretation.survivors.is_empty() {
        return Err(BatchError::AllOperationsFailed { codes });
    }
    if interpretation.survivors.len() >= attempt.signers.len() {
        return Err(BatchError::NoProgress {
            remaining: attempt.signers.len(),
        });
    }

    Ok(interpretation.survivors)
}

fn log_rejection(attempt: &Attempt, envelope: &Envelope, err: &LedgerError) {
    warn!(
        attempt = attempt.number,
        sequence = attempt.sequence,
        envelope = %envelope,
        "submission failed: {}",
        err
    );

    let Some(rejection) = err.rejection() else {
        return;
    };
    warn!(
        status = rejection.status,
        problem_type = %rejection.problem_type,
        detail = rejection.detail.as_deref().unwrap_or(""),
        result_xdr = rejection.result_xdr.as_deref().unwrap_or(""),
        "ledger rejection"
    );
    if let Some(codes) = &rejection.result_codes {
        warn!(
            tx_code = %codes.transaction,
            op_codes = codes.operations.len(),
            "transaction result code"
        );
        for (index, (code, signer)) in codes.operations.iter().zip(&attempt.signers).enumerate() {
            warn!(index, code = %code, account = signer.address(), "operation result code");
        }
    }
}
