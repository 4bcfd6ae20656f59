/*!
# Collaborator Seams

The core never talks to a concrete ledger or knows how envelopes are encoded.
Both concerns come in through these two traits.
*/

use crate::{
    error::{BuildError, LedgerError},
    types::{Envelope, Receipt, Signer},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Remote ledger service
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Submit an encoded envelope and wait for the ledger to apply or reject it
    async fn submit_transaction(&self, envelope: &Envelope) -> Result<Receipt, LedgerError>;

    /// Current (last used) sequence number of an account
    async fn sequence_for_account(&self, address: &str) -> Result<i64, LedgerError>;
}

/// Produces signed envelopes for a batch of signers
///
/// Called again on every retry with the next sequence and the surviving
/// signers, so implementations must be safe to run repeatedly for the same
/// logical batch.
#[async_trait]
pub trait TransactionBuilder: Send + Sync {
    async fn create_transaction(
        &self,
        sequence: u64,
        signers: &[Signer],
    ) -> Result<Envelope, BuildError>;
}

#[async_trait]
impl<T: LedgerClient + ?Sized> LedgerClient for Arc<T> {
    async fn submit_transaction(&self, envelope: &Envelope) -> Result<Receipt, LedgerError> {
        (**self).submit_transaction(envelope).await
    }

    async fn sequence_for_account(&self, address: &str) -> Result<i64, LedgerError> {
        (**self).sequence_for_account(address).await
    }
}

#[async_trait]
impl<T: TransactionBuilder + ?Sized> TransactionBuilder for Arc<T> {
    async fn create_transaction(
        &self,
        sequence: u64,
        signers: &[Signer],
    ) -> Result<Envelope, BuildError> {
        (**self).create_transaction(sequence, signers).await
    }
}
