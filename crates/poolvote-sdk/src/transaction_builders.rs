/*!
# Transaction Builders

The two concrete [`TransactionBuilder`]s the CLI drives through the batch
regimes.

- [`AccountFunder`] creates one account per signer, paid for and signed by a
  single funder. Starting balances are stable per address, so a retried
  batch asks for the same amounts again.
- [`InflationSetter`] points every signer's inflation destination at one
  pool. The first signer of the batch is the transaction source, so its
  sequence is looked up on every build.
*/

use crate::{
    envelope::{create_account, set_inflation_destination, text_memo, Transaction},
    keys::{public_key_from_address, Keypair},
    network::Network,
};
use poolvote_batch_tx::{
    async_trait, next_sequence, BuildError, Envelope, LedgerClient, Signer, TransactionBuilder,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use sha2::{Digest, Sha256};
use std::{ops::Range, sync::Arc};
use tracing::debug;

fn address_suffix(address: &str) -> &str {
    &address[address.len().saturating_sub(8)..]
}

fn decode_address(address: &str) -> Result<[u8; 32], BuildError> {
    public_key_from_address(address).map_err(|_| BuildError::InvalidAddress(address.to_string()))
}

fn keypair_for(signer: &Signer) -> Result<Keypair, BuildError> {
    Keypair::from_secret(signer.secret())
        .map_err(|_| BuildError::InvalidSecret(signer.address().to_string()))
}

// ============================================================================
// Account funding
// ============================================================================

pub struct AccountFunder {
    funder: Keypair,
    network: Network,
    balance_range: Range<i64>,
    amount_seed: [u8; 32],
}

impl AccountFunder {
    /// Funder from its secret; starting balances are drawn from `balance_range` stroops
    pub fn new(
        funder_secret: &str,
        network: Network,
        balance_range: Range<i64>,
    ) -> Result<Self, BuildError> {
        let funder = Keypair::from_secret(funder_secret)
            .map_err(|_| BuildError::InvalidSecret("funder".to_string()))?;

        Ok(Self {
            funder,
            network,
            balance_range,
            amount_seed: rand::random(),
        })
    }

    /// Fix the seed that balances are derived from
    pub fn with_amount_seed(mut self, seed: [u8; 32]) -> Self {
        self.amount_seed = seed;
        self
    }

    pub fn funder_address(&self) -> String {
        self.funder.address()
    }

    /// Starting balance for `address`; the same address always gets the same amount
    pub fn starting_balance(&self, address: &str) -> i64 {
        if self.balance_range.is_empty() {
            return self.balance_range.start;
        }

        let mut hasher = Sha256::new();
        hasher.update(self.amount_seed);
        hasher.update(address.as_bytes());
        let mut rng = StdRng::from_seed(hasher.finalize().into());
        rng.gen_range(self.balance_range.clone())
    }
}

#[async_trait]
impl TransactionBuilder for AccountFunder {
    async fn create_transaction(
        &self,
        sequence: u64,
        signers: &[Signer],
    ) -> Result<Envelope, BuildError> {
        if signers.is_empty() {
            return Err(BuildError::EmptyBatch);
        }

        let operations = signers
            .iter()
            .map(|signer| -> Result<_, BuildError> {
                let destination = decode_address(signer.address())?;
                Ok(create_account(
                    destination,
                    self.starting_balance(signer.address()),
                ))
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        let funder_address = self.funder.address();
        let memo = text_memo(&format!(
            "{} funding accounts",
            address_suffix(&funder_address)
        ))?;

        let tx = Transaction::new(self.funder.public_key(), sequence, memo, operations)?;
        debug!(
            account = %funder_address,
            sequence,
            operations = signers.len(),
            "Built funding transaction"
        );
        tx.sign(self.network, &[&self.funder])
    }
}

// ============================================================================
// Inflation destination
// ============================================================================

pub struct InflationSetter<C: ?Sized> {
    client: Arc<C>,
    network: Network,
    destination: String,
    destination_key: [u8; 32],
}

impl<C: LedgerClient + ?Sized> InflationSetter<C> {
    pub fn new(client: Arc<C>, network: Network, destination: &str) -> Result<Self, BuildError> {
        Ok(Self {
            client,
            network,
            destination_key: decode_address(destination)?,
            destination: destination.to_string(),
        })
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }
}

#[async_trait]
impl<C: LedgerClient + ?Sized> TransactionBuilder for InflationSetter<C> {
    /// The `sequence` argument is ignored: the source is the batch's first
    /// signer and its sequence is fetched here
    async fn create_transaction(
        &self,
        _sequence: u64,
        signers: &[Signer],
    ) -> Result<Envelope, BuildError> {
        let keypairs = signers
            .iter()
            .map(keypair_for)
            .collect::<Result<Vec<_>, BuildError>>()?;
        let source = keypairs.first().ok_or(BuildError::EmptyBatch)?;

        let source_address = source.address();
        let sequence = next_sequence(&*self.client, &source_address)
            .await
            .map_err(|err| BuildError::Sequence(err.to_string()))?;

        let operations = keypairs
            .iter()
            .map(|keypair| set_inflation_destination(keypair.public_key(), self.destination_key))
            .collect();
        let memo = text_memo(&format!(
            "Voting for {}",
            address_suffix(&self.destination)
        ))?;

        let tx = Transaction::new(source.public_key(), sequence, memo, operations)?;
        debug!(
            account = %source_address,
            sequence,
            operations = keypairs.len(),
            destination = %self.destination,
            "Built inflation transaction"
        );

        let signing: Vec<&Keypair> = keypairs.iter().collect();
        tx.sign(self.network, &signing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_signers;
    use poolvote_batch_tx::{LedgerError, LedgerRejection, Receipt};
    use stellar_xdr::curr::{
        Limits, Memo, MuxedAccount, ReadXdr, TransactionEnvelope, TransactionV1Envelope, Uint256,
    };

    const FUNDER_SECRET: &str = "SAAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQC5MY";
    const FUNDER_ADDRESS: &str = "GCFIRY65OQE7DFP5KLNS2PF2LVZMUZYJX4OZIEQ36N2IQANUB5XVYOJR";

    struct Sequences(Vec<(String, i64)>);

    #[async_trait]
    impl LedgerClient for Sequences {
        async fn submit_transaction(&self, _: &Envelope) -> Result<Receipt, LedgerError> {
            Err(LedgerError::Transport("not used".to_string()))
        }

        async fn sequence_for_account(&self, address: &str) -> Result<i64, LedgerError> {
            self.0
                .iter()
                .find(|(account, _)| account == address)
                .map(|(_, sequence)| *sequence)
                .ok_or_else(|| LedgerError::rejected(LedgerRejection::new(404, "not_found")))
        }
    }

    fn decode(envelope: &Envelope) -> TransactionV1Envelope {
        match TransactionEnvelope::from_xdr_base64(envelope.as_str(), Limits::none()).unwrap() {
            TransactionEnvelope::Tx(v1) => v1,
            other => panic!("expected a v1 envelope, got {:?}", other),
        }
    }

    fn source_of(envelope: &TransactionV1Envelope) -> [u8; 32] {
        match &envelope.tx.source_account {
            MuxedAccount::Ed25519(Uint256(key)) => *key,
            other => panic!("unexpected source {:?}", other),
        }
    }

    fn memo_of(envelope: &TransactionV1Envelope) -> Vec<u8> {
        match &envelope.tx.memo {
            Memo::Text(text) => text.as_slice().to_vec(),
            other => panic!("expected text memo, got {:?}", other),
        }
    }

    #[test]
    fn test_starting_balance_is_stable_and_in_range() {
        let funder = AccountFunder::new(FUNDER_SECRET, Network::Test, 40_000_000..60_000_000)
            .unwrap()
            .with_amount_seed([5u8; 32]);

        for signer in generate_signers(20) {
            let amount = funder.starting_balance(signer.address());
            assert!((40_000_000..60_000_000).contains(&amount));
            assert_eq!(amount, funder.starting_balance(signer.address()));
        }

        let degenerate = AccountFunder::new(FUNDER_SECRET, Network::Test, 7..7).unwrap();
        assert_eq!(degenerate.starting_balance(FUNDER_ADDRESS), 7);
    }

    #[tokio::test]
    async fn test_funding_transaction_shape() {
        let funder = AccountFunder::new(FUNDER_SECRET, Network::Test, 40_000_000..60_000_000)
            .unwrap();
        assert_eq!(funder.funder_address(), FUNDER_ADDRESS);

        let signers = generate_signers(3);
        let envelope = decode(&funder.create_transaction(99, &signers).await.unwrap());

        let funder_key = public_key_from_address(FUNDER_ADDRESS).unwrap();
        assert_eq!(source_of(&envelope), funder_key);
        assert_eq!(envelope.tx.seq_num.0, 99);
        assert_eq!(envelope.tx.fee, 300);
        assert_eq!(envelope.tx.operations.as_slice().len(), 3);
        assert_eq!(memo_of(&envelope), b"B5XVYOJR funding accounts".to_vec());
        assert_eq!(envelope.signatures.as_slice().len(), 1);
    }

    #[tokio::test]
    async fn test_funding_rejects_empty_and_bad_addresses() {
        let funder = AccountFunder::new(FUNDER_SECRET, Network::Test, 1..2).unwrap();
        assert_eq!(
            funder.create_transaction(1, &[]).await,
            Err(BuildError::EmptyBatch)
        );

        let bogus = Signer::new("GNOTANADDRESS", FUNDER_SECRET);
        assert_eq!(
            funder.create_transaction(1, &[bogus]).await,
            Err(BuildError::InvalidAddress("GNOTANADDRESS".to_string()))
        );

        assert!(matches!(
            AccountFunder::new("SBAD", Network::Test, 1..2),
            Err(BuildError::InvalidSecret(_))
        ));
    }

    #[tokio::test]
    async fn test_inflation_source_is_first_signer() {
        let signers = generate_signers(3);
        let client = Arc::new(Sequences(vec![(signers[0].address().to_string(), 41)]));
        let setter = InflationSetter::new(client, Network::Test, FUNDER_ADDRESS).unwrap();

        let envelope = decode(&setter.create_transaction(0, &signers).await.unwrap());

        let first_key = public_key_from_address(signers[0].address()).unwrap();
        assert_eq!(source_of(&envelope), first_key);
        assert_eq!(
            envelope.tx.seq_num.0, 42,
            "sequence is fetched, not taken from the caller"
        );
        assert_eq!(memo_of(&envelope), b"Voting for B5XVYOJR".to_vec());
        assert_eq!(envelope.signatures.as_slice().len(), 3);
    }

    #[tokio::test]
    async fn test_inflation_follows_new_first_signer() {
        let signers = generate_signers(2);
        let client = Arc::new(Sequences(vec![
            (signers[0].address().to_string(), 10),
            (signers[1].address().to_string(), 500),
        ]));
        let setter = InflationSetter::new(client, Network::Test, FUNDER_ADDRESS).unwrap();

        let envelope = decode(&setter.create_transaction(0, &signers[1..]).await.unwrap());
        assert_eq!(
            source_of(&envelope),
            public_key_from_address(signers[1].address()).unwrap()
        );
        assert_eq!(envelope.tx.seq_num.0, 501);
    }

    #[tokio::test]
    async fn test_inflation_errors() {
        let client = Arc::new(Sequences(vec![]));
        let setter = InflationSetter::new(client, Network::Test, FUNDER_ADDRESS).unwrap();

        assert_eq!(
            setter.create_transaction(0, &[]).await,
            Err(BuildError::EmptyBatch)
        );
        assert!(matches!(
            setter.create_transaction(0, &generate_signers(1)).await,
            Err(BuildError::Sequence(_))
        ));

        let unsigned = Signer::new(FUNDER_ADDRESS, "not a secret");
        assert_eq!(
            setter.create_transaction(0, &[unsigned]).await,
            Err(BuildError::InvalidSecret(FUNDER_ADDRESS.to_string()))
        );

        assert!(matches!(
            InflationSetter::new(Arc::new(Sequences(vec![])), Network::Test, "nope"),
            Err(BuildError::InvalidAddress(_))
        ));
    }
}
