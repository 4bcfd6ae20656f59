/*!
# Envelope Encoding

Builds the two operation kinds the builders emit on top of [`stellar_xdr`],
checks the per-transaction limits before encoding, and signs the result
into a base64 `TransactionV1Envelope`.
*/

use crate::{keys::Keypair, network::Network};
use poolvote_batch_tx::{BuildError, Envelope, OPS_PER_TX_MAX};
use sha2::{Digest, Sha256};
use stellar_xdr::curr::{
    self as xdr, AccountId, CreateAccountOp, DecoratedSignature, Hash, Limits, Memo,
    MuxedAccount, Operation, OperationBody, Preconditions, PublicKey, SequenceNumber,
    SetOptionsOp, SignatureHint, StringM, TransactionEnvelope, TransactionExt,
    TransactionSignaturePayload, TransactionSignaturePayloadTaggedTransaction,
    TransactionV1Envelope, Uint256, WriteXdr,
};

/// Fee charged per operation, in stroops
pub const BASE_FEE: u32 = 100;

/// Longest text memo the ledger accepts, in bytes
pub const MEMO_TEXT_MAX: usize = 28;

/// Most signatures a single envelope may carry
pub const SIGNATURES_MAX: usize = 20;

fn encoding_error(err: xdr::Error) -> BuildError {
    BuildError::Encoding(err.to_string())
}

fn account_id(key: [u8; 32]) -> AccountId {
    AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(key)))
}

/// Text memo cut to the ledger's 28-byte limit on a character boundary
pub fn text_memo(text: &str) -> Result<Memo, BuildError> {
    let mut end = text.len().min(MEMO_TEXT_MAX);
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    let text = StringM::<28>::try_from(text[..end].to_string()).map_err(encoding_error)?;
    Ok(Memo::Text(text))
}

pub fn create_account(destination: [u8; 32], starting_balance: i64) -> Operation {
    Operation {
        source_account: None,
        body: OperationBody::CreateAccount(CreateAccountOp {
            destination: account_id(destination),
            starting_balance,
        }),
    }
}

/// `SetOptions` touching only the inflation destination, applied to `source`
pub fn set_inflation_destination(source: [u8; 32], inflation_dest: [u8; 32]) -> Operation {
    Operation {
        source_account: Some(MuxedAccount::Ed25519(Uint256(source))),
        body: OperationBody::SetOptions(SetOptionsOp {
            inflation_dest: Some(account_id(inflation_dest)),
            clear_flags: None,
            set_flags: None,
            master_weight: None,
            low_threshold: None,
            med_threshold: None,
            high_threshold: None,
            home_domain: None,
            signer: None,
        }),
    }
}

/// An unsigned v1 transaction that already satisfies the ledger's limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    inner: xdr::Transaction,
}

impl Transaction {
    pub fn new(
        source: [u8; 32],
        sequence: u64,
        memo: Memo,
        operations: Vec<Operation>,
    ) -> Result<Self, BuildError> {
        if operations.is_empty() {
            return Err(BuildError::EmptyBatch);
        }
        if operations.len() > OPS_PER_TX_MAX {
            return Err(BuildError::TooManyOperations {
                count: operations.len(),
                max: OPS_PER_TX_MAX,
            });
        }
        let sequence = i64::try_from(sequence)
            .map_err(|_| BuildError::Sequence(format!("{} does not fit in i64", sequence)))?;
        let fee = BASE_FEE * operations.len() as u32;

        Ok(Self {
            inner: xdr::Transaction {
                source_account: MuxedAccount::Ed25519(Uint256(source)),
                fee,
                seq_num: SequenceNumber(sequence),
                cond: Preconditions::None,
                memo,
                operations: operations.try_into().map_err(encoding_error)?,
                ext: TransactionExt::V0,
            },
        })
    }

    pub fn as_xdr(&self) -> &xdr::Transaction {
        &self.inner
    }

    pub fn fee(&self) -> u32 {
        self.inner.fee
    }

    pub fn to_xdr(&self) -> Result<Vec<u8>, BuildError> {
        self.inner.to_xdr(Limits::none()).map_err(encoding_error)
    }

    /// Hash every signer signs: SHA-256 of the network-tagged transaction
    pub fn signature_payload(&self, network: Network) -> Result<[u8; 32], BuildError> {
        let payload = TransactionSignaturePayload {
            network_id: Hash(network.network_id()),
            tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(
                self.inner.clone(),
            ),
        };
        let bytes = payload.to_xdr(Limits::none()).map_err(encoding_error)?;
        Ok(Sha256::digest(bytes).into())
    }

    /// Sign with every keypair and encode the envelope as base64
    pub fn sign(&self, network: Network, keypairs: &[&Keypair]) -> Result<Envelope, BuildError> {
        if keypairs.len() > SIGNATURES_MAX {
            return Err(BuildError::Encoding(format!(
                "{} signatures exceed the limit of {}",
                keypairs.len(),
                SIGNATURES_MAX
            )));
        }

        let payload = self.signature_payload(network)?;
        let signatures = keypairs
            .iter()
            .map(|keypair| -> Result<DecoratedSignature, BuildError> {
                let signature = keypair.sign(&payload).to_vec();
                Ok(DecoratedSignature {
                    hint: SignatureHint(keypair.hint()),
                    signature: xdr::Signature(signature.try_into().map_err(encoding_error)?),
                })
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        let envelope = TransactionEnvelope::Tx(TransactionV1Envelope {
            tx: self.inner.clone(),
            signatures: signatures.try_into().map_err(encoding_error)?,
        });
        envelope
            .to_xdr_base64(Limits::none())
            .map(Envelope::new)
            .map_err(encoding_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};
    use stellar_xdr::curr::ReadXdr;

    fn decode(envelope: &Envelope) -> TransactionV1Envelope {
        match TransactionEnvelope::from_xdr_base64(envelope.as_str(), Limits::none()).unwrap() {
            TransactionEnvelope::Tx(v1) => v1,
            other => panic!("expected a v1 envelope, got {:?}", other),
        }
    }

    #[test]
    fn test_memo_is_truncated() {
        let memo = text_memo("a memo that is much longer than the ledger allows").unwrap();
        match memo {
            Memo::Text(text) => assert_eq!(text.as_slice(), b"a memo that is much longer t"),
            other => panic!("expected text memo, got {:?}", other),
        }

        match text_memo("ééééééééééééééé").unwrap() {
            Memo::Text(text) => assert_eq!(text.as_slice().len(), 28),
            other => panic!("expected text memo, got {:?}", other),
        }
    }

    #[test]
    fn test_create_account_encoding() {
        let tx = Transaction::new(
            [1u8; 32],
            4294967297,
            text_memo("abc").unwrap(),
            vec![create_account([2u8; 32], 40_000_000)],
        )
        .unwrap();
        let bytes = tx.to_xdr().unwrap();

        // ed25519 source, 100 stroop fee, then the sequence
        assert_eq!(&bytes[..4], &[0, 0, 0, 0]);
        assert_eq!(&bytes[4..36], &[1u8; 32]);
        assert_eq!(&bytes[36..40], &100u32.to_be_bytes());
        assert_eq!(&bytes[40..48], &4294967297i64.to_be_bytes());
        assert_eq!(bytes.len(), 124);

        let decoded = xdr::Transaction::from_xdr(&bytes, Limits::none()).unwrap();
        assert_eq!(&decoded, tx.as_xdr());
    }

    #[test]
    fn test_fee_scales_with_operations() {
        let tx = Transaction::new(
            [1u8; 32],
            7,
            Memo::None,
            vec![
                set_inflation_destination([3u8; 32], [9u8; 32]),
                set_inflation_destination([4u8; 32], [9u8; 32]),
            ],
        )
        .unwrap();
        assert_eq!(tx.fee(), 200);

        let op = &tx.as_xdr().operations.as_slice()[1];
        assert_eq!(
            op.source_account,
            Some(MuxedAccount::Ed25519(Uint256([4u8; 32])))
        );
        match &op.body {
            OperationBody::SetOptions(set_options) => {
                assert_eq!(set_options.inflation_dest, Some(account_id([9u8; 32])));
                assert!(set_options.signer.is_none());
                assert!(set_options.home_domain.is_none());
            }
            other => panic!("expected SetOptions, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert_eq!(
            Transaction::new([0u8; 32], 1, Memo::None, vec![]),
            Err(BuildError::EmptyBatch)
        );

        let ops = vec![create_account([0u8; 32], 1); OPS_PER_TX_MAX + 1];
        assert_eq!(
            Transaction::new([0u8; 32], 1, Memo::None, ops),
            Err(BuildError::TooManyOperations {
                count: OPS_PER_TX_MAX + 1,
                max: OPS_PER_TX_MAX
            })
        );

        let ops = vec![create_account([0u8; 32], 1)];
        assert!(matches!(
            Transaction::new([0u8; 32], u64::MAX, Memo::None, ops),
            Err(BuildError::Sequence(_))
        ));

        let keypair = Keypair::from_seed_bytes(&[1u8; 32]);
        let tx = Transaction::new(
            keypair.public_key(),
            1,
            Memo::None,
            vec![create_account([2u8; 32], 1)],
        )
        .unwrap();
        let too_many = vec![&keypair; SIGNATURES_MAX + 1];
        assert!(matches!(
            tx.sign(Network::Test, &too_many),
            Err(BuildError::Encoding(_))
        ));
    }

    #[test]
    fn test_envelope_signatures_verify() {
        let first = Keypair::from_seed_bytes(&[1u8; 32]);
        let second = Keypair::from_seed_bytes(&[2u8; 32]);
        let tx = Transaction::new(
            first.public_key(),
            12,
            text_memo("abc").unwrap(),
            vec![create_account([2u8; 32], 40_000_000)],
        )
        .unwrap();

        let envelope = decode(&tx.sign(Network::Test, &[&first, &second]).unwrap());
        assert_eq!(&envelope.tx, tx.as_xdr());
        assert_eq!(envelope.signatures.as_slice().len(), 2);

        let hash = tx.signature_payload(Network::Test).unwrap();
        for (keypair, decorated) in [&first, &second].iter().zip(envelope.signatures.as_slice()) {
            assert_eq!(decorated.hint, SignatureHint(keypair.hint()));
            let signature: [u8; 64] = decorated.signature.0.as_slice().try_into().unwrap();
            VerifyingKey::from_bytes(&keypair.public_key())
                .unwrap()
                .verify(&hash, &Signature::from_bytes(&signature))
                .unwrap();
        }
    }

    #[test]
    fn test_signature_depends_on_network() {
        let keypair = Keypair::from_seed_bytes(&[1u8; 32]);
        let tx = Transaction::new(
            keypair.public_key(),
            1,
            Memo::None,
            vec![create_account([2u8; 32], 1)],
        )
        .unwrap();

        assert_ne!(
            tx.signature_payload(Network::Test).unwrap(),
            tx.signature_payload(Network::Public).unwrap()
        );
        assert_ne!(
            tx.sign(Network::Test, &[&keypair]).unwrap(),
            tx.sign(Network::Public, &[&keypair]).unwrap()
        );
    }
}
