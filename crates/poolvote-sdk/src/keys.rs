use crate::errors::{KeyError, KeyResult};
use ed25519_dalek::{Signer as _, SigningKey};
use poolvote_batch_tx::Signer;
use rand::rngs::OsRng;
use stellar_strkey::ed25519::{PrivateKey, PublicKey};

/// An ed25519 key pair that can sign envelopes
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    pub fn random() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_seed_bytes(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Parse an `S...` secret seed
    pub fn from_secret(secret: &str) -> KeyResult<Self> {
        Ok(Self::from_seed_bytes(&decode_seed(secret)?))
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// The `G...` account id
    pub fn address(&self) -> String {
        PublicKey(self.public_key()).to_string()
    }

    /// The `S...` secret seed
    pub fn secret(&self) -> String {
        PrivateKey(self.signing_key.to_bytes()).to_string()
    }

    /// Last four bytes of the public key, used to match signatures to signers
    pub fn hint(&self) -> [u8; 4] {
        let public_key = self.public_key();
        let mut hint = [0u8; 4];
        hint.copy_from_slice(&public_key[28..]);
        hint
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    pub fn to_signer(&self) -> Signer {
        Signer::new(self.address(), self.secret())
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

fn decode_seed(secret: &str) -> KeyResult<[u8; 32]> {
    PrivateKey::from_string(secret)
        .map(|seed| seed.0)
        .map_err(|_| KeyError::InvalidSecret)
}

/// A fresh random signer
pub fn generate_signer() -> Signer {
    Keypair::random().to_signer()
}

/// `count` fresh random signers
pub fn generate_signers(count: usize) -> Vec<Signer> {
    (0..count).map(|_| generate_signer()).collect()
}

/// Rebuild a signer from its secret, checking that it is well formed
pub fn signer_from_secret(secret: &str) -> KeyResult<Signer> {
    Keypair::from_secret(secret).map(|keypair| keypair.to_signer())
}

pub fn signing_key_from_secret(secret: &str) -> KeyResult<SigningKey> {
    Ok(SigningKey::from_bytes(&decode_seed(secret)?))
}

pub fn address_from_secret(secret: &str) -> KeyResult<String> {
    Keypair::from_secret(secret).map(|keypair| keypair.address())
}

/// Decode a `G...` address to its raw public key
pub fn public_key_from_address(address: &str) -> KeyResult<[u8; 32]> {
    PublicKey::from_string(address)
        .map(|key| key.0)
        .map_err(|_| KeyError::InvalidAccountId(address.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    const SEED_ONES: &str = "SAAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQC5MY";
    const ADDRESS_ONES: &str = "GCFIRY65OQE7DFP5KLNS2PF2LVZMUZYJX4OZIEQ36N2IQANUB5XVYOJR";
    const ADDRESS_ZERO: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

    #[test]
    fn test_known_keypair() {
        let keypair = Keypair::from_secret(SEED_ONES).unwrap();
        assert_eq!(keypair.address(), ADDRESS_ONES);
        assert_eq!(keypair.secret(), SEED_ONES);
        assert_eq!(&keypair.hint(), &keypair.public_key()[28..]);
        assert_eq!(address_from_secret(SEED_ONES).unwrap(), ADDRESS_ONES);
        assert_eq!(
            signing_key_from_secret(SEED_ONES).unwrap().to_bytes(),
            [1u8; 32]
        );
    }

    #[test]
    fn test_address_decoding() {
        assert_eq!(public_key_from_address(ADDRESS_ZERO).unwrap(), [0u8; 32]);

        // a seed is not an account id
        assert_eq!(
            public_key_from_address(SEED_ONES),
            Err(KeyError::InvalidAccountId(SEED_ONES.to_string()))
        );

        let mut corrupted = ADDRESS_ONES.to_string();
        corrupted.pop();
        corrupted.push('A');
        assert!(public_key_from_address(&corrupted).is_err());
        assert!(public_key_from_address("GABC").is_err());
        assert!(public_key_from_address(&ADDRESS_ONES.to_lowercase()).is_err());
    }

    #[test]
    fn test_bad_secret_is_not_echoed() {
        let err = Keypair::from_secret(ADDRESS_ONES).unwrap_err();
        assert_eq!(err, KeyError::InvalidSecret);
        assert!(!err.to_string().contains(ADDRESS_ONES));
        assert!(signer_from_secret("SBAD").is_err());
    }

    #[test]
    fn test_generated_signers_are_distinct_and_parseable() {
        let signers = generate_signers(5);
        for (i, signer) in signers.iter().enumerate() {
            assert!(signer.address().starts_with('G'));
            assert!(signer.secret().starts_with('S'));
            assert_eq!(signer_from_secret(signer.secret()).unwrap(), *signer);
            assert!(signers[i + 1..].iter().all(|other| other != signer));
        }
    }

    #[test]
    fn test_signature_verifies() {
        let keypair = Keypair::random();
        let signature = keypair.sign(b"payload");

        let verifying_key = VerifyingKey::from_bytes(&keypair.public_key()).unwrap();
        assert!(verifying_key
            .verify(b"payload", &Signature::from_bytes(&signature))
            .is_ok());
    }

    #[test]
    fn test_debug_hides_secret() {
        let keypair = Keypair::from_secret(SEED_ONES).unwrap();
        let rendered = format!("{:?}", keypair);
        assert!(rendered.contains(ADDRESS_ONES));
        assert!(!rendered.contains(SEED_ONES));
    }
}
