use async_trait::async_trait;
use poolvote_batch_tx::{BuildError, Envelope, Signer, TransactionBuilder};
use std::sync::Mutex;

/// Which account a fixture envelope is sourced from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureSource {
    /// A funding account shared by every batch
    Fixed(String),
    /// The first signer of the batch being built
    FirstSigner,
}

/// Decoded form of a fixture envelope: `source|sequence|addr,addr,...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureEnvelope {
    pub source: String,
    pub sequence: u64,
    pub operations: Vec<String>,
}

impl FixtureEnvelope {
    pub fn encode(&self) -> Envelope {
        Envelope::new(format!(
            "{}|{}|{}",
            self.source,
            self.sequence,
            self.operations.join(",")
        ))
    }

    pub fn decode(envelope: &Envelope) -> Option<Self> {
        let mut parts = envelope.as_str().splitn(3, '|');
        let source = parts.next()?.to_string();
        let sequence = parts.next()?.parse().ok()?;
        let operations = parts
            .next()?
            .split(',')
            .filter(|op| !op.is_empty())
            .map(str::to_string)
            .collect();
        Some(Self {
            source,
            sequence,
            operations,
        })
    }
}

/// Builds fixture envelopes and records every call it receives
pub struct FixtureBuilder {
    source: FixtureSource,
    builds: Mutex<Vec<FixtureEnvelope>>,
}

impl FixtureBuilder {
    pub fn new(source: FixtureSource) -> Self {
        Self {
            source,
            builds: Mutex::new(Vec::new()),
        }
    }

    pub fn funded_by(funder: &str) -> Self {
        Self::new(FixtureSource::Fixed(funder.to_string()))
    }

    /// Every envelope built so far, in call order
    pub fn builds(&self) -> Vec<FixtureEnvelope> {
        self.builds.lock().expect("builds lock poisoned").clone()
    }
}

#[async_trait]
impl TransactionBuilder for FixtureBuilder {
    async fn create_transaction(
        &self,
        sequence: u64,
        signers: &[Signer],
    ) -> Result<Envelope, BuildError> {
        let first = signers.first().ok_or(BuildError::EmptyBatch)?;
        let source = match &self.source {
            FixtureSource::Fixed(address) => address.clone(),
            FixtureSource::FirstSigner => first.address().to_string(),
        };

        let envelope = FixtureEnvelope {
            source,
            sequence,
            operations: signers.iter().map(|s| s.address().to_string()).collect(),
        };
        self.builds
            .lock()
            .expect("builds lock poisoned")
            .push(envelope.clone());
        Ok(envelope.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_envelope_format() {
        let builder = FixtureBuilder::funded_by("GFUNDER");
        let signers = vec![Signer::new("GA", "SA"), Signer::new("GB", "SB")];

        let envelope = builder.create_transaction(7, &signers).await.unwrap();
        assert_eq!(envelope.as_str(), "GFUNDER|7|GA,GB");

        let decoded = FixtureEnvelope::decode(&envelope).unwrap();
        assert_eq!(decoded.source, "GFUNDER");
        assert_eq!(decoded.sequence, 7);
        assert_eq!(decoded.operations, vec!["GA", "GB"]);
    }

    #[tokio::test]
    async fn test_first_signer_source_and_empty_batch() {
        let builder = FixtureBuilder::new(FixtureSource::FirstSigner);
        let envelope = builder
            .create_transaction(3, &[Signer::new("GX", "SX")])
            .await
            .unwrap();
        assert_eq!(envelope.as_str(), "GX|3|GX");

        let empty = builder.create_transaction(4, &[]).await;
        assert_eq!(empty, Err(BuildError::EmptyBatch));
        assert_eq!(builder.builds().len(), 1);
    }
}
