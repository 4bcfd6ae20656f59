/*!
# Keystore Schema

A keystore file is a JSON array of records, one per signer:

```json
[
  { "pub": "GB...", "sec": "SC..." }
]
```
*/

use poolvote_batch_tx::Signer;
use serde::{Deserialize, Serialize};

/// File extension appended to keystore names
pub const KEYSTORE_EXTENSION: &str = "json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignerRecord {
    /// Account id (`G...`)
    #[serde(rename = "pub")]
    pub address: String,

    /// Secret seed (`S...`)
    #[serde(rename = "sec")]
    pub secret: String,
}

impl From<&Signer> for SignerRecord {
    fn from(signer: &Signer) -> Self {
        Self {
            address: signer.address().to_string(),
            secret: signer.secret().to_string(),
        }
    }
}
