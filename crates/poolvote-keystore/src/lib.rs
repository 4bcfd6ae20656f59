/*!
# Poolvote Keystore

Signer lists on disk. The CLI writes every generated signer to
`<output>.json` and can pick up previously generated ones from
`<input>.json`.

## Usage

```rust,no_run
use poolvote_batch_tx::Signer;
use poolvote_keystore::{keystore_path, read_signers, write_signers, KeystoreResult};

fn example() -> KeystoreResult<()> {
    let path = keystore_path("accounts");
    let signers = read_signers(&path, |record| {
        Ok::<_, String>(Signer::new(&record.address, &record.secret))
    })?;
    write_signers(keystore_path("accounts_copy"), &signers)?;
    Ok(())
}
```
*/

pub mod errors;
pub mod schemas;
pub mod storage;

pub use errors::{KeystoreError, KeystoreResult};
pub use schemas::{SignerRecord, KEYSTORE_EXTENSION};
pub use storage::{keystore_path, read_signers, write_signers};
