/*!
# Poolvote SDK

Everything needed to turn a batch of signers into a signed ledger envelope.

## Modules

- [`keys`] - ed25519 keypairs, `G...`/`S...` strkeys and random signer generation
- [`network`] - network passphrases, ids and default endpoints
- [`envelope`] - operations, limit-checked transactions and signed envelopes
- [`transaction_builders`] - [`AccountFunder`] and [`InflationSetter`]

## Usage

```rust,no_run
use poolvote_sdk::{generate_signers, AccountFunder, Network};
use poolvote_batch_tx::TransactionBuilder;

# async fn example(funder_secret: &str) -> Result<(), poolvote_batch_tx::BuildError> {
let funder = AccountFunder::new(funder_secret, Network::Test, 40_000_000..60_000_000)?;
let envelope = funder.create_transaction(42, &generate_signers(10)).await?;
println!("{}", envelope);
# Ok(())
# }
```
*/

pub mod envelope;
pub mod errors;
pub mod keys;
pub mod network;
pub mod transaction_builders;

pub use errors::{KeyError, KeyResult};
pub use keys::{
    address_from_secret, generate_signer, generate_signers, public_key_from_address,
    signer_from_secret, signing_key_from_secret, Keypair,
};
pub use network::Network;
pub use transaction_builders::{AccountFunder, InflationSetter};
pub use envelope::{
    create_account, set_inflation_destination, text_memo, Transaction, BASE_FEE,
};
