/*!
# Poolvote Client

HTTP access to the ledger.

- [`HorizonClient`] implements [`poolvote_batch_tx::LedgerClient`]: envelope
  submission and account sequence lookup. Failures come back as
  [`poolvote_batch_tx::LedgerError`], with Horizon problem documents mapped
  to structured rejections so the batch core can read result codes.
- [`Friendbot`] funds fresh accounts on the test network.

## Usage

```rust,no_run
use poolvote_client::HorizonClient;
use poolvote_batch_tx::LedgerClient;

# async fn example() -> Result<(), Box<dyn std::error::Error>> {
let client = HorizonClient::new("https://horizon-testnet.stellar.org")?;
let sequence = client
    .sequence_for_account("GCFXD4OBX4TZ5GGBWIXLIJHTU2Z6OWVPYYU44QSKCCU7P2RGFOOHTEST")
    .await?;
println!("next sequence is {}", sequence + 1);
# Ok(())
# }
```
*/

pub mod client;
pub mod errors;
pub mod friendbot;
pub mod types;

pub use client::HorizonClient;
pub use errors::{ClientError, ClientResult};
pub use friendbot::Friendbot;
pub use types::{AccountResponse, Problem, ProblemExtras, TransactionResponse};
