/*!
# Poolvote Testing

Fixtures for exercising the batch engine without a network:

- [`ScriptedLedger`]: an in-memory ledger that enforces per-account
  sequences, fails chosen operations, and can inject gateway timeouts
- [`FixtureBuilder`]: a transaction builder with a readable envelope format
- [`deterministic_signer`] / [`signers`]: reproducible signer sets
*/

mod fixture_builder;
mod scripted_ledger;

pub use fixture_builder::{FixtureBuilder, FixtureEnvelope, FixtureSource};
pub use scripted_ledger::{ScriptedLedger, Submission};

use poolvote_batch_tx::Signer;

/// Operation code the scripted ledger reports for a failing operation
pub const OP_UNDERFUNDED: &str = "op_underfunded";

/// A signer whose address and secret are derived from `label`
pub fn deterministic_signer(label: &str) -> Signer {
    Signer::new(
        format!("G{}", label.to_uppercase()),
        format!("S{}", label.to_uppercase()),
    )
}

/// `count` signers labelled `<prefix>_0`, `<prefix>_1`, ...
pub fn signers(prefix: &str, count: usize) -> Vec<Signer> {
    (0..count)
        .map(|i| deterministic_signer(&format!("{}_{}", prefix, i)))
        .collect()
}
