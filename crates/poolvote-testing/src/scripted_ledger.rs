use crate::{fixture_builder::FixtureEnvelope, OP_UNDERFUNDED};
use async_trait::async_trait;
use poolvote_batch_tx::{
    Envelope, LedgerClient, LedgerError, LedgerRejection, Receipt, TransactionResultCodes,
    GATEWAY_TIMEOUT, OP_SUCCESS, TX_FAILED,
};
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

/// A submission the ledger accepted for processing (timeouts are not recorded)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub source: String,
    pub sequence: u64,
    pub operations: Vec<String>,
    pub applied: bool,
}

#[derive(Default)]
struct LedgerState {
    sequences: HashMap<String, i64>,
    failing: HashSet<String>,
    reject_all_with: Option<String>,
    unreachable_accounts: HashSet<String>,
    submissions: Vec<Submission>,
    ledger: u64,
}

/// In-memory ledger that understands [`FixtureEnvelope`]s
///
/// Mirrors the rules the batch engine depends on:
/// - the envelope's sequence must be exactly the source's current sequence + 1
/// - a `tx_failed` transaction still consumes its sequence
/// - successful `create`-style operations open the destination account
pub struct ScriptedLedger {
    state: Mutex<LedgerState>,
    pending_timeouts: AtomicUsize,
    latency: Duration,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl Default for ScriptedLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            pending_timeouts: AtomicUsize::new(0),
            latency: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Every submission waits `latency` before it is processed
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_account(self, address: &str, sequence: i64) -> Self {
        self.state().sequences.insert(address.to_string(), sequence);
        self
    }

    /// Operations on these addresses fail with `op_underfunded` on every attempt
    pub fn with_failing(self, addresses: impl IntoIterator<Item = String>) -> Self {
        self.state().failing.extend(addresses);
        self
    }

    /// Reject every transaction with this transaction-level code
    pub fn rejecting_all_with(self, code: &str) -> Self {
        self.state().reject_all_with = Some(code.to_string());
        self
    }

    /// Sequence lookups for this address fail with a transport error
    pub fn with_unreachable_account(self, address: &str) -> Self {
        self.state()
            .unreachable_accounts
            .insert(address.to_string());
        self
    }

    /// The next `count` submissions time out before reaching the ledger
    pub fn with_timeouts(self, count: usize) -> Self {
        self.pending_timeouts.store(count, Ordering::SeqCst);
        self
    }

    pub fn sequence_of(&self, address: &str) -> Option<i64> {
        self.state().sequences.get(address).copied()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state().submissions.clone()
    }

    /// Highest number of submissions observed in flight at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        self.state.lock().expect("ledger state lock poisoned")
    }

    fn apply(&self, envelope: &FixtureEnvelope) -> Result<Receipt, LedgerError> {
        let mut state = self.state();
        state.ledger += 1;
        let ledger = state.ledger;

        let Some(current) = state.sequences.get(&envelope.source).copied() else {
            return Err(rejection("tx_no_source_account", Vec::new()));
        };
        if let Some(code) = state.reject_all_with.clone() {
            return Err(rejection(&code, Vec::new()));
        }
        if current < 0 || envelope.sequence != current as u64 + 1 {
            return Err(rejection("tx_bad_seq", Vec::new()));
        }

        let codes: Vec<String> = envelope
            .operations
            .iter()
            .map(|op| {
                if state.failing.contains(op) {
                    OP_UNDERFUNDED.to_string()
                } else {
                    OP_SUCCESS.to_string()
                }
            })
            .collect();
        let applied = codes.iter().all(|c| c == OP_SUCCESS);

        // Sequenced either way: the transaction reached apply time.
        state
            .sequences
            .insert(envelope.source.clone(), envelope.sequence as i64);
        state.submissions.push(Submission {
            source: envelope.source.clone(),
            sequence: envelope.sequence,
            operations: envelope.operations.clone(),
            applied,
        });

        if !applied {
            return Err(rejection(TX_FAILED, codes));
        }

        for op in &envelope.operations {
            state
                .sequences
                .entry(op.clone())
                .or_insert((ledger as i64) << 32);
        }

        Ok(Receipt {
            hash: format!("{:064x}", ledger),
            ledger,
            envelope_xdr: None,
            result_xdr: None,
        })
    }
}

fn rejection(transaction: &str, operations: Vec<String>) -> LedgerError {
    let mut problem = LedgerRejection::new(400, "transaction_failed")
        .with_result_codes(TransactionResultCodes::new(transaction, operations));
    problem.title = "Transaction Failed".to_string();
    LedgerError::rejected(problem)
}

#[async_trait]
impl LedgerClient for ScriptedLedger {
    async fn submit_transaction(&self, envelope: &Envelope) -> Result<Receipt, LedgerError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let result = if self
            .pending_timeouts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            Err(LedgerError::rejected(LedgerRejection::new(
                GATEWAY_TIMEOUT,
                "timeout",
            )))
        } else {
            match FixtureEnvelope::decode(envelope) {
                Some(decoded) => self.apply(&decoded),
                None => Err(LedgerError::rejected(LedgerRejection::new(
                    400,
                    "transaction_malformed",
                ))),
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn sequence_for_account(&self, address: &str) -> Result<i64, LedgerError> {
        let state = self.state();
        if state.unreachable_accounts.contains(address) {
            return Err(LedgerError::Transport("connection reset".to_string()));
        }
        state
            .sequences
            .get(address)
            .copied()
            .ok_or_else(|| LedgerError::rejected(LedgerRejection::new(404, "not_found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(source: &str, sequence: u64, ops: &[&str]) -> Envelope {
        FixtureEnvelope {
            source: source.to_string(),
            sequence,
            operations: ops.iter().map(|s| s.to_string()).collect(),
        }
        .encode()
    }

    #[tokio::test]
    async fn test_enforces_sequence() {
        let ledger = ScriptedLedger::new().with_account("GF", 10);

        let bad = ledger.submit_transaction(&envelope("GF", 12, &["GA"])).await;
        let codes = bad.unwrap_err().result_codes().cloned().unwrap();
        assert_eq!(codes.transaction, "tx_bad_seq");

        ledger
            .submit_transaction(&envelope("GF", 11, &["GA"]))
            .await
            .unwrap();
        assert_eq!(ledger.sequence_of("GF"), Some(11));
        assert!(ledger.sequence_of("GA").is_some());
    }

    #[tokio::test]
    async fn test_failed_transaction_consumes_sequence() {
        let ledger = ScriptedLedger::new()
            .with_account("GF", 1)
            .with_failing(["GB".to_string()]);

        let err = ledger
            .submit_transaction(&envelope("GF", 2, &["GA", "GB"]))
            .await
            .unwrap_err();
        let codes = err.result_codes().cloned().unwrap();
        assert_eq!(codes.transaction, TX_FAILED);
        assert_eq!(codes.operations, vec![OP_SUCCESS, OP_UNDERFUNDED]);
        assert_eq!(ledger.sequence_of("GF"), Some(2));
        assert_eq!(ledger.sequence_of("GA"), None);
    }

    #[tokio::test]
    async fn test_timeouts_then_success() {
        let ledger = ScriptedLedger::new().with_account("GF", 0).with_timeouts(2);
        let env = envelope("GF", 1, &["GA"]);

        assert!(ledger.submit_transaction(&env).await.unwrap_err().is_timeout());
        assert!(ledger.submit_transaction(&env).await.unwrap_err().is_timeout());
        assert!(ledger.submit_transaction(&env).await.is_ok());
        assert_eq!(ledger.submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_sequence_lookup_errors() {
        let ledger = ScriptedLedger::new().with_unreachable_account("GDOWN");
        assert!(matches!(
            ledger.sequence_for_account("GDOWN").await,
            Err(LedgerError::Transport(_))
        ));
        let missing = ledger.sequence_for_account("GNONE").await.unwrap_err();
        assert_eq!(missing.rejection().map(|r| r.status), Some(404));
    }
}
