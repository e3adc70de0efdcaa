//! Ledger source trait and stub implementation.
//!
//! Every remote read in the system goes through [`LedgerSource`]: the
//! three logical queries (current height, hashes by address, record by
//! hash) plus the composed [`transactions_for`] fetch built from them.
//! The trait abstracts the mechanism by which ledger data is obtained --
//! a JSON-RPC endpoint in production, or [`StubLedgerSource`] with
//! canned results in tests.
//!
//! Implementations are shared behind an [`Arc`] by the facade and the
//! refresh loop at the same time, so they must be usable concurrently
//! through `&self`.
//!
//! # Errors
//!
//! [`SourceError`] is the whole failure taxonomy. Only
//! [`transaction_by_hash`] distinguishes [`SourceError::NotFound`] from
//! generic failure; the two other queries fail with transport or decode
//! kinds only.
//!
//! [`transactions_for`]: LedgerSource::transactions_for
//! [`transaction_by_hash`]: LedgerSource::transaction_by_hash
//! [`Arc`]: std::sync::Arc

use std::collections::BTreeMap;
use std::future::Future;

use chainwatch_types::{Address, Transaction, TxHash};
use tokio::sync::RwLock;

/// Errors reported by a ledger source.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    /// The remote call could not complete: connectivity loss, timeout,
    /// or an error payload reported by the endpoint itself.
    #[error("transport failure: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },

    /// The response arrived but did not match the expected shape.
    #[error("decode failure: {message}")]
    Decode {
        /// Description of the mismatch.
        message: String,
    },

    /// The remote source has no record for the requested hash.
    #[error("no transaction found for hash {hash}")]
    NotFound {
        /// The hash that failed to resolve.
        hash: TxHash,
    },
}

/// A read-only view of the remote ledger.
///
/// The three required methods map one-to-one onto remote queries and
/// are issued at most once per invocation: there is no retry here or
/// anywhere above. The next refresh cycle is the retry mechanism.
pub trait LedgerSource: Send + Sync {
    /// Current chain height.
    fn current_height(&self) -> impl Future<Output = Result<u64, SourceError>> + Send;

    /// Hashes of all ledger entries referencing `address`, in the order
    /// the remote source reports them. No re-sorting is applied.
    fn transaction_hashes(
        &self,
        address: &Address,
    ) -> impl Future<Output = Result<Vec<TxHash>, SourceError>> + Send;

    /// Full record for one transaction hash.
    ///
    /// # Errors
    ///
    /// [`SourceError::NotFound`] when the ledger has no record for
    /// `hash`, so callers can tell an absent record from a failed call.
    fn transaction_by_hash(
        &self,
        hash: &TxHash,
    ) -> impl Future<Output = Result<Transaction, SourceError>> + Send;

    /// Resolve every entry referencing `address` to its full record,
    /// preserving hash order.
    ///
    /// All-or-nothing: the first per-hash failure aborts the whole call
    /// and no partial list is returned. A half-updated snapshot is
    /// worse than a stale one.
    fn transactions_for(
        &self,
        address: &Address,
    ) -> impl Future<Output = Result<Vec<Transaction>, SourceError>> + Send {
        async move {
            let hashes = self.transaction_hashes(address).await?;
            let mut transactions = Vec::with_capacity(hashes.len());
            for hash in &hashes {
                transactions.push(self.transaction_by_hash(hash).await?);
            }
            Ok(transactions)
        }
    }
}

#[derive(Debug, Default)]
struct StubState {
    height: u64,
    height_error: Option<SourceError>,
    logs: BTreeMap<Address, Vec<TxHash>>,
    records: BTreeMap<TxHash, Transaction>,
    address_errors: BTreeMap<Address, SourceError>,
}

/// An in-memory ledger source with canned results.
///
/// Used by tests (and offline runs) to exercise the registry, the
/// refresh loop, and the facade without a network. Canned data can be
/// replaced mid-test, and failures can be injected per address or for
/// the height query. The composed fetch deliberately runs through the
/// default [`LedgerSource::transactions_for`] so the all-or-nothing
/// contract is exercised, not bypassed.
#[derive(Debug, Default)]
pub struct StubLedgerSource {
    state: RwLock<StubState>,
}

impl StubLedgerSource {
    /// Create an empty stub reporting height 0 and no transactions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the height returned by `current_height`, clearing any
    /// injected height failure.
    pub async fn set_height(&self, height: u64) {
        let mut state = self.state.write().await;
        state.height = height;
        state.height_error = None;
    }

    /// Make `current_height` fail with `error` until the next
    /// [`set_height`](Self::set_height).
    pub async fn fail_height(&self, error: SourceError) {
        let mut state = self.state.write().await;
        state.height_error = Some(error);
    }

    /// Replace the canned transactions for `address`.
    ///
    /// Hash lookups are registered for each record, log order follows
    /// the given order, and any injected failure for `address` is
    /// cleared.
    pub async fn set_transactions(&self, address: Address, transactions: Vec<Transaction>) {
        let mut state = self.state.write().await;
        state.address_errors.remove(&address);
        let hashes = transactions.iter().map(|tx| tx.hash.clone()).collect();
        for tx in transactions {
            state.records.insert(tx.hash.clone(), tx);
        }
        state.logs.insert(address, hashes);
    }

    /// Make `transaction_hashes` fail with `error` for `address` until
    /// the next [`set_transactions`](Self::set_transactions).
    pub async fn fail_address(&self, address: Address, error: SourceError) {
        let mut state = self.state.write().await;
        state.address_errors.insert(address, error);
    }

    /// Drop the record behind `hash` while leaving it referenced by the
    /// logs, so a composed fetch runs into a missing record.
    pub async fn remove_record(&self, hash: &TxHash) {
        let mut state = self.state.write().await;
        state.records.remove(hash);
    }
}

impl LedgerSource for StubLedgerSource {
    async fn current_height(&self) -> Result<u64, SourceError> {
        let state = self.state.read().await;
        match &state.height_error {
            Some(error) => Err(error.clone()),
            None => Ok(state.height),
        }
    }

    async fn transaction_hashes(&self, address: &Address) -> Result<Vec<TxHash>, SourceError> {
        let state = self.state.read().await;
        if let Some(error) = state.address_errors.get(address) {
            return Err(error.clone());
        }
        Ok(state.logs.get(address).cloned().unwrap_or_default())
    }

    async fn transaction_by_hash(&self, hash: &TxHash) -> Result<Transaction, SourceError> {
        let state = self.state.read().await;
        state
            .records
            .get(hash)
            .cloned()
            .ok_or_else(|| SourceError::NotFound { hash: hash.clone() })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn make_tx(hash: &str, from: &str) -> Transaction {
        Transaction {
            block_hash: String::from("0xbeab"),
            block_number: String::from("0x52a96e"),
            from: Address::new(from),
            gas: String::from("0x5208"),
            gas_price: String::from("0x4a817c800"),
            hash: TxHash::new(hash),
            input: String::from("0x"),
            nonce: String::from("0x15"),
            to: Some(Address::new("0x102")),
            transaction_index: String::from("0x41"),
            value: String::from("0xf3dbb76162000"),
            v: String::from("0x25"),
            r: String::from("0x1b5e"),
            s: String::from("0x4ba6"),
        }
    }

    #[tokio::test]
    async fn empty_stub_reports_height_zero_and_no_hashes() {
        let stub = StubLedgerSource::new();
        assert_eq!(stub.current_height().await.unwrap(), 0);

        let hashes = stub.transaction_hashes(&Address::new("0xa")).await.unwrap();
        assert!(hashes.is_empty());
    }

    #[tokio::test]
    async fn canned_transactions_resolve_in_order() {
        let stub = StubLedgerSource::new();
        let address = Address::new("0xa");
        let first = make_tx("0x0ce1", "0x101");
        let second = make_tx("0xf850", "0x101");
        stub.set_transactions(address.clone(), vec![first.clone(), second.clone()])
            .await;

        let hashes = stub.transaction_hashes(&address).await.unwrap();
        assert_eq!(hashes, vec![TxHash::new("0x0ce1"), TxHash::new("0xf850")]);

        let resolved = stub.transactions_for(&address).await.unwrap();
        assert_eq!(resolved, vec![first, second]);
    }

    #[tokio::test]
    async fn unknown_hash_is_not_found() {
        let stub = StubLedgerSource::new();
        let result = stub.transaction_by_hash(&TxHash::new("0xdead")).await;
        assert!(matches!(result, Err(SourceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn injected_address_failure_surfaces_undecorated() {
        let stub = StubLedgerSource::new();
        let address = Address::new("0xa");
        stub.fail_address(
            address.clone(),
            SourceError::Transport {
                message: String::from("connection refused"),
            },
        )
        .await;

        let result = stub.transactions_for(&address).await;
        assert!(matches!(result, Err(SourceError::Transport { .. })));
    }

    #[tokio::test]
    async fn composed_fetch_is_all_or_nothing() {
        let stub = StubLedgerSource::new();
        let address = Address::new("0xa");
        let first = make_tx("0x0ce1", "0x101");
        let second = make_tx("0xf850", "0x101");
        stub.set_transactions(address.clone(), vec![first, second]).await;

        // One of the two referenced records disappears between the log
        // query and the hash lookup.
        stub.remove_record(&TxHash::new("0xf850")).await;

        let result = stub.transactions_for(&address).await;
        assert!(matches!(result, Err(SourceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn height_failure_clears_on_next_set() {
        let stub = StubLedgerSource::new();
        stub.fail_height(SourceError::Decode {
            message: String::from("not a hex quantity"),
        })
        .await;
        assert!(stub.current_height().await.is_err());

        stub.set_height(17).await;
        assert_eq!(stub.current_height().await.unwrap(), 17);
    }
}
