//! Concurrency-safe subscription store.
//!
//! The registry is the only shared mutable structure in the system: a
//! map from address to its most recent transaction snapshot, plus a
//! little bookkeeping per entry. One registry-wide reader/writer lock
//! serializes access, so a concurrent subscribe and snapshot update can
//! never interleave into a torn state.
//!
//! Snapshots are replaced wholesale on every update, never merged: a
//! transaction that disappears from the latest query result is no
//! longer visible to readers. Addresses are never removed; there is no
//! unsubscribe.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chainwatch_types::{Address, Transaction};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

/// Bookkeeping for one subscribed address.
#[derive(Debug, Clone)]
struct SubscriptionEntry {
    /// The latest snapshot. Empty until the first successful refresh.
    snapshot: Vec<Transaction>,
    /// When the address was registered.
    subscribed_at: DateTime<Utc>,
    /// When the snapshot was last replaced, if ever.
    last_refreshed_at: Option<DateTime<Utc>>,
}

/// Point-in-time view of one subscription, for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionInfo {
    /// The subscribed address.
    pub address: Address,
    /// Number of transactions in the current snapshot.
    pub transaction_count: usize,
    /// When the address was registered.
    pub subscribed_at: DateTime<Utc>,
    /// When the snapshot was last replaced. `None` while every refresh
    /// so far has failed or none has run yet.
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

/// Map from address to its latest transaction snapshot.
///
/// All operations lock the whole map. Reads never block on in-flight
/// remote queries; they return whatever is currently stored.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    entries: RwLock<BTreeMap<Address, SubscriptionEntry>>,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `address` with an empty snapshot.
    ///
    /// Returns `true` if the address was newly registered, `false` with
    /// no state change if it was already present. Exactly one of any
    /// number of concurrent calls for the same address wins.
    pub async fn subscribe(&self, address: Address) -> bool {
        let mut entries = self.entries.write().await;
        match entries.entry(address) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(SubscriptionEntry {
                    snapshot: Vec::new(),
                    subscribed_at: Utc::now(),
                    last_refreshed_at: None,
                });
                true
            }
        }
    }

    /// Replace the stored snapshot for `address` if it is registered.
    ///
    /// An unregistered address is left untouched: there is nothing to
    /// update, and racing a subscription that never happened is not an
    /// error.
    pub async fn update_snapshot(&self, address: &Address, transactions: Vec<Transaction>) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(address) {
            entry.snapshot = transactions;
            entry.last_refreshed_at = Some(Utc::now());
        } else {
            debug!(address = %address, "discarding snapshot for unregistered address");
        }
    }

    /// Current snapshot for `address`.
    ///
    /// Unregistered addresses read as empty; there is no error channel
    /// on this path.
    pub async fn snapshot_for(&self, address: &Address) -> Vec<Transaction> {
        let entries = self.entries.read().await;
        entries
            .get(address)
            .map(|entry| entry.snapshot.clone())
            .unwrap_or_default()
    }

    /// Point-in-time enumeration of every registered address.
    ///
    /// Subscriptions added after this call returns are picked up by the
    /// next enumeration, not this one.
    pub async fn all_addresses(&self) -> Vec<Address> {
        let entries = self.entries.read().await;
        entries.keys().cloned().collect()
    }

    /// Whether `address` is currently registered.
    pub async fn is_subscribed(&self, address: &Address) -> bool {
        let entries = self.entries.read().await;
        entries.contains_key(address)
    }

    /// Number of registered addresses.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.len()
    }

    /// Whether no address is registered.
    pub async fn is_empty(&self) -> bool {
        let entries = self.entries.read().await;
        entries.is_empty()
    }

    /// Status view over all subscriptions, in address order.
    pub async fn subscription_info(&self) -> Vec<SubscriptionInfo> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .map(|(address, entry)| SubscriptionInfo {
                address: address.clone(),
                transaction_count: entry.snapshot.len(),
                subscribed_at: entry.subscribed_at,
                last_refreshed_at: entry.last_refreshed_at,
            })
            .collect()
    }
}
