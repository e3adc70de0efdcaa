//! The wire-shaped transaction record.
//!
//! Fields mirror the JSON object returned by the ledger endpoint's
//! transaction lookup, camelCase on the wire. The record is stored and
//! served as-is: quantities stay in their hex string representation and
//! are never parsed or interpreted downstream.

use serde::{Deserialize, Serialize};

use crate::ids::{Address, TxHash};

/// One immutable ledger transaction as reported by the remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Hash of the block containing this transaction.
    pub block_hash: String,
    /// Number of the containing block, as a hex quantity string.
    pub block_number: String,
    /// Sender address.
    pub from: Address,
    /// Gas provided by the sender, as a hex quantity string.
    pub gas: String,
    /// Gas price in wei, as a hex quantity string.
    pub gas_price: String,
    /// Unique transaction hash.
    pub hash: TxHash,
    /// Call data payload.
    pub input: String,
    /// Sender nonce, as a hex quantity string.
    pub nonce: String,
    /// Recipient address. `None` for contract creations, which carry
    /// `null` on the wire.
    #[serde(default)]
    pub to: Option<Address>,
    /// Position of the transaction within its block, as a hex quantity
    /// string.
    pub transaction_index: String,
    /// Transferred value in wei, as a hex quantity string.
    pub value: String,
    /// ECDSA recovery id.
    pub v: String,
    /// ECDSA signature r component.
    pub r: String,
    /// ECDSA signature s component.
    pub s: String,
}
