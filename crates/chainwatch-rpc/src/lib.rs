//! JSON-RPC ledger query client.
//!
//! Translates the three logical ledger queries (current height, hashes
//! by address, record by hash) into JSON-RPC 2.0 exchanges against an
//! Ethereum-style endpoint, and implements
//! [`chainwatch_core::LedgerSource`] so the watcher core never sees the
//! wire format.
//!
//! # Modules
//!
//! - [`client`] -- [`RpcClient`], the `reqwest`-backed implementation.
//! - `protocol` -- request/response envelope shapes and hex-quantity
//!   parsing (crate-internal).
//!
//! [`RpcClient`]: client::RpcClient

pub mod client;
mod protocol;

pub use client::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT, RpcClient};
