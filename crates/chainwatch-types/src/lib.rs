//! Shared type definitions for the chainwatch workspace.
//!
//! This crate is the single source of truth for the types that cross
//! crate boundaries: ledger identifiers and the transaction record.
//! It is a leaf crate with no async or transport dependencies.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe string wrappers for ledger identifiers
//! - [`transaction`] -- The wire-shaped transaction record

pub mod ids;
pub mod transaction;

// Re-export all public types at crate root for convenience.
pub use ids::{Address, TxHash};
pub use transaction::Transaction;
