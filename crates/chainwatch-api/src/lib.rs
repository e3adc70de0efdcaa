//! HTTP API server for the transaction watcher.
//!
//! This crate provides an Axum HTTP server exposing the watcher facade
//! over REST:
//!
//! - **Read endpoints** for the current block height, the subscription
//!   list, and per-address transaction snapshots
//! - **One write endpoint** to subscribe an address
//! - **Minimal HTML status page** (`GET /`)
//!
//! The surface is pull-only: callers re-read snapshots, nothing is
//! pushed. Reads go straight to the in-memory registry through the
//! facade and never wait on a refresh in flight.
//!
//! # Architecture
//!
//! Handlers are generic over the ledger source behind the watcher, so
//! the same router serves the JSON-RPC client in production and a stub
//! source in tests.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
