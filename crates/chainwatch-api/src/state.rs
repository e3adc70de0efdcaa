//! Shared application state for the API server.
//!
//! [`AppState`] holds the watcher facade that every endpoint reads
//! through. The facade owns the in-memory subscription registry, so the
//! API layer carries no storage of its own.

use std::sync::Arc;

use chainwatch_core::{LedgerSource, Watcher};

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. Generic
/// over the ledger source so tests can drive the same router with a stub
/// source instead of a live JSON-RPC endpoint.
pub struct AppState<S> {
    /// The watcher facade backing every endpoint.
    pub watcher: Arc<Watcher<S>>,
}

impl<S: LedgerSource + 'static> AppState<S> {
    /// Create application state around an existing watcher.
    pub const fn new(watcher: Arc<Watcher<S>>) -> Self {
        Self { watcher }
    }
}
