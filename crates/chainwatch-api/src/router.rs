//! Axum router construction.
//!
//! Assembles all routes into a single [`Router`] with CORS middleware
//! enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use chainwatch_core::LedgerSource;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the API server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /api/status` -- watcher status and uptime
/// - `GET /api/block/current` -- current block height
/// - `GET /api/subscriptions` -- list watched addresses
/// - `POST /api/subscriptions` -- watch a new address
/// - `GET /api/subscriptions/{address}/transactions` -- snapshot for one address
///
/// CORS is configured to allow any origin for development. In
/// production this should be restricted.
pub fn build_router<S: LedgerSource + 'static>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index::<S>))
        // REST API
        .route("/api/status", get(handlers::status::<S>))
        .route("/api/block/current", get(handlers::current_block::<S>))
        .route(
            "/api/subscriptions",
            get(handlers::list_subscriptions::<S>).post(handlers::subscribe::<S>),
        )
        .route(
            "/api/subscriptions/{address}/transactions",
            get(handlers::transactions::<S>),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
