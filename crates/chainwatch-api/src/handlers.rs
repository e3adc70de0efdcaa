//! REST API endpoint handlers.
//!
//! All handlers go through the shared [`AppState`] to the watcher
//! facade. Reads are served from the in-memory registry and never wait
//! on a refresh cycle in flight.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/status` | Watcher status and uptime |
//! | `GET` | `/api/block/current` | Current ledger block height |
//! | `GET` | `/api/subscriptions` | List watched addresses |
//! | `POST` | `/api/subscriptions` | Watch a new address |
//! | `GET` | `/api/subscriptions/{address}/transactions` | Transaction snapshot for one address |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use chainwatch_core::LedgerSource;
use chainwatch_types::Address;
use chrono::Utc;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/subscriptions`.
#[derive(Debug, serde::Deserialize)]
pub struct SubscribeRequest {
    /// The address to watch. Opaque to the server, stored verbatim.
    pub address: String,
}

/// Response body for `POST /api/subscriptions`.
#[derive(Debug, serde::Serialize)]
struct SubscribeResponse {
    /// The address as it was stored.
    address: Address,
    /// `true` when the address was newly registered, `false` when it
    /// was already being watched.
    subscribed: bool,
}

/// Response body for `GET /api/block/current`.
#[derive(Debug, serde::Serialize)]
struct HeightResponse {
    /// The latest block height, or `-1` when the ledger endpoint could
    /// not be reached.
    height: i64,
}

/// Response body for `GET /api/status`.
#[derive(Debug, serde::Serialize)]
struct StatusResponse {
    /// When the watcher was created (RFC 3339).
    started_at: String,
    /// Seconds elapsed since the watcher was created.
    uptime_seconds: u64,
    /// Number of addresses currently watched.
    subscriptions: u64,
    /// Seconds between background refresh cycles.
    refresh_interval_secs: u64,
    /// Whether the background refresh loop is running.
    refreshing: bool,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing server status and API links.
pub async fn index<S: LedgerSource + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> impl IntoResponse {
    let subscriptions = state.watcher.subscription_count().await;
    let refreshing = if state.watcher.is_refreshing().await {
        "RUNNING"
    } else {
        "STOPPED"
    };
    let interval_secs = state.watcher.refresh_interval().as_secs();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Chainwatch</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        code {{ color: #7ee787; }}
        .status {{ color: #3fb950; font-weight: bold; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Chainwatch</h1>
    <p class="subtitle">Ledger transaction watcher</p>

    <p>Refresh loop: <span class="status">{refreshing}</span></p>

    <div>
        <div class="metric">
            <div class="label">Watched addresses</div>
            <div class="value">{subscriptions}</div>
        </div>
        <div class="metric">
            <div class="label">Refresh interval</div>
            <div class="value">{interval_secs}s</div>
        </div>
    </div>

    <hr>

    <h2>API Endpoints</h2>
    <ul>
        <li><code>GET</code> <a href="/api/status">/api/status</a> -- Watcher status and uptime</li>
        <li><code>GET</code> <a href="/api/block/current">/api/block/current</a> -- Current block height</li>
        <li><code>GET</code> <a href="/api/subscriptions">/api/subscriptions</a> -- List watched addresses</li>
        <li><code>POST</code> /api/subscriptions -- Watch a new address</li>
        <li><code>GET</code> /api/subscriptions/{{address}}/transactions -- Snapshot for one address</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/status -- watcher status
// ---------------------------------------------------------------------------

/// Return the watcher status including uptime, subscription count, and
/// whether the refresh loop is running.
pub async fn status<S: LedgerSource + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let elapsed = Utc::now()
        .signed_duration_since(state.watcher.started_at())
        .num_seconds();
    let uptime_seconds = u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX);

    let subscriptions = u64::try_from(state.watcher.subscription_count().await).unwrap_or(u64::MAX);

    Ok(Json(StatusResponse {
        started_at: state.watcher.started_at().to_rfc3339(),
        uptime_seconds,
        subscriptions,
        refresh_interval_secs: state.watcher.refresh_interval().as_secs(),
        refreshing: state.watcher.is_refreshing().await,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/block/current -- current block height
// ---------------------------------------------------------------------------

/// Return the latest block height reported by the ledger endpoint.
///
/// When the endpoint cannot be reached the height is `-1`; the request
/// itself still succeeds so dashboards can poll without special-casing
/// upstream outages.
pub async fn current_block<S: LedgerSource + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let height = state.watcher.current_block().await;

    Ok(Json(HeightResponse { height }))
}

// ---------------------------------------------------------------------------
// GET /api/subscriptions -- list watched addresses
// ---------------------------------------------------------------------------

/// List every watched address with its snapshot size and refresh
/// timestamps.
pub async fn list_subscriptions<S: LedgerSource + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let subscriptions = state.watcher.subscriptions().await;

    Ok(Json(serde_json::json!({
        "count": subscriptions.len(),
        "subscriptions": subscriptions,
    })))
}

// ---------------------------------------------------------------------------
// POST /api/subscriptions -- watch a new address
// ---------------------------------------------------------------------------

/// Register an address for watching.
///
/// Returns `201 Created` when the address was newly registered and an
/// initial refresh was attempted, or `409 Conflict` when the address
/// was already being watched. A failed initial refresh still counts as
/// a successful registration; the snapshot fills in on a later cycle.
pub async fn subscribe<S: LedgerSource + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<SubscribeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.address.trim().is_empty() {
        return Err(ApiError::InvalidRequest(
            "address must not be empty".to_owned(),
        ));
    }

    let address = Address::from(body.address);
    let subscribed = state.watcher.subscribe(address.clone()).await;

    let code = if subscribed {
        StatusCode::CREATED
    } else {
        StatusCode::CONFLICT
    };

    Ok((code, Json(SubscribeResponse { address, subscribed })))
}

// ---------------------------------------------------------------------------
// GET /api/subscriptions/{address}/transactions -- snapshot for one address
// ---------------------------------------------------------------------------

/// Return the stored transaction snapshot for an address.
///
/// Addresses that were never subscribed yield an empty list, the same
/// as subscribed addresses whose refresh has not found anything yet.
pub async fn transactions<S: LedgerSource + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let address = Address::from(address);
    let transactions = state.watcher.transactions(&address).await;

    Ok(Json(serde_json::json!({
        "address": address,
        "count": transactions.len(),
        "transactions": transactions,
    })))
}
