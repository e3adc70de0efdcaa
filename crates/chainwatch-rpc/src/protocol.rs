//! JSON-RPC 2.0 envelope shapes and quantity parsing.
//!
//! Kept separate from the client so the wire format stays in one place.
//! Responses carry either a `result` or an `error` member; a `null`
//! result decodes as `None` and each query decides what absence means.

use chainwatch_core::SourceError;
use chainwatch_types::TxHash;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Protocol version tag carried by every request.
const JSONRPC_VERSION: &str = "2.0";

/// One request envelope.
#[derive(Debug, Serialize)]
pub(crate) struct RpcRequest {
    /// Protocol version tag, always `"2.0"`.
    jsonrpc: &'static str,
    /// Method selector.
    method: &'static str,
    /// Positional parameters.
    params: serde_json::Value,
    /// Per-call correlation id. Random, independent per call; collisions
    /// are accepted since HTTP already pairs each response with its
    /// request.
    pub(crate) id: u32,
}

impl RpcRequest {
    /// Build an envelope for `method` with a fresh correlation id.
    pub(crate) fn new(method: &'static str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
            id: rand::rng().random(),
        }
    }
}

/// One response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse<T> {
    /// The result payload, absent on `null` or when the call failed.
    pub(crate) result: Option<T>,
    /// The error payload, present when the endpoint rejected the call.
    pub(crate) error: Option<RpcErrorPayload>,
}

/// Error payload reported by the endpoint. Carried as an opaque message;
/// the code is never interpreted.
#[derive(Debug, Deserialize)]
pub(crate) struct RpcErrorPayload {
    /// Numeric error code.
    pub(crate) code: i64,
    /// Human-readable message.
    pub(crate) message: String,
}

/// One record returned by the find-logs query. Only the containing
/// transaction's hash is consumed; everything else is ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct LogRecord {
    /// Hash of the transaction that produced the log entry.
    #[serde(rename = "transactionHash")]
    pub(crate) transaction_hash: TxHash,
}

/// Parse a `0x`-prefixed hexadecimal quantity string.
///
/// Quantities on this protocol always carry the prefix, so its absence
/// is a decode failure rather than a fallback to another base.
pub(crate) fn parse_hex_quantity(raw: &str) -> Result<u64, SourceError> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| SourceError::Decode {
            message: format!("quantity {raw:?} is missing its 0x prefix"),
        })?;

    u64::from_str_radix(digits, 16).map_err(|error| SourceError::Decode {
        message: format!("quantity {raw:?} is not hexadecimal: {error}"),
    })
}
