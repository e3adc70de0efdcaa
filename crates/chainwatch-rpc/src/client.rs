//! The `reqwest`-backed ledger client.
//!
//! [`RpcClient`] is the production [`LedgerSource`]: each logical query
//! becomes one POST of a JSON-RPC envelope to the configured endpoint.
//! The client is stateless apart from `reqwest`'s connection pool, so
//! one instance is safely shared by the facade and the refresh loop
//! without locking. There is no retry: one logical query, one attempt.
//!
//! # Errors
//!
//! Failures map onto [`SourceError`] undecorated: connectivity loss,
//! timeouts, non-success statuses, and endpoint-reported error payloads
//! are transport failures; unparseable bodies and malformed quantities
//! are decode failures; a `null` transaction lookup result is the one
//! place `NotFound` arises.

use std::time::Duration;

use chainwatch_core::{LedgerSource, SourceError};
use chainwatch_types::{Address, Transaction, TxHash};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::protocol::{LogRecord, RpcRequest, RpcResponse, parse_hex_quantity};

/// Public endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://cloudflare-eth.com";

/// Per-call timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the remote ledger's JSON-RPC interface.
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl RpcClient {
    /// Create a client for `endpoint` with a per-call `timeout`.
    ///
    /// The timeout is mandatory and applies to every call this client
    /// issues; no query blocks indefinitely.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// The endpoint this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST one envelope and decode the response.
    ///
    /// Returns `Ok(None)` for a `null` result so each query decides
    /// what absence means.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> Result<Option<T>, SourceError> {
        let request = RpcRequest::new(method, params);
        debug!(method, id = request.id, "issuing ledger query");

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|error| SourceError::Transport {
                message: format!("{method} request failed: {error}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Transport {
                message: format!("{method} returned {status}"),
            });
        }

        let envelope: RpcResponse<T> =
            response.json().await.map_err(|error| SourceError::Decode {
                message: format!("{method} response parse failed: {error}"),
            })?;

        if let Some(error) = envelope.error {
            return Err(SourceError::Transport {
                message: format!(
                    "{method} rejected by endpoint: {} (code {})",
                    error.message, error.code
                ),
            });
        }

        Ok(envelope.result)
    }
}

impl LedgerSource for RpcClient {
    async fn current_height(&self) -> Result<u64, SourceError> {
        let raw: String = self
            .call("eth_blockNumber", json!([]))
            .await?
            .ok_or_else(|| SourceError::Decode {
                message: "height response carried no result".to_owned(),
            })?;
        parse_hex_quantity(&raw)
    }

    async fn transaction_hashes(&self, address: &Address) -> Result<Vec<TxHash>, SourceError> {
        let records: Vec<LogRecord> = self
            .call("eth_getLogs", json!([{ "addresses": [address] }]))
            .await?
            .ok_or_else(|| SourceError::Decode {
                message: "log response carried no result".to_owned(),
            })?;

        Ok(records
            .into_iter()
            .map(|record| record.transaction_hash)
            .collect())
    }

    async fn transaction_by_hash(&self, hash: &TxHash) -> Result<Transaction, SourceError> {
        self.call("eth_getTransactionByHash", json!([hash]))
            .await?
            .ok_or_else(|| SourceError::NotFound { hash: hash.clone() })
    }
}
