//! Integration tests for the JSON-RPC client against an in-process
//! stub endpoint.
//!
//! The stub mimics the remote ledger: a single POST route dispatching
//! on the envelope's method selector. Tests exercise the real `reqwest`
//! path end to end, including timeouts and malformed responses.

#![allow(clippy::unwrap_used)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chainwatch_core::{LedgerSource, SourceError};
use chainwatch_rpc::RpcClient;
use chainwatch_types::{Address, TxHash};
use serde_json::{Value, json};

const WATCHED: &str = "0xc94770007dda54cF92009BFF0dE90c06F603a09f";
const PARTIAL: &str = "0x70ddpartial";
const REJECTED: &str = "0x70ddrejected";

const FIRST_HASH: &str = "0x0ce1dd8f78210f50d37ce499682ad0cf5e5b89c3e0244e8ca09cdab8cbd8882b";
const SECOND_HASH: &str = "0xf85073cf394ba7e54f1f0ad22b0ab9a44a9b8503a1e4f03c4f0d274454b1bb77";
const MISSING_HASH: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

fn reply(id: Value, result: Value) -> Json<Value> {
    Json(json!({"jsonrpc": "2.0", "id": id, "result": result}))
}

fn transaction_json(hash: &str) -> Value {
    json!({
        "blockHash": "0xbeab9d2a3fc95590ec1805d32c1414fea780e49225d03d4a8f0f26de4db65a67",
        "blockNumber": "0x52a96e",
        "from": "0x101",
        "gas": "0x5208",
        "gasPrice": "0x4a817c800",
        "hash": hash,
        "input": "0x",
        "nonce": "0x15",
        "to": "0x102",
        "transactionIndex": "0x41",
        "value": "0xf3dbb76162000",
        "v": "0x25",
        "r": "0x1b5e176d927f8e9ab405058b2d2457392da3e20f328b16ddabcebc33eaac5fea",
        "s": "0x4ba69724e8f69de52f0125ad8b3c5c2cef33019bac3249e2c0a2192766d1721c"
    })
}

async fn ledger_handler(Json(request): Json<Value>) -> Json<Value> {
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or_default();

    match method {
        "eth_blockNumber" => reply(id, json!("0x11")),
        "eth_getLogs" => {
            let address = request
                .get("params")
                .and_then(|params| params.get(0))
                .and_then(|filter| filter.get("addresses"))
                .and_then(|addresses| addresses.get(0))
                .and_then(Value::as_str)
                .unwrap_or_default();

            match address {
                WATCHED => reply(
                    id,
                    json!([
                        {"address": WATCHED, "transactionHash": FIRST_HASH, "logIndex": "0x0"},
                        {"address": WATCHED, "transactionHash": SECOND_HASH, "logIndex": "0x1"},
                    ]),
                ),
                PARTIAL => reply(
                    id,
                    json!([
                        {"address": PARTIAL, "transactionHash": FIRST_HASH, "logIndex": "0x0"},
                        {"address": PARTIAL, "transactionHash": MISSING_HASH, "logIndex": "0x1"},
                    ]),
                ),
                REJECTED => Json(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": {"code": -32000, "message": "filter not permitted"}
                })),
                _ => reply(id, json!([])),
            }
        }
        "eth_getTransactionByHash" => {
            let hash = request
                .get("params")
                .and_then(|params| params.get(0))
                .and_then(Value::as_str)
                .unwrap_or_default();

            if hash == FIRST_HASH || hash == SECOND_HASH {
                reply(id, transaction_json(hash))
            } else {
                reply(id, Value::Null)
            }
        }
        _ => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": -32601, "message": "method not found"}
        })),
    }
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn ledger_client() -> RpcClient {
    let addr = serve(Router::new().route("/", post(ledger_handler))).await;
    RpcClient::new(format!("http://{addr}"), Duration::from_secs(2))
}

#[tokio::test]
async fn height_decodes_the_hex_quantity() {
    let client = ledger_client().await;
    assert_eq!(client.current_height().await.unwrap(), 17);
}

#[tokio::test]
async fn watched_address_resolves_two_transactions_in_log_order() {
    let client = ledger_client().await;
    let transactions = client.transactions_for(&Address::new(WATCHED)).await.unwrap();

    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions.first().unwrap().hash.as_str(), FIRST_HASH);
    assert_eq!(transactions.get(1).unwrap().hash.as_str(), SECOND_HASH);
    assert_eq!(transactions.first().unwrap().from, Address::new("0x101"));
    assert_eq!(
        transactions.first().unwrap().to,
        Some(Address::new("0x102"))
    );
}

#[tokio::test]
async fn unknown_address_has_no_transactions() {
    let client = ledger_client().await;
    let transactions = client
        .transactions_for(&Address::new("0xnobody"))
        .await
        .unwrap();
    assert!(transactions.is_empty());
}

#[tokio::test]
async fn unknown_hash_is_not_found() {
    let client = ledger_client().await;
    let result = client.transaction_by_hash(&TxHash::new("0xdead")).await;

    assert!(matches!(result, Err(SourceError::NotFound { .. })));
    if let Err(SourceError::NotFound { hash }) = result {
        assert_eq!(hash.as_str(), "0xdead");
    }
}

#[tokio::test]
async fn partial_resolution_fails_with_no_partial_result() {
    let client = ledger_client().await;
    let result = client.transactions_for(&Address::new(PARTIAL)).await;
    assert!(matches!(result, Err(SourceError::NotFound { .. })));
}

#[tokio::test]
async fn endpoint_error_payload_is_a_transport_failure() {
    let client = ledger_client().await;
    let result = client.transaction_hashes(&Address::new(REJECTED)).await;

    assert!(matches!(result, Err(SourceError::Transport { .. })));
    if let Err(SourceError::Transport { message }) = result {
        assert!(message.contains("filter not permitted"));
    }
}

#[tokio::test]
async fn non_success_status_is_a_transport_failure() {
    let addr = serve(Router::new().route(
        "/",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    ))
    .await;
    let client = RpcClient::new(format!("http://{addr}"), Duration::from_secs(2));

    let result = client.current_height().await;
    assert!(matches!(result, Err(SourceError::Transport { .. })));
}

#[tokio::test]
async fn unparseable_body_is_a_decode_failure() {
    let addr = serve(Router::new().route("/", post(|| async { "not json" }))).await;
    let client = RpcClient::new(format!("http://{addr}"), Duration::from_secs(2));

    let result = client.current_height().await;
    assert!(matches!(result, Err(SourceError::Decode { .. })));
}

#[tokio::test]
async fn unprefixed_height_is_a_decode_failure() {
    let addr = serve(Router::new().route(
        "/",
        post(|Json(request): Json<Value>| async move {
            let id = request.get("id").cloned().unwrap_or(Value::Null);
            reply(id, json!("17"))
        }),
    ))
    .await;
    let client = RpcClient::new(format!("http://{addr}"), Duration::from_secs(2));

    let result = client.current_height().await;
    assert!(matches!(result, Err(SourceError::Decode { .. })));
}

#[tokio::test]
async fn slow_endpoint_times_out_as_a_transport_failure() {
    let addr = serve(Router::new().route(
        "/",
        post(|Json(request): Json<Value>| async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            let id = request.get("id").cloned().unwrap_or(Value::Null);
            reply(id, json!("0x11"))
        }),
    ))
    .await;
    let client = RpcClient::new(format!("http://{addr}"), Duration::from_millis(50));

    let result = client.current_height().await;
    assert!(matches!(result, Err(SourceError::Transport { .. })));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_failure() {
    let client = RpcClient::new("http://127.0.0.1:1", Duration::from_millis(200));
    let result = client.current_height().await;
    assert!(matches!(result, Err(SourceError::Transport { .. })));
}
