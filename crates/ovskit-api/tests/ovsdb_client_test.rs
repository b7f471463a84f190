#![allow(clippy::unwrap_used)]
// Integration tests for `OvsdbClient` against a scripted in-process server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value as Json, json};
use tokio::io::{DuplexStream, ReadHalf, WriteHalf};
use tokio_util::codec::{FramedRead, FramedWrite};
use uuid::Uuid;

use ovskit_api::{
    Condition, Error, JsonCodec, Operation, OvsdbClient, Row, Transport, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

struct Server {
    rx: FramedRead<ReadHalf<DuplexStream>, JsonCodec>,
    tx: FramedWrite<WriteHalf<DuplexStream>, JsonCodec>,
}

impl Server {
    async fn recv(&mut self) -> Json {
        self.rx.next().await.unwrap().unwrap()
    }

    async fn send(&mut self, message: Json) {
        self.tx.send(message).await.unwrap();
    }

    async fn reply(&mut self, request: &Json, result: Json) {
        self.send(json!({ "id": request["id"], "result": result, "error": null }))
            .await;
    }
}

fn setup_with(config: &TransportConfig) -> (Server, OvsdbClient) {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let (client_rx, client_tx) = tokio::io::split(client_io);
    let (server_rx, server_tx) = tokio::io::split(server_io);

    let client = OvsdbClient::from_io(client_rx, client_tx, config);
    let server = Server {
        rx: FramedRead::new(server_rx, JsonCodec),
        tx: FramedWrite::new(server_tx, JsonCodec),
    };
    (server, client)
}

fn setup() -> (Server, OvsdbClient) {
    setup_with(&TransportConfig::default())
}

// ── Transactions ────────────────────────────────────────────────────

#[tokio::test]
async fn test_transact_round_trip() {
    let (mut server, client) = setup();
    let id = Uuid::new_v4();

    let server_task = tokio::spawn(async move {
        let request = server.recv().await;
        assert_eq!(request["method"], "transact");
        assert_eq!(request["params"][0], "Open_vSwitch");
        assert_eq!(request["params"][1]["op"], "insert");
        assert_eq!(request["params"][1]["uuid-name"], "row_bridge0");
        server
            .reply(&request, json!([{ "uuid": ["uuid", id.to_string()] }]))
            .await;
        server
    });

    let results = client
        .transact(
            "Open_vSwitch",
            vec![Operation::insert(
                "Bridge",
                Row::new().with("name", "br0"),
                Some("row_bridge0".into()),
            )],
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].uuid, Some(id));
    server_task.await.unwrap();
}

#[tokio::test]
async fn test_rpc_error_is_reported() {
    let (mut server, client) = setup();

    tokio::spawn(async move {
        let request = server.recv().await;
        server
            .send(json!({ "id": request["id"], "result": null, "error": "unknown database" }))
            .await;
        // Keep the connection open until the client is done.
        let _ = server.rx.next().await;
    });

    let result = client
        .transact(
            "Nope",
            vec![Operation::select("Bridge", vec![Condition::eq("name", "br0")])],
        )
        .await;

    match result {
        Err(Error::Rpc { method, message }) => {
            assert_eq!(method, "transact");
            assert_eq!(message, "unknown database");
        }
        other => panic!("expected Rpc error, got: {other:?}"),
    }
}

// ── Server-initiated traffic ────────────────────────────────────────

#[tokio::test]
async fn test_echo_from_server_is_answered() {
    let (mut server, _client) = setup();

    server
        .send(json!({ "method": "echo", "params": ["ping"], "id": "echo" }))
        .await;
    let reply = server.recv().await;

    assert_eq!(reply["id"], "echo");
    assert_eq!(reply["result"], json!(["ping"]));
    assert!(reply["error"].is_null());
}

#[tokio::test]
async fn test_monitor_receives_initial_state_and_updates() {
    let (mut server, client) = setup();
    let bridge = Uuid::new_v4();

    let server_task = tokio::spawn(async move {
        let request = server.recv().await;
        assert_eq!(request["method"], "monitor");
        assert_eq!(request["params"][0], "Open_vSwitch");
        assert!(request["params"][2]["Bridge"].is_object());
        let monitor_id = request["params"][1].clone();

        server
            .reply(
                &request,
                json!({ "Bridge": { bridge.to_string(): { "new": { "name": "br0" } } } }),
            )
            .await;
        server
            .send(json!({
                "method": "update",
                "params": [monitor_id, { "Bridge": { bridge.to_string(): { "old": { "name": "br0" } } } }],
                "id": null
            }))
            .await;
        server
    });

    let mut monitor = client
        .monitor("Open_vSwitch", &["Bridge", "Port"])
        .await
        .unwrap();
    assert_eq!(monitor.initial.row_count(), 1);

    let update = monitor.updates.recv().await.unwrap();
    let change = &update.table("Bridge").unwrap()[&bridge];
    assert!(change.is_tombstone());

    // Hanging up ends the stream.
    drop(server_task.await.unwrap());
    assert!(monitor.updates.recv().await.is_none());
}

// ── Connection lifecycle ────────────────────────────────────────────

#[tokio::test]
async fn test_hangup_fails_pending_requests() {
    let (mut server, client) = setup();

    tokio::spawn(async move {
        let _request = server.recv().await;
        drop(server);
    });

    let result = client.echo().await;
    assert!(
        matches!(result, Err(Error::Disconnected)),
        "expected Disconnected, got: {result:?}"
    );
}

#[tokio::test]
async fn test_request_timeout() {
    let config = TransportConfig {
        timeout: Some(Duration::from_millis(50)),
    };
    let (_server, client) = setup_with(&config);

    let result = client.echo().await;
    assert!(
        matches!(result, Err(Error::Timeout { timeout_ms: 50 })),
        "expected Timeout, got: {result:?}"
    );
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let (_server, client) = setup();

    client.disconnect().await;
    client.disconnect().await;

    assert!(client.is_closed());
    assert!(matches!(client.echo().await, Err(Error::Disconnected)));
}
