//! Async OVSDB JSON-RPC client.
//!
//! One connection, two background tasks. The writer drains an unbounded
//! queue of outgoing messages into the socket; the reader decodes incoming
//! messages and routes them: replies complete the pending request with the
//! same id, `update` notifications go to the matching monitor channel, and
//! server `echo` probes are answered in place.
//!
//! When the socket closes (or [`OvsdbClient::disconnect`] is called) every
//! pending request fails with [`Error::Disconnected`] and every monitor
//! stream ends.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value as Json, json};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::codec::JsonCodec;
use crate::error::Error;
use crate::operation::{Operation, OperationResult};
use crate::rpc::{self, Message};
use crate::transport::{Endpoint, Monitor, Transport, TransportConfig};
use crate::update::TableUpdates;

struct PendingCall {
    method: &'static str,
    reply: oneshot::Sender<Result<Json, Error>>,
}

struct Shared {
    outbound: mpsc::UnboundedSender<Json>,
    pending: DashMap<u64, PendingCall>,
    monitors: DashMap<String, mpsc::UnboundedSender<TableUpdates>>,
    next_id: AtomicU64,
    cancel: CancellationToken,
    timeout: Option<Duration>,
}

/// Handle to an OVSDB connection. Cheap to clone; clones share the socket.
#[derive(Clone)]
pub struct OvsdbClient {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for OvsdbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OvsdbClient")
            .field("pending", &self.shared.pending.len())
            .field("monitors", &self.shared.monitors.len())
            .field("closed", &self.shared.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl OvsdbClient {
    /// Open a connection to `endpoint` and start the background tasks.
    pub async fn connect(endpoint: &Endpoint, config: &TransportConfig) -> Result<Self, Error> {
        info!(%endpoint, "connecting to OVSDB");
        let connect = async {
            match endpoint {
                Endpoint::Tcp { host, port } => {
                    let stream = tokio::net::TcpStream::connect((host.as_str(), *port)).await?;
                    stream.set_nodelay(true)?;
                    let (reader, writer) = stream.into_split();
                    Ok::<_, Error>(Self::from_io(reader, writer, config))
                }
                #[cfg(unix)]
                Endpoint::Unix(path) => {
                    let stream = tokio::net::UnixStream::connect(path).await?;
                    let (reader, writer) = stream.into_split();
                    Ok::<_, Error>(Self::from_io(reader, writer, config))
                }
                #[cfg(not(unix))]
                Endpoint::Unix(_) => Err(Error::InvalidEndpoint {
                    endpoint: endpoint.to_string(),
                    reason: "unix sockets are not supported on this platform".into(),
                }),
            }
        };

        match config.timeout {
            Some(limit) => tokio::time::timeout(limit, connect)
                .await
                .map_err(|_| Error::Timeout {
                    timeout_ms: millis(limit),
                })?,
            None => connect.await,
        }
    }

    /// Run the client over an already-established byte stream.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_io<R, W>(reader: R, writer: W, config: &TransportConfig) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            outbound,
            pending: DashMap::new(),
            monitors: DashMap::new(),
            next_id: AtomicU64::new(0),
            cancel: CancellationToken::new(),
            timeout: config.timeout,
        });

        tokio::spawn(write_loop(writer, outbound_rx, shared.cancel.clone()));
        tokio::spawn(read_loop(reader, Arc::clone(&shared)));

        Self { shared }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// Issue a request and wait for its reply.
    pub async fn call(&self, method: &'static str, params: Json) -> Result<Json, Error> {
        let shared = &self.shared;
        if shared.cancel.is_cancelled() {
            return Err(Error::Disconnected);
        }

        let id = shared.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply, rx) = oneshot::channel();
        shared.pending.insert(id, PendingCall { method, reply });

        // The reader may have torn down between the check above and insert.
        if shared.cancel.is_cancelled() {
            shared.pending.remove(&id);
            return Err(Error::Disconnected);
        }

        trace!(id, method, "sending request");
        if shared.outbound.send(rpc::request(method, params, id)).is_err() {
            shared.pending.remove(&id);
            return Err(Error::Disconnected);
        }

        let outcome = match shared.timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    shared.pending.remove(&id);
                    return Err(Error::Timeout {
                        timeout_ms: millis(limit),
                    });
                }
            },
            None => rx.await,
        };

        outcome.map_err(|_| Error::Disconnected)?
    }

    /// Liveness probe.
    pub async fn echo(&self) -> Result<(), Error> {
        self.call("echo", json!([])).await.map(|_| ())
    }

    fn close(&self) {
        self.shared.shutdown();
    }
}

impl Transport for OvsdbClient {
    async fn transact(
        &self,
        database: &str,
        operations: Vec<Operation>,
    ) -> Result<Vec<OperationResult>, Error> {
        let mut params = Vec::with_capacity(operations.len() + 1);
        params.push(Json::String(database.to_owned()));
        for op in &operations {
            params.push(serde_json::to_value(op)?);
        }

        debug!(database, operations = operations.len(), "transact");
        let reply = self.call("transact", Json::Array(params)).await?;
        OperationResult::list_from_json(reply)
    }

    async fn monitor(&self, database: &str, tables: &[&str]) -> Result<Monitor, Error> {
        let n = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let id = format!("ovskit-monitor-{n}");

        let requests: serde_json::Map<String, Json> = tables
            .iter()
            .map(|table| ((*table).to_owned(), json!({})))
            .collect();

        // Register before asking so no update can race the reply.
        let (tx, updates) = mpsc::unbounded_channel();
        self.shared.monitors.insert(id.clone(), tx);

        let reply = self
            .call("monitor", json!([database, id, requests]))
            .await
            .inspect_err(|_| {
                self.shared.monitors.remove(&id);
            })?;
        let initial = TableUpdates::from_json(reply)?;

        info!(
            database,
            monitor = %id,
            rows = initial.row_count(),
            "monitor established"
        );
        Ok(Monitor {
            id,
            initial,
            updates,
        })
    }

    async fn disconnect(&self) {
        if !self.is_closed() {
            info!("disconnecting from OVSDB");
        }
        self.close();
    }
}

impl Shared {
    fn dispatch(&self, json: Json) {
        let message = match Message::from_json(json) {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "discarding malformed message");
                return;
            }
        };

        match message {
            Message::Response { id, result, error } => self.complete(&id, result, &error),
            Message::Notification { method, params } if method == "update" => {
                self.route_update(params);
            }
            Message::Request { method, params, id } if method == "echo" => {
                trace!("answering echo");
                if self.outbound.send(rpc::response(id, params)).is_err() {
                    debug!("echo reply dropped, writer is gone");
                }
            }
            Message::Request { method, id, .. } => {
                debug!(%method, "rejecting unsupported server request");
                let reply = json!({ "result": null, "error": "unknown method", "id": id });
                let _ = self.outbound.send(reply);
            }
            Message::Notification { method, .. } => {
                debug!(%method, "ignoring notification");
            }
        }
    }

    fn complete(&self, id: &Json, result: Json, error: &Json) {
        let Some(id) = id.as_u64() else {
            debug!(%id, "reply with foreign id");
            return;
        };
        let Some((_, call)) = self.pending.remove(&id) else {
            debug!(id, "reply for unknown or expired request");
            return;
        };

        let outcome = if error.is_null() {
            Ok(result)
        } else {
            Err(Error::Rpc {
                method: call.method.to_owned(),
                message: rpc::error_message(error),
            })
        };
        // The caller may have timed out and gone away.
        let _ = call.reply.send(outcome);
    }

    fn route_update(&self, params: Json) {
        let Json::Array(mut params) = params else {
            warn!("update notification without params array");
            return;
        };
        if params.len() != 2 {
            warn!(len = params.len(), "update notification with wrong arity");
            return;
        }
        let payload = params.pop().unwrap_or_default();
        let monitor_id = params.pop().unwrap_or_default();

        let Some(monitor_id) = monitor_id.as_str() else {
            debug!(%monitor_id, "update for a monitor we did not create");
            return;
        };
        let updates = match TableUpdates::from_json(payload) {
            Ok(u) => u,
            Err(e) => {
                warn!(error = %e, monitor = monitor_id, "undecodable table update");
                return;
            }
        };

        let delivered = self
            .monitors
            .get(monitor_id)
            .is_some_and(|tx| tx.send(updates).is_ok());
        if !delivered {
            debug!(monitor = monitor_id, "no live subscriber for update");
            self.monitors.remove(monitor_id);
        }
    }

    fn shutdown(&self) {
        self.cancel.cancel();

        let ids: Vec<u64> = self.pending.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            if let Some((_, call)) = self.pending.remove(&id) {
                let _ = call.reply.send(Err(Error::Disconnected));
            }
        }
        self.monitors.clear();
    }
}

async fn write_loop<W>(
    writer: W,
    mut outbound: mpsc::UnboundedReceiver<Json>,
    cancel: CancellationToken,
) where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut sink = FramedWrite::new(writer, JsonCodec);
    loop {
        let message = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            message = outbound.recv() => message,
        };
        let Some(message) = message else { break };
        if let Err(e) = sink.send(message).await {
            warn!(error = %e, "write to OVSDB failed");
            cancel.cancel();
            break;
        }
    }
    debug!("writer task exiting");
}

async fn read_loop<R>(reader: R, shared: Arc<Shared>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut frames = FramedRead::new(reader, JsonCodec);
    loop {
        let frame = tokio::select! {
            biased;
            () = shared.cancel.cancelled() => break,
            frame = frames.next() => frame,
        };
        match frame {
            Some(Ok(message)) => shared.dispatch(message),
            Some(Err(e)) => {
                warn!(error = %e, "read from OVSDB failed");
                break;
            }
            None => {
                info!("OVSDB server closed the connection");
                break;
            }
        }
    }
    shared.shutdown();
    debug!("reader task exiting");
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
