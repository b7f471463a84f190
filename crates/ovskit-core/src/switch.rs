// ── Switch handle ──
//
// Owns one database connection, the object cache it feeds, and the
// mutation locks. Cheap to clone and safe to share across tasks; all
// topology operations hang off this type (see `engine` and `query`).

use std::sync::Arc;

use ovskit_api::{
    Condition, Operation, OperationResult, OvsdbClient, Row, TableUpdates, Transport,
    TransportConfig,
};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SwitchConfig;
use crate::error::CoreError;
use crate::locks::ResourceLocks;
use crate::model::Table;
use crate::store::DataStore;

/// Handle to a connected switch database.
///
/// Created by [`connect`](Switch::connect) (or
/// [`with_transport`](Switch::with_transport)), torn down by
/// [`disconnect`](Switch::disconnect).
pub struct Switch<T: Transport = OvsdbClient> {
    pub(crate) inner: Arc<SwitchInner<T>>,
}

pub(crate) struct SwitchInner<T> {
    pub(crate) config: SwitchConfig,
    pub(crate) transport: T,
    pub(crate) store: Arc<DataStore>,
    pub(crate) locks: ResourceLocks,
    cancel: CancellationToken,
    consumer: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Transport> Clone for Switch<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Switch<OvsdbClient> {
    /// Dial the configured endpoint and bootstrap the cache.
    pub async fn connect(config: SwitchConfig) -> Result<Self, CoreError> {
        let endpoint = config.endpoint()?;
        let transport_config = TransportConfig {
            timeout: config.timeout,
        };

        let client = OvsdbClient::connect(&endpoint, &transport_config)
            .await
            .map_err(|e| match e {
                ovskit_api::Error::Timeout { timeout_ms } => CoreError::Timeout { timeout_ms },
                other => CoreError::ConnectionFailed {
                    endpoint: endpoint.to_string(),
                    reason: other.to_string(),
                },
            })?;

        Self::with_transport(client, config).await
    }

    /// Connect, run `f`, disconnect.
    ///
    /// For one-shot callers such as the CLI. The handle passed to `f` is
    /// disconnected afterwards whether `f` succeeds or not.
    pub async fn oneshot<F, Fut, R, E>(config: SwitchConfig, f: F) -> Result<R, E>
    where
        F: FnOnce(Self) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: From<CoreError>,
    {
        let switch = Self::connect(config).await?;
        let result = f(switch.clone()).await;
        switch.disconnect().await;
        result
    }
}

impl<T: Transport> Switch<T> {
    /// Bootstrap over an already-connected transport.
    ///
    /// Monitors the mirrored tables, applies the initial snapshot, then
    /// spawns the background consumer that keeps the cache current.
    pub async fn with_transport(transport: T, config: SwitchConfig) -> Result<Self, CoreError> {
        let tables = Table::MIRRORED.map(Table::name);
        let monitor = match transport.monitor(&config.database, &tables).await {
            Ok(monitor) => monitor,
            Err(e) => {
                transport.disconnect().await;
                return Err(e.into());
            }
        };

        let store = Arc::new(DataStore::new());
        store.apply_snapshot(&monitor.initial);

        let cancel = CancellationToken::new();
        let consumer = tokio::spawn(consume_changes(
            Arc::clone(&store),
            monitor.updates,
            cancel.clone(),
        ));

        info!(database = %config.database, monitor = %monitor.id, "switch connected");
        Ok(Self {
            inner: Arc::new(SwitchInner {
                config,
                transport,
                store,
                locks: ResourceLocks::new(),
                cancel,
                consumer: Mutex::new(Some(consumer)),
            }),
        })
    }

    /// Stop the cache consumer and release the transport. Idempotent.
    pub async fn disconnect(&self) {
        if self.inner.cancel.is_cancelled() {
            return;
        }
        self.inner.cancel.cancel();

        if let Some(handle) = self.inner.consumer.lock().await.take() {
            let _ = handle.await;
        }
        self.inner.transport.disconnect().await;
        info!("switch disconnected");
    }

    pub fn is_connected(&self) -> bool {
        !self.inner.cancel.is_cancelled()
    }

    pub fn config(&self) -> &SwitchConfig {
        &self.inner.config
    }

    /// The object cache. Eventually consistent with committed mutations.
    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    pub fn locks(&self) -> &ResourceLocks {
        &self.inner.locks
    }

    // ── Transaction plumbing ─────────────────────────────────────────

    /// Submit `operations` as one transaction on behalf of `action`.
    ///
    /// Any per-operation error, or fewer results than operations, fails
    /// the whole call. Nothing is retried.
    pub(crate) async fn transact(
        &self,
        action: &'static str,
        operations: Vec<Operation>,
    ) -> Result<Vec<OperationResult>, CoreError> {
        if !self.is_connected() {
            return Err(CoreError::TransactionDisconnected { action });
        }

        let expected = operations.len();
        debug!(action, operations = expected, "submitting transaction");
        let results = self
            .inner
            .transport
            .transact(&self.inner.config.database, operations)
            .await
            .map_err(|e| match e {
                ovskit_api::Error::Disconnected => CoreError::TransactionDisconnected { action },
                ovskit_api::Error::Timeout { timeout_ms } => {
                    CoreError::TransactionTimeout { action, timeout_ms }
                }
                other => CoreError::TransactionFailed {
                    action,
                    message: other.to_string(),
                },
            })?;

        check_results(action, expected, results)
    }

    /// Run several selects in one round trip; one row list per select.
    pub(crate) async fn select_batch(
        &self,
        action: &'static str,
        selects: Vec<(Table, Vec<Condition>)>,
    ) -> Result<Vec<Vec<Row>>, CoreError> {
        if selects.is_empty() {
            return Ok(Vec::new());
        }
        let operations = selects
            .into_iter()
            .map(|(table, conditions)| Operation::select(table.name(), conditions))
            .collect();
        let results = self.transact(action, operations).await?;
        Ok(results
            .into_iter()
            .map(|r| r.rows.unwrap_or_default())
            .collect())
    }

    /// Authoritative lookup of a named row, bypassing the cache.
    pub(crate) async fn find_row(
        &self,
        action: &'static str,
        table: Table,
        name: &str,
    ) -> Result<Option<Row>, CoreError> {
        let mut rows = self
            .select_batch(action, vec![(table, vec![Condition::eq("name", name)])])
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// Key of the root row: from the cache when loaded, else the server.
    pub(crate) async fn root_uuid(&self, action: &'static str) -> Result<Uuid, CoreError> {
        if let Some(root) = self.inner.store.root() {
            return Ok(root.uuid);
        }
        self.select_batch(action, vec![(Table::Root, Vec::new())])
            .await?
            .into_iter()
            .flatten()
            .find_map(|row| row.uuid())
            .ok_or_else(|| CoreError::TransactionFailed {
                action,
                message: "database has no Open_vSwitch row".into(),
            })
    }
}

fn check_results(
    action: &'static str,
    expected: usize,
    results: Vec<OperationResult>,
) -> Result<Vec<OperationResult>, CoreError> {
    if let Some((index, failed)) = results.iter().enumerate().find(|(_, r)| r.is_error()) {
        let mut message = failed.error.clone().unwrap_or_default();
        if let Some(details) = failed.details.as_deref().filter(|d| !d.is_empty()) {
            message.push_str(": ");
            message.push_str(details);
        }
        let message = if index < expected {
            format!("{message} (operation {} of {expected})", index + 1)
        } else {
            format!("{message} (at commit)")
        };
        warn!(action, %message, "transaction rejected");
        return Err(CoreError::TransactionFailed { action, message });
    }

    if results.len() < expected {
        return Err(CoreError::TransactionFailed {
            action,
            message: format!(
                "expected {expected} results, server returned {}",
                results.len()
            ),
        });
    }
    Ok(results)
}

// ── Background tasks ─────────────────────────────────────────────────

/// Drain the monitor's change stream into the cache.
async fn consume_changes(
    store: Arc<DataStore>,
    mut updates: mpsc::UnboundedReceiver<TableUpdates>,
    cancel: CancellationToken,
) {
    loop {
        let batch = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            batch = updates.recv() => batch,
        };
        let Some(batch) = batch else {
            warn!("change stream closed, cache is no longer updated");
            break;
        };
        store.apply_updates(&batch);
    }
    debug!("change consumer exiting");
}
