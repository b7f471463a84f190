// ── Core error types ──
//
// Topology-level errors. Callers see which bridge/port/interface was at
// fault and which operation failed, never raw JSON-RPC envelopes. The
// `From<ovskit_api::Error>` impl translates transport failures.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input validation ─────────────────────────────────────────────
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Invalid VLAN tag {tag}: must be between 0 and 4095")]
    InvalidVlanTag { tag: u32 },

    // ── Topology state ───────────────────────────────────────────────
    #[error("Bridge not found: {name}")]
    BridgeNotFound { name: String },

    #[error("Port not found: {name}")]
    PortNotFound { name: String },

    #[error("Port {port} already exists on bridge {bridge}")]
    PortConflict { port: String, bridge: String },

    #[error("Interface {interface} is the last interface of port {port}")]
    LastInterface { port: String, interface: String },

    // ── Transactions ─────────────────────────────────────────────────
    #[error("Transaction '{action}' failed: {message}")]
    TransactionFailed { action: &'static str, message: String },

    #[error("Transaction '{action}' failed: connection to the database server is closed")]
    TransactionDisconnected { action: &'static str },

    #[error("Transaction '{action}' timed out after {timeout_ms}ms")]
    TransactionTimeout { action: &'static str, timeout_ms: u64 },

    #[error("Cannot decode {table} row {uuid}: column '{column}': {message}")]
    Decode {
        table: &'static str,
        uuid: String,
        column: String,
        message: String,
    },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Cannot connect to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    #[error("Not connected to the database server")]
    Disconnected,

    #[error("Database request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Wrapped transport errors ─────────────────────────────────────
    #[error("Database error: {message}")]
    Api { message: String },
}

impl CoreError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<ovskit_api::Error> for CoreError {
    fn from(err: ovskit_api::Error) -> Self {
        match err {
            ovskit_api::Error::Disconnected => CoreError::Disconnected,
            ovskit_api::Error::Timeout { timeout_ms } => CoreError::Timeout { timeout_ms },
            ovskit_api::Error::InvalidEndpoint { endpoint, reason } => CoreError::Config {
                message: format!("invalid endpoint '{endpoint}': {reason}"),
            },
            ovskit_api::Error::Io(e) => CoreError::ConnectionFailed {
                endpoint: "<current connection>".into(),
                reason: e.to_string(),
            },
            ovskit_api::Error::Rpc { method, message } => CoreError::Api {
                message: format!("{method}: {message}"),
            },
            other @ (ovskit_api::Error::Json(_)
            | ovskit_api::Error::Protocol(_)
            | ovskit_api::Error::Decode { .. }) => CoreError::Api {
                message: other.to_string(),
            },
        }
    }
}
