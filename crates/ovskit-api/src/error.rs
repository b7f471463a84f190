use thiserror::Error;

/// Top-level error type for the `ovskit-api` crate.
///
/// Covers every failure mode of the OVSDB transport: socket I/O, framing,
/// JSON-RPC envelopes, and value decoding. `ovskit-core` maps these into
/// topology-level diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// Socket I/O error (connection refused, broken pipe, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Endpoint string could not be parsed.
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Request timed out waiting for a reply.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The connection is closed (explicit disconnect or peer hangup).
    #[error("Connection to the database server is closed")]
    Disconnected,

    // ── Protocol ────────────────────────────────────────────────────
    /// Malformed JSON on the wire.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Well-formed JSON that violates the JSON-RPC / OVSDB envelope.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server answered a request with a JSON-RPC error.
    #[error("RPC error from server for '{method}': {message}")]
    Rpc { method: String, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// An OVSDB value did not have the expected shape.
    #[error("Cannot decode {expected} from {found}")]
    Decode { expected: &'static str, found: String },
}

impl Error {
    pub(crate) fn decode(expected: &'static str, found: &serde_json::Value) -> Self {
        Self::Decode {
            expected,
            found: found.to_string(),
        }
    }
}
