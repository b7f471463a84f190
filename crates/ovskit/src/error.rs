//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use ovskit_config::ConfigError;
use ovskit_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the switch database at {endpoint}")]
    #[diagnostic(
        code(ovskit::connection_failed),
        help(
            "Check that ovsdb-server is running and reachable.\n\
             Reason: {reason}\n\
             Try: ovskit --transport tcp --endpoint 127.0.0.1:6640 bridge exists br0"
        )
    )]
    ConnectionFailed { endpoint: String, reason: String },

    #[error("Request timed out after {millis}ms")]
    #[diagnostic(
        code(ovskit::timeout),
        help("Increase the timeout with --timeout or check the server's load.")
    )]
    Timeout { millis: u64 },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(ovskit::not_found),
        help("Run: ovskit {list_command}")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{message}")]
    #[diagnostic(code(ovskit::conflict))]
    Conflict { message: String },

    // ── Database ─────────────────────────────────────────────────────
    #[error("Transaction '{action}' failed")]
    #[diagnostic(code(ovskit::transaction_failed), help("{message}"))]
    Transaction { action: String, message: String },

    #[error("Database error: {message}")]
    #[diagnostic(code(ovskit::database))]
    Database { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(ovskit::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(ovskit::profile_not_found),
        help("Define it under [profiles.{name}] in {path}")
    )]
    ProfileNotFound { name: String, path: String },

    #[error(transparent)]
    #[diagnostic(code(ovskit::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Cannot render output: {0}")]
    #[diagnostic(code(ovskit::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { endpoint, reason } => {
                CliError::ConnectionFailed { endpoint, reason }
            }
            CoreError::Disconnected => CliError::ConnectionFailed {
                endpoint: "(current connection)".into(),
                reason: "the connection was closed".into(),
            },
            CoreError::Timeout { timeout_ms } => CliError::Timeout { millis: timeout_ms },
            err @ CoreError::TransactionDisconnected { .. } => CliError::ConnectionFailed {
                endpoint: "(current connection)".into(),
                reason: err.to_string(),
            },
            CoreError::TransactionTimeout { timeout_ms, .. } => {
                CliError::Timeout { millis: timeout_ms }
            }

            CoreError::BridgeNotFound { name } => CliError::NotFound {
                resource_type: "bridge".into(),
                identifier: name,
                list_command: "bridge exists <name>".into(),
            },
            CoreError::PortNotFound { name } => CliError::NotFound {
                resource_type: "port".into(),
                identifier: name,
                list_command: "bridge ports <bridge>".into(),
            },

            err @ (CoreError::PortConflict { .. } | CoreError::LastInterface { .. }) => {
                CliError::Conflict {
                    message: err.to_string(),
                }
            }

            CoreError::InvalidVlanTag { tag } => CliError::Validation {
                field: "tag".into(),
                reason: format!("{tag} is outside 0..=4095"),
            },
            CoreError::InvalidInput { message } => CliError::Validation {
                field: "argument".into(),
                reason: message,
            },
            CoreError::Config { message } => CliError::Validation {
                field: "endpoint".into(),
                reason: message,
            },

            CoreError::TransactionFailed { action, message } => CliError::Transaction {
                action: action.into(),
                message,
            },
            err @ (CoreError::Decode { .. } | CoreError::Api { .. }) => CliError::Database {
                message: err.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                path: ovskit_config::config_path().display().to_string(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(Box::new(other)),
        }
    }
}
