// ── Transport boundary ──
//
// Everything the topology layer needs from a database connection:
// atomic transactions, a table monitor feeding a change stream, and a way
// to hang up. `OvsdbClient` is the production implementation.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::Error;
use crate::operation::{Operation, OperationResult};
use crate::update::TableUpdates;

pub const DEFAULT_TCP_HOST: &str = "127.0.0.1";
pub const DEFAULT_TCP_PORT: u16 = 6640;
pub const DEFAULT_UNIX_SOCKET: &str = "/var/run/openvswitch/db.sock";

// ── TransportKind ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Tcp,
    #[default]
    Unix,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => f.write_str("tcp"),
            Self::Unix => f.write_str("unix"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "unix" => Ok(Self::Unix),
            _ => Err(Error::InvalidEndpoint {
                endpoint: s.to_owned(),
                reason: "transport must be 'tcp' or 'unix'".into(),
            }),
        }
    }
}

// ── Endpoint ─────────────────────────────────────────────────────────

/// Where the database server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp { host: String, port: u16 },
    Unix(PathBuf),
}

impl Endpoint {
    /// Build an endpoint for `kind`, falling back to the conventional
    /// defaults when `endpoint` is absent or blank.
    pub fn resolve(kind: TransportKind, endpoint: Option<&str>) -> Result<Self, Error> {
        let endpoint = endpoint.map(str::trim).filter(|s| !s.is_empty());
        match (kind, endpoint) {
            (TransportKind::Tcp, None) => Ok(Self::Tcp {
                host: DEFAULT_TCP_HOST.into(),
                port: DEFAULT_TCP_PORT,
            }),
            (TransportKind::Unix, None) => Ok(Self::Unix(PathBuf::from(DEFAULT_UNIX_SOCKET))),
            (TransportKind::Tcp, Some(s)) => parse_tcp(s.strip_prefix("tcp:").unwrap_or(s), s),
            (TransportKind::Unix, Some(s)) => {
                let path = s.strip_prefix("unix:").unwrap_or(s);
                if path.is_empty() {
                    return Err(invalid(s, "empty socket path"));
                }
                Ok(Self::Unix(PathBuf::from(path)))
            }
        }
    }

    pub fn kind(&self) -> TransportKind {
        match self {
            Self::Tcp { .. } => TransportKind::Tcp,
            Self::Unix(_) => TransportKind::Unix,
        }
    }
}

/// Accepts `tcp:host:port`, `unix:/path`, a bare absolute path, or a bare
/// `host[:port]`.
impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        if s.starts_with("unix:") || s.starts_with('/') {
            Self::resolve(TransportKind::Unix, Some(s))
        } else {
            Self::resolve(TransportKind::Tcp, Some(s))
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp { host, port } if host.contains(':') => write!(f, "tcp:[{host}]:{port}"),
            Self::Tcp { host, port } => write!(f, "tcp:{host}:{port}"),
            Self::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

fn parse_tcp(addr: &str, original: &str) -> Result<Endpoint, Error> {
    // [v6]:port or [v6]
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| invalid(original, "unterminated IPv6 literal"))?;
        let port = match tail.strip_prefix(':') {
            Some(p) => parse_port(p, original)?,
            None if tail.is_empty() => DEFAULT_TCP_PORT,
            None => return Err(invalid(original, "unexpected text after IPv6 literal")),
        };
        return Ok(Endpoint::Tcp {
            host: host.to_owned(),
            port,
        });
    }

    let (host, port) = match addr.split_once(':') {
        Some((host, port)) => (host, parse_port(port, original)?),
        None => (addr, DEFAULT_TCP_PORT),
    };
    if host.is_empty() {
        return Err(invalid(original, "empty host"));
    }
    Ok(Endpoint::Tcp {
        host: host.to_owned(),
        port,
    })
}

fn parse_port(port: &str, original: &str) -> Result<u16, Error> {
    port.parse::<u16>()
        .map_err(|_| invalid(original, "port must be a number between 0 and 65535"))
}

fn invalid(endpoint: &str, reason: &str) -> Error {
    Error::InvalidEndpoint {
        endpoint: endpoint.to_owned(),
        reason: reason.to_owned(),
    }
}

// ── TransportConfig ──────────────────────────────────────────────────

/// Connection tuning shared by every transport.
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    /// Per-request reply deadline. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

// ── Transport trait ──────────────────────────────────────────────────

/// A live table monitor: the initial contents of the monitored tables and
/// a stream of subsequent changes. The stream ends when the connection
/// closes.
#[derive(Debug)]
pub struct Monitor {
    pub id: String,
    pub initial: TableUpdates,
    pub updates: mpsc::UnboundedReceiver<TableUpdates>,
}

/// Database connection used by the topology layer.
pub trait Transport: Send + Sync + 'static {
    /// Submit `operations` as one atomic transaction against `database`.
    ///
    /// Returns one result per operation the server answered, which may be
    /// fewer than submitted when the transaction aborted early.
    fn transact(
        &self,
        database: &str,
        operations: Vec<Operation>,
    ) -> impl Future<Output = Result<Vec<OperationResult>, Error>> + Send;

    /// Monitor every column of `tables`.
    fn monitor(
        &self,
        database: &str,
        tables: &[&str],
    ) -> impl Future<Output = Result<Monitor, Error>> + Send;

    /// Close the connection. Calling this more than once is harmless.
    fn disconnect(&self) -> impl Future<Output = ()> + Send;
}
