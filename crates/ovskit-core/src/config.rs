// ── Runtime connection configuration ──
//
// Describes *where* the database lives and how long to wait for it.
// Never touches disk: `ovskit-config` (or a test) builds a `SwitchConfig`
// and hands it in.

use std::time::Duration;

use ovskit_api::{Endpoint, TransportKind};

use crate::error::CoreError;

pub const DEFAULT_DATABASE: &str = "Open_vSwitch";

/// Configuration for a single switch connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchConfig {
    /// Socket family to dial.
    pub transport: TransportKind,
    /// `host:port` or socket path. `None` uses the transport's default.
    pub endpoint: Option<String>,
    /// Database name on the server.
    pub database: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Unix,
            endpoint: None,
            database: DEFAULT_DATABASE.into(),
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl SwitchConfig {
    /// Resolve the endpoint to dial, applying transport defaults.
    pub fn endpoint(&self) -> Result<Endpoint, CoreError> {
        Ok(Endpoint::resolve(self.transport, self.endpoint.as_deref())?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_dials_local_socket() {
        let config = SwitchConfig::default();
        assert_eq!(config.database, "Open_vSwitch");
        assert_eq!(
            config.endpoint().unwrap().to_string(),
            "unix:/var/run/openvswitch/db.sock"
        );
    }

    #[test]
    fn bad_endpoint_is_a_config_error() {
        let config = SwitchConfig {
            transport: TransportKind::Tcp,
            endpoint: Some("host:notaport".into()),
            ..SwitchConfig::default()
        };
        assert!(matches!(config.endpoint(), Err(CoreError::Config { .. })));
    }
}
