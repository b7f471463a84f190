// ── Query layer ──
//
// Topology questions answered from the object cache. Reads never take the
// mutation locks and never touch the network, so results reflect the last
// change the server pushed, not necessarily the last local mutation.

use std::sync::Arc;

use ovskit_api::Transport;
use uuid::Uuid;

use crate::engine::require_name;
use crate::error::CoreError;
use crate::model::{Bridge, Interface, Port};
use crate::switch::Switch;

impl<T: Transport> Switch<T> {
    pub fn bridge_exists(&self, name: &str) -> Result<bool, CoreError> {
        require_name("bridge", name)?;
        Ok(self.inner.store.bridge_by_name(name).is_some())
    }

    /// Names of every port on bridge `name`, sorted.
    pub fn find_all_ports_on_bridge(&self, name: &str) -> Result<Vec<String>, CoreError> {
        let bridge = self.cached_bridge(name)?;
        let mut names: Vec<String> = self
            .inner
            .store
            .ports_of(&bridge)
            .iter()
            .map(|p| p.name.clone())
            .collect();
        names.sort_unstable();
        Ok(names)
    }

    /// Whether `port` is a member of `bridge`. False when either is unknown.
    pub fn port_exists_on_bridge(&self, port: &str, bridge: &str) -> bool {
        let store = &self.inner.store;
        match (store.bridge_by_name(bridge), store.port_by_name(port)) {
            (Some(b), Some(p)) => b.ports.contains(&p.uuid),
            _ => false,
        }
    }

    pub fn port_exists(&self, name: &str) -> bool {
        self.inner.store.port_by_name(name).is_some()
    }

    /// VLAN tag of `port`; `None` when untagged.
    pub fn port_tag(&self, name: &str) -> Result<Option<u16>, CoreError> {
        Ok(self.cached_port(name)?.tag)
    }

    pub fn find_all_interface_uuids_on_port(&self, port: &str) -> Result<Vec<Uuid>, CoreError> {
        Ok(self.cached_port(port)?.interfaces.iter().copied().collect())
    }

    /// Interfaces of `port` that have reached the cache.
    pub fn interfaces_on_port(&self, port: &str) -> Result<Vec<Arc<Interface>>, CoreError> {
        let port = self.cached_port(port)?;
        Ok(self.inner.store.interfaces_of(&port))
    }

    fn cached_bridge(&self, name: &str) -> Result<Arc<Bridge>, CoreError> {
        self.inner
            .store
            .bridge_by_name(name)
            .ok_or_else(|| CoreError::BridgeNotFound { name: name.into() })
    }

    fn cached_port(&self, name: &str) -> Result<Arc<Port>, CoreError> {
        self.inner
            .store
            .port_by_name(name)
            .ok_or_else(|| CoreError::PortNotFound { name: name.into() })
    }
}
