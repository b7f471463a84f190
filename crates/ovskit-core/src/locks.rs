// ── Mutation serialization ──
//
// One async mutex per resource kind, held by a mutation for its whole
// duration (precondition check through transaction reply). Mutations of
// different kinds never wait on each other. Cache reads never take these.

use std::fmt;

use strum::{Display, EnumString};
use tokio::sync::{Mutex, MutexGuard};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ResourceKind {
    Bridge,
    Port,
    Interface,
}

#[derive(Default)]
pub struct ResourceLocks {
    bridge: Mutex<()>,
    port: Mutex<()>,
    interface: Mutex<()>,
}

impl fmt::Debug for ResourceLocks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceLocks")
            .field("bridge_held", &self.is_held(ResourceKind::Bridge))
            .field("port_held", &self.is_held(ResourceKind::Port))
            .field("interface_held", &self.is_held(ResourceKind::Interface))
            .finish()
    }
}

impl ResourceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive mutation rights on `kind`.
    pub async fn acquire(&self, kind: ResourceKind) -> MutexGuard<'_, ()> {
        let guard = self.lock(kind).lock().await;
        trace!(%kind, "mutation lock acquired");
        guard
    }

    /// Whether a mutation of `kind` is in flight.
    pub fn is_held(&self, kind: ResourceKind) -> bool {
        self.lock(kind).try_lock().is_err()
    }

    fn lock(&self, kind: ResourceKind) -> &Mutex<()> {
        match kind {
            ResourceKind::Bridge => &self.bridge,
            ResourceKind::Port => &self.port,
            ResourceKind::Interface => &self.interface,
        }
    }
}
