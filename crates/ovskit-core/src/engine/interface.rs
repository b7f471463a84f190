use ovskit_api::{Condition, Mutation, Operation, Transport, Value};
use tracing::{debug, info};
use uuid::Uuid;

use super::{InterfaceSpec, require_name, row_references, row_uuid};
use crate::error::CoreError;
use crate::locks::ResourceKind;
use crate::model::Table;
use crate::resolver::NamedRefs;
use crate::switch::Switch;

impl<T: Transport> Switch<T> {
    /// Attach a new interface described by `spec` to `port`. Returns the
    /// key the server assigned to the interface.
    pub async fn add_interface_on_port(
        &self,
        port: &str,
        spec: &InterfaceSpec,
    ) -> Result<Uuid, CoreError> {
        const ACTION: &str = "add interface";
        require_name("port", port)?;
        spec.validate()?;
        let _guard = self.inner.locks.acquire(ResourceKind::Interface).await;

        let row = self
            .find_row(ACTION, Table::Port, port)
            .await?
            .ok_or_else(|| CoreError::PortNotFound { name: port.into() })?;
        let port_uuid = row_uuid(Table::Port, &row)?;

        let mut refs = NamedRefs::new();
        let interface = refs.new_symbol(Table::Interface);
        let operations = vec![
            spec.insert(&interface),
            Operation::mutate(
                Table::Port.name(),
                vec![Condition::uuid(port_uuid)],
                vec![Mutation::insert("interfaces", interface.reference_set())],
            ),
        ];
        let results = self.transact(ACTION, operations).await?;
        let uuid = results
            .first()
            .and_then(|r| r.uuid)
            .ok_or_else(|| CoreError::TransactionFailed {
                action: ACTION,
                message: "server did not return the new interface key".into(),
            })?;

        info!(port, interface = %spec.name, kind = %spec.kind, %uuid, "interface added");
        Ok(uuid)
    }

    pub async fn add_internal_interface_on_port(
        &self,
        port: &str,
        interface: &str,
    ) -> Result<Uuid, CoreError> {
        self.add_interface_on_port(port, &InterfaceSpec::internal(interface))
            .await
    }

    pub async fn add_veth_interface_on_port(
        &self,
        port: &str,
        interface: &str,
    ) -> Result<Uuid, CoreError> {
        self.add_interface_on_port(port, &InterfaceSpec::system(interface))
            .await
    }

    /// Attach a `peer` interface pointing at `peer`.
    pub async fn add_peer_interface_on_port(
        &self,
        port: &str,
        interface: &str,
        peer: &str,
    ) -> Result<Uuid, CoreError> {
        self.add_interface_on_port(port, &InterfaceSpec::peer(interface, peer))
            .await
    }

    /// Detach and delete interface `interface` from `port`. A port keeps at
    /// least one interface; use `delete_port` to remove the last one.
    pub async fn remove_interface_from_port(
        &self,
        port: &str,
        interface: Uuid,
    ) -> Result<(), CoreError> {
        const ACTION: &str = "remove interface";
        require_name("port", port)?;
        let _guard = self.inner.locks.acquire(ResourceKind::Interface).await;

        let row = self
            .find_row(ACTION, Table::Port, port)
            .await?
            .ok_or_else(|| CoreError::PortNotFound { name: port.into() })?;
        let port_uuid = row_uuid(Table::Port, &row)?;
        let interfaces = row_references(Table::Port, &row, "interfaces")?;

        if !interfaces.contains(&interface) {
            debug!(port, %interface, "interface not on port");
            return Ok(());
        }
        if interfaces.len() == 1 {
            return Err(CoreError::LastInterface {
                port: port.into(),
                interface: interface.to_string(),
            });
        }

        let operations = vec![
            Operation::mutate(
                Table::Port.name(),
                vec![Condition::uuid(port_uuid)],
                vec![Mutation::delete("interfaces", Value::set([interface]))],
            ),
            Operation::delete(Table::Interface.name(), vec![Condition::uuid(interface)]),
        ];
        self.transact(ACTION, operations).await?;

        info!(port, %interface, "interface removed");
        Ok(())
    }
}
