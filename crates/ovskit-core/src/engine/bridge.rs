use ovskit_api::{Condition, Mutation, Operation, Row, Transport, Value};
use tracing::{debug, info};

use super::{InterfaceSpec, port_insert, require_name, row_references, row_uuid};
use crate::error::CoreError;
use crate::locks::ResourceKind;
use crate::model::{Table, VlanTag};
use crate::resolver::NamedRefs;
use crate::switch::Switch;

impl<T: Transport> Switch<T> {
    /// Create bridge `name` with its local internal port, and attach it to
    /// the root row. A bridge that already exists is left untouched.
    pub async fn create_bridge(&self, name: &str) -> Result<(), CoreError> {
        const ACTION: &str = "create bridge";
        require_name("bridge", name)?;
        let _guard = self.inner.locks.acquire(ResourceKind::Bridge).await;

        if self.find_row(ACTION, Table::Bridge, name).await?.is_some() {
            debug!(bridge = name, "bridge already exists");
            return Ok(());
        }
        let root = self.root_uuid(ACTION).await?;

        let mut refs = NamedRefs::new();
        let interface = refs.new_symbol(Table::Interface);
        let port = refs.new_symbol(Table::Port);
        let bridge = refs.new_symbol(Table::Bridge);

        let operations = vec![
            InterfaceSpec::internal(name).insert(&interface),
            port_insert(name, &interface, VlanTag::untagged(), &port),
            Operation::insert(
                Table::Bridge.name(),
                Row::new()
                    .with("name", name)
                    .with("ports", port.reference_set())
                    .with("stp_enable", false),
                Some(bridge.uuid_name()),
            ),
            Operation::mutate(
                Table::Root.name(),
                vec![Condition::uuid(root)],
                vec![Mutation::insert("bridges", bridge.reference_set())],
            ),
        ];
        self.transact(ACTION, operations).await?;

        info!(bridge = name, "bridge created");
        Ok(())
    }

    /// Delete bridge `name` together with every port and interface it
    /// owns. Deleting an absent bridge succeeds.
    pub async fn delete_bridge(&self, name: &str) -> Result<(), CoreError> {
        const ACTION: &str = "delete bridge";
        require_name("bridge", name)?;
        let _guard = self.inner.locks.acquire(ResourceKind::Bridge).await;

        let Some(row) = self.find_row(ACTION, Table::Bridge, name).await? else {
            debug!(bridge = name, "bridge already absent");
            return Ok(());
        };
        let bridge = row_uuid(Table::Bridge, &row)?;
        let ports = row_references(Table::Bridge, &row, "ports")?;

        let port_rows = self
            .select_batch(
                ACTION,
                ports
                    .iter()
                    .map(|uuid| (Table::Port, vec![Condition::uuid(*uuid)]))
                    .collect(),
            )
            .await?;
        let mut interfaces = Vec::new();
        for row in port_rows.iter().flatten() {
            interfaces.extend(row_references(Table::Port, row, "interfaces")?);
        }
        let root = self.root_uuid(ACTION).await?;

        let mut operations: Vec<Operation> = interfaces
            .iter()
            .map(|uuid| Operation::delete(Table::Interface.name(), vec![Condition::uuid(*uuid)]))
            .collect();
        operations.extend(
            ports
                .iter()
                .map(|uuid| Operation::delete(Table::Port.name(), vec![Condition::uuid(*uuid)])),
        );
        operations.push(Operation::delete(
            Table::Bridge.name(),
            vec![Condition::uuid(bridge)],
        ));
        operations.push(Operation::mutate(
            Table::Root.name(),
            vec![Condition::uuid(root)],
            vec![Mutation::delete("bridges", Value::set([bridge]))],
        ));
        self.transact(ACTION, operations).await?;

        info!(
            bridge = name,
            ports = ports.len(),
            interfaces = interfaces.len(),
            "bridge deleted"
        );
        Ok(())
    }

    /// Point bridge `name` at the OpenFlow controller `target`
    /// (e.g. `tcp:10.0.0.1:6653`).
    pub async fn update_bridge_controller(&self, name: &str, target: &str) -> Result<(), CoreError> {
        const ACTION: &str = "update bridge controller";
        require_name("bridge", name)?;
        if target.trim().is_empty() {
            return Err(CoreError::invalid("controller target must not be empty"));
        }
        let _guard = self.inner.locks.acquire(ResourceKind::Bridge).await;

        let row = self
            .find_row(ACTION, Table::Bridge, name)
            .await?
            .ok_or_else(|| CoreError::BridgeNotFound { name: name.into() })?;
        let bridge = row_uuid(Table::Bridge, &row)?;

        let mut refs = NamedRefs::new();
        let controller = refs.new_symbol(Table::Controller);
        let operations = vec![
            Operation::insert(
                Table::Controller.name(),
                Row::new().with("target", target),
                Some(controller.uuid_name()),
            ),
            Operation::update(
                Table::Bridge.name(),
                vec![Condition::uuid(bridge)],
                Row::new().with("controller", controller.reference()),
            ),
            Operation::mutate(
                Table::Bridge.name(),
                vec![Condition::uuid(bridge)],
                vec![Mutation::insert("controller", controller.reference_set())],
            ),
        ];
        self.transact(ACTION, operations).await?;

        info!(bridge = name, target, "bridge controller updated");
        Ok(())
    }
}
