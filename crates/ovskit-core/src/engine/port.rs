use ovskit_api::{Condition, Mutation, Operation, Row, Transport, Value};
use tracing::{debug, info};

use super::{InterfaceSpec, port_insert, require_name, row_name, row_references, row_uuid};
use crate::error::CoreError;
use crate::locks::ResourceKind;
use crate::model::{Table, VlanTag};
use crate::resolver::NamedRefs;
use crate::switch::Switch;

impl<T: Transport> Switch<T> {
    /// Add an internal port (with a same-named internal interface) to
    /// `bridge`. `tag` 0 leaves the port untagged.
    pub async fn create_internal_port(
        &self,
        bridge: &str,
        port: &str,
        tag: u32,
    ) -> Result<(), CoreError> {
        let tag = VlanTag::new(tag)?;
        self.create_port("create internal port", bridge, port, &InterfaceSpec::internal(port), tag)
            .await
    }

    /// Add a port whose interface is the existing kernel device `port`.
    pub async fn create_veth_port(&self, bridge: &str, port: &str, tag: u32) -> Result<(), CoreError> {
        let tag = VlanTag::new(tag)?;
        self.create_port("create veth port", bridge, port, &InterfaceSpec::system(port), tag)
            .await
    }

    /// Add one end of a patch pair; `peer` names the interface at the far
    /// end. Patch ports are never tagged.
    pub async fn create_patch_port(&self, bridge: &str, port: &str, peer: &str) -> Result<(), CoreError> {
        self.create_port(
            "create patch port",
            bridge,
            port,
            &InterfaceSpec::patch(port, peer),
            VlanTag::untagged(),
        )
        .await
    }

    async fn create_port(
        &self,
        action: &'static str,
        bridge: &str,
        port: &str,
        interface: &InterfaceSpec,
        tag: VlanTag,
    ) -> Result<(), CoreError> {
        require_name("bridge", bridge)?;
        require_name("port", port)?;
        interface.validate()?;
        let _guard = self.inner.locks.acquire(ResourceKind::Port).await;

        let (bridge_row, port_row) = self.bridge_and_port(action, bridge, port).await?;
        let bridge_row = bridge_row.ok_or_else(|| CoreError::BridgeNotFound {
            name: bridge.into(),
        })?;
        let bridge_uuid = row_uuid(Table::Bridge, &bridge_row)?;

        if let Some(existing) = port_row {
            let existing = row_uuid(Table::Port, &existing)?;
            if row_references(Table::Bridge, &bridge_row, "ports")?.contains(&existing) {
                debug!(bridge, port, "port already on bridge");
                return Ok(());
            }
            let owner = self.owning_bridge_name(action, existing).await?;
            return Err(CoreError::PortConflict {
                port: port.into(),
                bridge: owner.unwrap_or_else(|| "<unknown>".into()),
            });
        }

        let mut refs = NamedRefs::new();
        let interface_ref = refs.new_symbol(Table::Interface);
        let port_ref = refs.new_symbol(Table::Port);
        let operations = vec![
            interface.insert(&interface_ref),
            port_insert(port, &interface_ref, tag, &port_ref),
            Operation::mutate(
                Table::Bridge.name(),
                vec![Condition::uuid(bridge_uuid)],
                vec![Mutation::insert("ports", port_ref.reference_set())],
            ),
        ];
        self.transact(action, operations).await?;

        info!(bridge, port, kind = %interface.kind, %tag, "port created");
        Ok(())
    }

    /// Remove `port` from its bridge and delete it with its interfaces.
    /// Deleting an absent port succeeds.
    pub async fn delete_port(&self, bridge: &str, port: &str) -> Result<(), CoreError> {
        const ACTION: &str = "delete port";
        require_name("bridge", bridge)?;
        require_name("port", port)?;
        let _guard = self.inner.locks.acquire(ResourceKind::Port).await;

        let Some(row) = self.find_row(ACTION, Table::Port, port).await? else {
            debug!(bridge, port, "port already absent");
            return Ok(());
        };
        let port_uuid = row_uuid(Table::Port, &row)?;
        let interfaces = row_references(Table::Port, &row, "interfaces")?;

        let mut operations = vec![
            Operation::mutate(
                Table::Bridge.name(),
                vec![Condition::includes("ports", Value::set([port_uuid]))],
                vec![Mutation::delete("ports", Value::set([port_uuid]))],
            ),
            Operation::delete(Table::Port.name(), vec![Condition::uuid(port_uuid)]),
        ];
        operations.extend(
            interfaces
                .iter()
                .map(|uuid| Operation::delete(Table::Interface.name(), vec![Condition::uuid(*uuid)])),
        );
        self.transact(ACTION, operations).await?;

        info!(bridge, port, "port deleted");
        Ok(())
    }

    /// Set the VLAN tag of `port` on `bridge`; 0 clears it.
    pub async fn update_port_tag_by_name(
        &self,
        bridge: &str,
        port: &str,
        tag: u32,
    ) -> Result<(), CoreError> {
        const ACTION: &str = "update port tag";
        let tag = VlanTag::new(tag)?;
        require_name("bridge", bridge)?;
        require_name("port", port)?;
        let _guard = self.inner.locks.acquire(ResourceKind::Port).await;

        let (bridge_row, port_row) = self.bridge_and_port(ACTION, bridge, port).await?;
        let bridge_row = bridge_row.ok_or_else(|| CoreError::BridgeNotFound {
            name: bridge.into(),
        })?;
        let not_found = || CoreError::PortNotFound { name: port.into() };
        let port_row = port_row.ok_or_else(not_found)?;
        let port_uuid = row_uuid(Table::Port, &port_row)?;
        if !row_references(Table::Bridge, &bridge_row, "ports")?.contains(&port_uuid) {
            return Err(not_found());
        }

        let operations = vec![Operation::update(
            Table::Port.name(),
            vec![Condition::uuid(port_uuid)],
            Row::new().with("tag", tag.to_value()),
        )];
        self.transact(ACTION, operations).await?;

        info!(bridge, port, %tag, "port tag updated");
        Ok(())
    }

    /// Both rows in one round trip.
    async fn bridge_and_port(
        &self,
        action: &'static str,
        bridge: &str,
        port: &str,
    ) -> Result<(Option<Row>, Option<Row>), CoreError> {
        let mut results = self
            .select_batch(
                action,
                vec![
                    (Table::Bridge, vec![Condition::eq("name", bridge)]),
                    (Table::Port, vec![Condition::eq("name", port)]),
                ],
            )
            .await?
            .into_iter()
            .map(|rows| rows.into_iter().next());
        let bridge_row = results.next().flatten();
        let port_row = results.next().flatten();
        Ok((bridge_row, port_row))
    }

    async fn owning_bridge_name(
        &self,
        action: &'static str,
        port: uuid::Uuid,
    ) -> Result<Option<String>, CoreError> {
        let rows = self
            .select_batch(
                action,
                vec![(
                    Table::Bridge,
                    vec![Condition::includes("ports", Value::set([port]))],
                )],
            )
            .await?;
        Ok(rows
            .iter()
            .flatten()
            .find_map(|row| row_name(Table::Bridge, row)))
    }
}
