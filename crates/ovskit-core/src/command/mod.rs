// ── Command API ──
//
// Every topology mutation is expressible as a `Command` value, so callers
// such as the CLI can build one from user input and route it through a
// single entry point.

use ovskit_api::Transport;
use uuid::Uuid;

use crate::engine::InterfaceSpec;
use crate::error::CoreError;
use crate::switch::Switch;

/// All write operations against the switch database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // ── Bridge operations ────────────────────────────────────────────
    CreateBridge {
        name: String,
    },
    DeleteBridge {
        name: String,
    },
    SetBridgeController {
        bridge: String,
        target: String,
    },

    // ── Port operations ──────────────────────────────────────────────
    CreateInternalPort {
        bridge: String,
        port: String,
        tag: u32,
    },
    CreateVethPort {
        bridge: String,
        port: String,
        tag: u32,
    },
    CreatePatchPort {
        bridge: String,
        port: String,
        peer: String,
    },
    DeletePort {
        bridge: String,
        port: String,
    },
    SetPortTag {
        bridge: String,
        port: String,
        tag: u32,
    },

    // ── Interface operations ─────────────────────────────────────────
    AddInterface {
        port: String,
        spec: InterfaceSpec,
    },
    RemoveInterface {
        port: String,
        interface: Uuid,
    },
}

impl Command {
    /// Short human-readable verb, used in logs and CLI output.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::CreateBridge { .. } => "create bridge",
            Self::DeleteBridge { .. } => "delete bridge",
            Self::SetBridgeController { .. } => "set bridge controller",
            Self::CreateInternalPort { .. } => "create internal port",
            Self::CreateVethPort { .. } => "create veth port",
            Self::CreatePatchPort { .. } => "create patch port",
            Self::DeletePort { .. } => "delete port",
            Self::SetPortTag { .. } => "set port tag",
            Self::AddInterface { .. } => "add interface",
            Self::RemoveInterface { .. } => "remove interface",
        }
    }
}

/// Result of a successfully executed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Ok,
    /// Key of the interface created by [`Command::AddInterface`].
    InterfaceAdded(Uuid),
}

impl<T: Transport> Switch<T> {
    /// Route a command to the matching mutation.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if !self.is_connected() {
            return Err(CoreError::Disconnected);
        }
        tracing::debug!(command = cmd.describe(), "executing command");

        match cmd {
            Command::CreateBridge { name } => {
                self.create_bridge(&name).await?;
            }
            Command::DeleteBridge { name } => {
                self.delete_bridge(&name).await?;
            }
            Command::SetBridgeController { bridge, target } => {
                self.update_bridge_controller(&bridge, &target).await?;
            }
            Command::CreateInternalPort { bridge, port, tag } => {
                self.create_internal_port(&bridge, &port, tag).await?;
            }
            Command::CreateVethPort { bridge, port, tag } => {
                self.create_veth_port(&bridge, &port, tag).await?;
            }
            Command::CreatePatchPort { bridge, port, peer } => {
                self.create_patch_port(&bridge, &port, &peer).await?;
            }
            Command::DeletePort { bridge, port } => {
                self.delete_port(&bridge, &port).await?;
            }
            Command::SetPortTag { bridge, port, tag } => {
                self.update_port_tag_by_name(&bridge, &port, tag).await?;
            }
            Command::AddInterface { port, spec } => {
                let uuid = self.add_interface_on_port(&port, &spec).await?;
                return Ok(CommandResult::InterfaceAdded(uuid));
            }
            Command::RemoveInterface { port, interface } => {
                self.remove_interface_from_port(&port, interface).await?;
            }
        }
        Ok(CommandResult::Ok)
    }
}
