//! Port command handlers.

use ovskit_core::{Command as CoreCommand, Switch};

use crate::cli::{GlobalOpts, PortArgs, PortCommand};
use crate::error::CliError;
use crate::output;

pub async fn handle(switch: &Switch, args: PortArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let command = match args.command {
        PortCommand::AddInternal { bridge, port, tag } => {
            CoreCommand::CreateInternalPort { bridge, port, tag }
        }
        PortCommand::AddVeth { bridge, port, tag } => {
            CoreCommand::CreateVethPort { bridge, port, tag }
        }
        PortCommand::AddPatch { bridge, port, peer } => {
            CoreCommand::CreatePatchPort { bridge, port, peer }
        }
        PortCommand::Del { bridge, port } => CoreCommand::DeletePort { bridge, port },
        PortCommand::SetTag { bridge, port, tag } => CoreCommand::SetPortTag { bridge, port, tag },

        // Queries answer from the cache and return early.
        PortCommand::Exists { port, bridge } => {
            let exists = match bridge {
                Some(bridge) => switch.port_exists_on_bridge(&port, &bridge),
                None => switch.port_exists(&port),
            };
            output::print_output(&output::render_value(global.output, &exists)?, global.quiet);
            return Ok(());
        }
        PortCommand::Tag { port } => {
            let tag = switch.port_tag(&port)?.unwrap_or(0);
            output::print_output(&output::render_value(global.output, &tag)?, global.quiet);
            return Ok(());
        }
    };

    let verb = command.describe();
    switch.execute(command).await?;
    output::done(&format!("{verb}: done"), global.quiet);
    Ok(())
}
