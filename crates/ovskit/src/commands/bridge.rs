//! Bridge command handlers.

use ovskit_core::{Command as CoreCommand, CoreError, Switch};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{BridgeArgs, BridgeCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Tabled, Serialize)]
struct PortRow {
    #[tabled(rename = "Port")]
    name: String,
    #[tabled(rename = "Tag")]
    tag: String,
}

pub async fn handle(switch: &Switch, args: BridgeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        BridgeCommand::Add { name } => {
            switch
                .execute(CoreCommand::CreateBridge { name: name.clone() })
                .await?;
            output::done(&format!("Bridge {name} ready"), global.quiet);
        }
        BridgeCommand::Del { name } => {
            switch
                .execute(CoreCommand::DeleteBridge { name: name.clone() })
                .await?;
            output::done(&format!("Bridge {name} deleted"), global.quiet);
        }
        BridgeCommand::SetController { name, target } => {
            switch
                .execute(CoreCommand::SetBridgeController {
                    bridge: name.clone(),
                    target: target.clone(),
                })
                .await?;
            output::done(&format!("Bridge {name} now uses controller {target}"), global.quiet);
        }
        BridgeCommand::Exists { name } => {
            let exists = switch.bridge_exists(&name)?;
            output::print_output(&output::render_value(global.output, &exists)?, global.quiet);
        }
        BridgeCommand::Ports { name } => {
            let rows = port_rows(switch.find_all_ports_on_bridge(&name)?, |port| {
                switch.port_tag(port)
            })?;
            let out = output::render_list(global.output, &rows, |r| r.name.clone())?;
            output::print_output(&out, global.quiet);
        }
    }
    Ok(())
}

/// One table row per port, with its VLAN tag. A failed tag lookup fails
/// the listing.
fn port_rows<F>(ports: Vec<String>, tag_of: F) -> Result<Vec<PortRow>, CoreError>
where
    F: Fn(&str) -> Result<Option<u16>, CoreError>,
{
    ports
        .into_iter()
        .map(|port| {
            let tag = tag_of(&port)?;
            Ok(PortRow {
                tag: tag.map(|t| t.to_string()).unwrap_or_default(),
                name: port,
            })
        })
        .collect()
}
