//! Interface command handlers.

use ovskit_core::{Command as CoreCommand, CommandResult, InterfaceSpec, Switch};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{GlobalOpts, InterfaceArgs, InterfaceCommand, InterfaceKind};
use crate::error::CliError;
use crate::output;

#[derive(Tabled, Serialize)]
struct InterfaceRow {
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "OF Port")]
    ofport: String,
    #[tabled(rename = "Peer")]
    peer: String,
}

pub async fn handle(
    switch: &Switch,
    args: InterfaceArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        InterfaceCommand::Add {
            port,
            name,
            kind,
            peer,
        } => {
            let peer = peer.unwrap_or_default();
            let spec = match kind {
                InterfaceKind::Internal => InterfaceSpec::internal(name),
                InterfaceKind::System => InterfaceSpec::system(name),
                InterfaceKind::Patch => InterfaceSpec::patch(name, peer),
                InterfaceKind::Peer => InterfaceSpec::peer(name, peer),
            };
            let result = switch
                .execute(CoreCommand::AddInterface { port, spec })
                .await?;
            if let CommandResult::InterfaceAdded(uuid) = result {
                output::print_output(&output::render_value(global.output, &uuid)?, global.quiet);
            }
        }
        InterfaceCommand::Remove { port, uuid } => {
            switch
                .execute(CoreCommand::RemoveInterface {
                    port: port.clone(),
                    interface: uuid,
                })
                .await?;
            output::done(&format!("Interface {uuid} removed from {port}"), global.quiet);
        }
        InterfaceCommand::List { port } => {
            let rows: Vec<InterfaceRow> = switch
                .interfaces_on_port(&port)?
                .iter()
                .map(|i| InterfaceRow {
                    uuid: i.uuid.to_string(),
                    name: i.name.clone(),
                    kind: i.kind.to_string(),
                    ofport: i.ofport.map(|p| p.to_string()).unwrap_or_default(),
                    peer: i.peer().unwrap_or_default().to_owned(),
                })
                .collect();
            let out = output::render_list(global.output, &rows, |r| r.uuid.clone())?;
            output::print_output(&out, global.quiet);
        }
    }
    Ok(())
}
