//! Command handlers, one module per resource.

mod bridge;
mod interface;
mod port;

use ovskit_core::Switch;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

pub async fn dispatch(cmd: Command, switch: &Switch, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Bridge(args) => bridge::handle(switch, args, global).await,
        Command::Port(args) => port::handle(switch, args, global).await,
        Command::Interface(args) => interface::handle(switch, args, global).await,
    }
}
