mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use ovskit_core::Switch;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let switch_config = config::build_switch_config(&cli.global)?;
    let Cli { global, command } = cli;

    tracing::debug!(command = ?command, "dispatching command");
    Switch::oneshot(switch_config, |switch| async move {
        commands::dispatch(command, &switch, &global).await
    })
    .await
}
