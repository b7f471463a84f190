//! Resolve the switch connection from config file, profile and flags.

use ovskit_config::{Config, profile_to_switch_config};
use ovskit_core::{SwitchConfig, TransportKind};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Config file + active profile, with command-line overrides on top.
pub fn build_switch_config(global: &GlobalOpts) -> Result<SwitchConfig, CliError> {
    let cfg = ovskit_config::load_config()?;
    resolve(&cfg, global)
}

fn resolve(cfg: &Config, global: &GlobalOpts) -> Result<SwitchConfig, CliError> {
    let (name, mut profile) = cfg.profile(global.profile.as_deref())?;
    tracing::debug!(profile = %name, "using profile");

    if let Some(transport) = global.transport {
        profile.transport = TransportKind::from(transport);
    }
    if let Some(endpoint) = &global.endpoint {
        profile.endpoint = Some(endpoint.clone());
    }
    if let Some(database) = &global.database {
        profile.database = Some(database.clone());
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    Ok(profile_to_switch_config(&profile, &cfg.defaults)?)
}
