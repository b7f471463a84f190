//! Shared configuration for ovskit tools.
//!
//! TOML profiles naming a switch database, layered with `OVSKIT_*`
//! environment variables, translated to `ovskit_core::SwitchConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ovskit_core::{DEFAULT_DATABASE, SwitchConfig, TransportKind};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' is not defined")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named switch profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("local".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// Request timeout in seconds; 0 waits indefinitely.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// Where one switch database lives.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// `tcp` or `unix`.
    #[serde(default)]
    pub transport: TransportKind,

    /// `host:port` for tcp, a socket path for unix. Omit for the default.
    pub endpoint: Option<String>,

    /// Database name; `Open_vSwitch` when omitted.
    pub database: Option<String>,

    /// Override the default timeout.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "ovskit", "ovskit").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("ovskit");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file is not an error.
///
/// Nested keys use a double underscore, e.g.
/// `OVSKIT_PROFILES__LAB__ENDPOINT=10.0.0.5:6640`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("OVSKIT_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Profile resolution ──────────────────────────────────────────────

impl Config {
    /// Pick the profile to use: `name`, else `default_profile`.
    ///
    /// An undefined default profile falls back to the local unix socket,
    /// so a fresh install works without any config file. A profile named
    /// explicitly must exist.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, Profile), ConfigError> {
        let explicit = name.is_some();
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("local")
            .to_owned();

        match self.profiles.get(&name) {
            Some(p) => Ok((name, p.clone())),
            None if explicit => Err(ConfigError::UnknownProfile { name }),
            None => Ok((name, Profile::default())),
        }
    }

    /// Resolve a profile straight to a `SwitchConfig`.
    pub fn switch_config(&self, name: Option<&str>) -> Result<SwitchConfig, ConfigError> {
        let (_, profile) = self.profile(name)?;
        profile_to_switch_config(&profile, &self.defaults)
    }
}

/// Build a `SwitchConfig` from a profile, validating its endpoint.
pub fn profile_to_switch_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<SwitchConfig, ConfigError> {
    let database = profile
        .database
        .clone()
        .unwrap_or_else(|| DEFAULT_DATABASE.into());
    if database.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "database".into(),
            reason: "must not be empty".into(),
        });
    }

    let timeout = match profile.timeout.unwrap_or(defaults.timeout) {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    let config = SwitchConfig {
        transport: profile.transport,
        endpoint: profile.endpoint.clone(),
        database,
        timeout,
    };
    config.endpoint().map_err(|e| ConfigError::Validation {
        field: "endpoint".into(),
        reason: e.to_string(),
    })?;
    Ok(config)
}
