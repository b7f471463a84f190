//! Clap derive structures for the `ovskit` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};
use ovskit_core::TransportKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// ovskit -- manage Open vSwitch topology from the command line
#[derive(Debug, Parser)]
#[command(
    name = "ovskit",
    version,
    about = "Manage Open vSwitch bridges, ports and interfaces over OVSDB",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Switch profile to use
    #[arg(long, short = 'p', env = "OVSKIT_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Socket family (overrides profile)
    #[arg(long, short = 't', env = "OVSKIT_TRANSPORT", global = true)]
    pub transport: Option<Transport>,

    /// host:port or socket path (overrides profile)
    #[arg(long, short = 'e', env = "OVSKIT_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Database name (overrides profile)
    #[arg(long, env = "OVSKIT_DATABASE", global = true)]
    pub database: Option<String>,

    /// Request timeout in seconds, 0 to wait forever (overrides profile)
    #[arg(long, env = "OVSKIT_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Transport {
    Tcp,
    Unix,
}

impl From<Transport> for TransportKind {
    fn from(t: Transport) -> Self {
        match t {
            Transport::Tcp => Self::Tcp,
            Transport::Unix => Self::Unix,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Plain,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage bridges
    #[command(alias = "br")]
    Bridge(BridgeArgs),

    /// Manage ports
    Port(PortArgs),

    /// Manage interfaces attached to ports
    #[command(alias = "iface")]
    Interface(InterfaceArgs),
}

// ── Bridge ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BridgeArgs {
    #[command(subcommand)]
    pub command: BridgeCommand,
}

#[derive(Debug, Subcommand)]
pub enum BridgeCommand {
    /// Create a bridge with its local internal port
    Add { name: String },

    /// Delete a bridge and everything on it
    #[command(alias = "rm")]
    Del { name: String },

    /// Print whether a bridge exists
    Exists { name: String },

    /// List the ports of a bridge
    Ports { name: String },

    /// Point a bridge at an OpenFlow controller
    SetController {
        name: String,
        /// Controller target, e.g. tcp:10.0.0.1:6653
        target: String,
    },
}

// ── Port ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PortArgs {
    #[command(subcommand)]
    pub command: PortCommand,
}

#[derive(Debug, Subcommand)]
pub enum PortCommand {
    /// Add an internal port
    AddInternal {
        bridge: String,
        port: String,
        /// VLAN tag (0 = untagged)
        #[arg(long, default_value_t = 0)]
        tag: u32,
    },

    /// Add a port for an existing kernel device
    AddVeth {
        bridge: String,
        port: String,
        /// VLAN tag (0 = untagged)
        #[arg(long, default_value_t = 0)]
        tag: u32,
    },

    /// Add one end of a patch pair
    AddPatch {
        bridge: String,
        port: String,
        /// Name of the interface at the other end
        #[arg(long)]
        peer: String,
    },

    /// Delete a port and its interfaces
    #[command(alias = "rm")]
    Del { bridge: String, port: String },

    /// Set (or clear, with 0) a port's VLAN tag
    SetTag {
        bridge: String,
        port: String,
        tag: u32,
    },

    /// Print whether a port exists
    Exists {
        port: String,
        /// Only count the port if it is on this bridge
        #[arg(long)]
        bridge: Option<String>,
    },

    /// Print a port's VLAN tag
    Tag { port: String },
}

// ── Interface ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct InterfaceArgs {
    #[command(subcommand)]
    pub command: InterfaceCommand,
}

#[derive(Debug, Subcommand)]
pub enum InterfaceCommand {
    /// Attach a new interface to a port
    Add {
        port: String,
        name: String,
        #[arg(long = "type", value_enum, default_value = "internal")]
        kind: InterfaceKind,
        /// Peer interface, required for patch and peer types
        #[arg(long, required_if_eq_any = [("kind", "patch"), ("kind", "peer")])]
        peer: Option<String>,
    },

    /// Detach and delete an interface
    #[command(alias = "rm")]
    Remove { port: String, uuid: uuid::Uuid },

    /// List the interfaces of a port
    #[command(alias = "ls")]
    List { port: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InterfaceKind {
    Internal,
    System,
    Patch,
    Peer,
}
