//! Clap derive structures for the `vrcsync` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use clap::{Args, Parser, Subcommand, ValueEnum};

use vrcsync_core::{DhwMode, ZoneMode};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vrcsync -- watch and control multiMATIC heating systems
#[derive(Debug, Parser)]
#[command(
    name = "vrcsync",
    version,
    about = "Watch and control multiMATIC heating systems from the command line",
    long_about = "Talks to the multiMATIC cloud on behalf of one account.\n\n\
        Reads facility snapshots, streams field changes as they are polled,\n\
        and sends debounced setpoint and mode writes.",
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
    /// Account profile to use
    #[arg(long, short = 'p', env = "VRCSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API root (overrides profile)
    #[arg(long, env = "VRCSYNC_API_URL", global = true, hide_env = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "VRCSYNC_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept invalid TLS certificates (intercepting proxies only)
    #[arg(long, short = 'k', env = "VRCSYNC_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "VRCSYNC_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the facilities of the account
    #[command(alias = "ls")]
    Facilities,

    /// Fetch a fresh snapshot of one facility
    #[command(alias = "snap")]
    Snapshot(SnapshotArgs),

    /// Poll continuously and print field changes
    Watch(WatchArgs),

    /// Change a setpoint or operating mode
    Set(SetArgs),

    /// Manage configuration profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SNAPSHOT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// Facility serial number
    pub serial: String,

    /// Print only the value at this dot-separated path
    /// (e.g. "system.status.outside_temperature")
    #[arg(long)]
    pub path: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Facility serial number (defaults to every facility)
    #[arg(long, short = 's')]
    pub serial: Option<String>,

    /// Field paths to watch; may be repeated
    #[arg(long = "path", required = true)]
    pub paths: Vec<String>,

    /// Poll interval in seconds (minimum 30)
    #[arg(long)]
    pub interval: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SET
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SetArgs {
    #[command(subcommand)]
    pub command: SetCommand,
}

#[derive(Debug, Subcommand)]
pub enum SetCommand {
    /// Set the day setpoint of a heating zone (5-30 °C)
    ZoneSetpoint {
        /// Facility serial number
        serial: String,
        /// Zone id (e.g. "Control_ZO1")
        zone: String,
        /// Temperature in °C
        temperature: f64,
    },

    /// Set the setback (night) temperature of a heating zone (5-30 °C)
    ZoneSetback {
        serial: String,
        zone: String,
        temperature: f64,
    },

    /// Set the operating mode of a heating zone
    ZoneMode {
        serial: String,
        zone: String,
        /// AUTO, DAY, NIGHT or OFF
        mode: ZoneMode,
    },

    /// Set the hot water setpoint (35-70 °C)
    DhwSetpoint {
        serial: String,
        /// DHW unit id (e.g. "Control_DHW")
        dhw: String,
        temperature: f64,
    },

    /// Set the hot water operating mode
    DhwMode {
        serial: String,
        dhw: String,
        /// AUTO, ON or OFF
        mode: DhwMode,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Create or update a profile
    Init {
        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,
        /// Account user name
        #[arg(long)]
        username: String,
        /// Identifier the cloud binds tokens to
        #[arg(long, default_value = "vrcsync")]
        device_id: String,
        /// Make this the default profile
        #[arg(long)]
        default: bool,
    },

    /// Display current configuration (passwords masked)
    Show,

    /// List configured profiles
    Profiles,

    /// Store the password of the active profile in the system keyring
    SetPassword,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
