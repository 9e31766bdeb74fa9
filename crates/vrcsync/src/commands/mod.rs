//! Command dispatch: bridges CLI args -> `Bridge` calls -> output formatting.

pub mod config_cmd;
pub mod facilities;
pub mod set;
pub mod snapshot;
pub mod watch;

use vrcsync_core::Bridge;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a cloud-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, bridge: &Bridge, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Facilities => facilities::handle(bridge, global).await,
        Command::Snapshot(args) => snapshot::handle(bridge, args, global).await,
        Command::Watch(args) => watch::handle(bridge, args, global).await,
        Command::Set(args) => set::handle(bridge, args, global).await,
        // Config and Completions never reach the cloud.
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
