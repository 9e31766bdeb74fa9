//! Setpoint and mode writes.

use vrcsync_core::{Bridge, WriteIntent};

use crate::cli::{GlobalOpts, SetArgs, SetCommand};
use crate::error::CliError;

fn to_intent(command: SetCommand) -> WriteIntent {
    match command {
        SetCommand::ZoneSetpoint {
            serial,
            zone,
            temperature,
        } => WriteIntent::SetZoneSetpoint {
            serial,
            zone,
            temperature,
        },
        SetCommand::ZoneSetback {
            serial,
            zone,
            temperature,
        } => WriteIntent::SetZoneSetback {
            serial,
            zone,
            temperature,
        },
        SetCommand::ZoneMode { serial, zone, mode } => {
            WriteIntent::SetZoneMode { serial, zone, mode }
        }
        SetCommand::DhwSetpoint {
            serial,
            dhw,
            temperature,
        } => WriteIntent::SetDhwSetpoint {
            serial,
            dhw,
            temperature,
        },
        SetCommand::DhwMode { serial, dhw, mode } => WriteIntent::SetDhwMode { serial, dhw, mode },
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(bridge: &Bridge, args: SetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let intent = to_intent(args.command);
    let path = intent.field_path();
    let serial = intent.serial().to_owned();

    bridge.submit(intent).await?;
    let report = bridge.flush_writes().await;

    if let Some((_, err)) = report.as_ref().and_then(|r| r.failed.first()) {
        return Err(CliError::ApiError {
            message: format!("write to {path} on {serial} failed: {err}"),
        });
    }

    if !global.quiet {
        eprintln!("Updated {path} on {serial}");
    }
    Ok(())
}
