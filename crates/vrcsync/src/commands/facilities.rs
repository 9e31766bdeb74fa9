//! Facility listing.

use tabled::Tabled;
use vrcsync_core::{Bridge, FacilityDescription};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct FacilityRow {
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Firmware")]
    firmware: String,
    #[tabled(rename = "Gateway")]
    gateway: String,
}

impl From<&FacilityDescription> for FacilityRow {
    fn from(f: &FacilityDescription) -> Self {
        Self {
            serial: f.serial_number.clone(),
            name: f.name.clone(),
            firmware: f.firmware_version.clone().unwrap_or_default(),
            gateway: f.gateway_type.clone().unwrap_or_default(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(bridge: &Bridge, global: &GlobalOpts) -> Result<(), CliError> {
    let facilities = bridge.list_facilities().await?;
    let out = output::render_list(
        &global.output,
        &facilities,
        |f| FacilityRow::from(f),
        |f| f.serial_number.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
