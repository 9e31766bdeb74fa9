//! One-off facility snapshot.

use std::fmt::Write;

use owo_colors::OwoColorize;
use serde_json::Value;
use vrcsync_core::{Bridge, FieldPath, Snapshot};

use crate::cli::{GlobalOpts, SnapshotArgs};
use crate::error::CliError;
use crate::output;

// ── Detail view ─────────────────────────────────────────────────────

/// Human summary: freshness, zones and hot water.
fn render_detail(snapshot: &Snapshot, color: bool) -> String {
    let mut out = String::new();
    let meta = snapshot.meta();

    let freshness = if meta.stale { "stale" } else { "fresh" };
    let freshness = match (color, meta.stale) {
        (false, _) => freshness.to_owned(),
        (true, true) => freshness.yellow().to_string(),
        (true, false) => freshness.green().to_string(),
    };
    let _ = writeln!(
        out,
        "Gateway:   {}",
        snapshot.gateway_type().unwrap_or("unknown")
    );
    let _ = writeln!(out, "Data:      {freshness} (age {}s)", meta.age / 1000);
    let _ = writeln!(out, "Pending:   {}", meta.pending);
    if let Some(outside) = snapshot.get(&FieldPath::outside_temperature()) {
        let _ = writeln!(out, "Outside:   {} °C", output::plain_value(outside));
    }

    for zone in snapshot.zone_ids() {
        let name = lookup(snapshot, &FieldPath::zone_name(zone));
        let inside = lookup(snapshot, &FieldPath::zone_inside_temperature(zone));
        let setpoint = lookup(snapshot, &FieldPath::zone_setpoint(zone));
        let mode = lookup(snapshot, &FieldPath::zone_mode(zone));
        let _ = writeln!(out);
        let _ = writeln!(out, "Zone {zone} {name}");
        let _ = writeln!(out, "  inside {inside} °C, setpoint {setpoint} °C, mode {mode}");
    }

    for dhw in snapshot.dhw_ids() {
        let setpoint = lookup(snapshot, &FieldPath::dhw_setpoint(dhw));
        let mode = lookup(snapshot, &FieldPath::dhw_mode(dhw));
        let _ = writeln!(out);
        let _ = writeln!(out, "Hot water {dhw}");
        let _ = writeln!(out, "  setpoint {setpoint} °C, mode {mode}");
    }

    out.trim_end().to_owned()
}

fn lookup(snapshot: &Snapshot, path: &FieldPath) -> String {
    snapshot
        .get(path)
        .map_or_else(|| "-".to_owned(), output::plain_value)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    bridge: &Bridge,
    args: SnapshotArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let snapshot = bridge.fetch_snapshot(&args.serial).await?;

    let out = if let Some(raw) = args.path {
        let path: FieldPath = raw.parse()?;
        let value = snapshot.get(&path).ok_or_else(|| CliError::NotFound {
            resource_type: "path".into(),
            identifier: raw.clone(),
            list_command: format!("snapshot {} --output json", args.serial),
        })?;
        output::render_single(
            &global.output,
            value,
            output::plain_value,
            output::plain_value,
        )?
    } else {
        let color = output::should_color(&global.color);
        output::render_single(
            &global.output,
            snapshot.tree(),
            |_: &Value| render_detail(&snapshot, color),
            |_: &Value| snapshot.zone_ids().join("\n"),
        )?
    };

    output::print_output(&out, global.quiet);
    Ok(())
}
