//! Continuous polling with change output.

use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};
use vrcsync_core::{Bridge, FieldChange, FieldPath, SyncEvent};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

/// One printed change line.
#[derive(Debug, Serialize)]
struct ChangeLine {
    at: String,
    serial: String,
    path: String,
    previous: Option<Value>,
    current: Option<Value>,
}

fn render_line(line: &ChangeLine, format: &OutputFormat, color: bool) -> Result<String, CliError> {
    let show = |v: &Option<Value>| v.as_ref().map_or_else(|| "-".to_owned(), output::plain_value);
    Ok(match format {
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json(line, true)?,
        OutputFormat::Plain => format!("{} {} {}", line.serial, line.path, show(&line.current)),
        OutputFormat::Table if color => format!(
            "{} {} {} {} → {}",
            line.at.dimmed(),
            line.serial.cyan(),
            line.path,
            show(&line.previous).red(),
            show(&line.current).green(),
        ),
        OutputFormat::Table => format!(
            "{} {} {} {} → {}",
            line.at,
            line.serial,
            line.path,
            show(&line.previous),
            show(&line.current),
        ),
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(bridge: &Bridge, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let paths = args
        .paths
        .iter()
        .map(|raw| raw.parse::<FieldPath>())
        .collect::<Result<Vec<_>, _>>()?;

    let serials = match args.serial {
        Some(serial) => vec![serial],
        None => bridge
            .list_facilities()
            .await?
            .into_iter()
            .map(|f| f.serial_number)
            .collect(),
    };
    if serials.is_empty() {
        return Err(CliError::NotFound {
            resource_type: "facility".into(),
            identifier: "(any)".into(),
            list_command: "facilities".into(),
        });
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<(String, FieldPath, FieldChange)>();
    for serial in &serials {
        for path in &paths {
            let tx = tx.clone();
            let tag = (serial.clone(), path.clone());
            bridge.subscribe(serial, path.clone(), move |change| {
                let _ = tx.send((tag.0.clone(), tag.1.clone(), change.clone()));
            });
        }
    }
    drop(tx);

    let color = output::should_color(&global.color);
    let mut events = bridge.events();
    bridge.start().await;
    info!(facilities = serials.len(), paths = paths.len(), "watching");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some((serial, path, change)) = rx.recv() => {
                let line = ChangeLine {
                    at: chrono::Local::now().format("%H:%M:%S").to_string(),
                    serial,
                    path: path.to_string(),
                    previous: change.previous,
                    current: change.current,
                };
                output::print_output(&render_line(&line, &global.output, color)?, global.quiet);
            }
            event = events.recv() => match event {
                Ok(SyncEvent::CycleComplete(summary)) => {
                    debug!(cycle = summary.cycle, changes = summary.changes, failed = summary.failed, "cycle complete");
                }
                Ok(SyncEvent::FacilityDiscovered { description, .. }) => {
                    info!(serial = %description.serial_number, "facility discovered");
                }
                Err(broadcast::error::RecvError::Lagged(n)) => debug!(skipped = n, "event receiver lagged"),
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    Ok(())
}
