// ── Snapshot aggregation ──
//
// Four concurrent reads per facility, merged into one normalized tree.
// Aggregation is all-or-nothing: any failed read fails the snapshot and
// the caller keeps whatever it had before.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, warn};
use vrcsync_api::{RequestPipeline, routes};

use crate::error::CoreError;
use crate::model::{FacilityDescription, Snapshot, SnapshotMeta};

/// Measurement category kept on DHW units.
const TEMPERATURE_CATEGORY: &str = "TEMPERATURE";
const SYNCED: &str = "SYNCED";
/// Epoch timestamps shorter than this many digits are in seconds.
const MILLIS_DIGITS: u32 = 13;

/// Builds [`Snapshot`]s and reads the facility list.
#[derive(Clone)]
pub struct SnapshotAggregator {
    pipeline: Arc<RequestPipeline>,
    stale_after: Duration,
}

impl SnapshotAggregator {
    pub fn new(pipeline: Arc<RequestPipeline>, stale_after: Duration) -> Self {
        Self {
            pipeline,
            stale_after,
        }
    }

    /// Fetch and normalize the full state of one facility.
    pub async fn build_snapshot(&self, serial: &str) -> Result<Snapshot, CoreError> {
        let system_req = routes::system(serial);
        let measures_req = routes::live_report(serial);
        let status_req = routes::status(serial);
        let gateway_req = routes::gateway_type(serial);
        let (system, measures, status, gateway) = tokio::try_join!(
            self.pipeline.execute(&system_req),
            self.pipeline.execute(&measures_req),
            self.pipeline.execute(&status_req),
            self.pipeline.execute(&gateway_req),
        )?;

        let meta = compute_meta(
            [&system.meta, &measures.meta, &status.meta, &gateway.meta],
            local_now_ms(),
            millis(self.stale_after),
        );
        let snapshot = assemble(system.body, measures.body, status.body, gateway.body, meta)?;

        debug!(
            serial,
            zones = snapshot.zone_ids().len(),
            dhw = snapshot.dhw_ids().len(),
            pending = meta.pending,
            stale = meta.stale,
            "snapshot built"
        );
        Ok(snapshot)
    }

    /// All facilities registered to the account.
    pub async fn list_facilities(&self) -> Result<Vec<FacilityDescription>, CoreError> {
        let resp = self.pipeline.execute(&routes::facilities()).await?;
        match resp.body.get("facilitiesList") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(list) => serde_json::from_value(list.clone()).map_err(|e| {
                CoreError::MalformedPayload {
                    resource: "facilitiesList".into(),
                    message: e.to_string(),
                }
            }),
        }
    }
}

// ── Normalization ────────────────────────────────────────────────────

/// Merge the four bodies into a snapshot tree.
pub(crate) fn assemble(
    system: Value,
    measures: Value,
    status: Value,
    gateway: Value,
    meta: SnapshotMeta,
) -> Result<Snapshot, CoreError> {
    let mut system = match system {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(CoreError::MalformedPayload {
                resource: "system".into(),
                message: format!("expected an object, got {}", kind_of(&other)),
            });
        }
    };

    let zones = index_by_id(system.remove("zones"), "zone");
    let mut dhw = index_by_id(system.remove("dhw"), "dhw");
    attach_dhw_temperatures(&mut dhw, &measures);

    system.insert("zones".into(), Value::Object(zones));
    system.insert("dhw".into(), Value::Object(dhw));

    Ok(Snapshot::new(
        Value::Object(system),
        measures,
        status,
        gateway,
        meta,
    ))
}

/// Turn an array of records into an object keyed by each record's `_id`.
pub(crate) fn index_by_id(records: Option<Value>, kind: &str) -> Map<String, Value> {
    let mut indexed = Map::new();
    let records = match records {
        Some(Value::Array(records)) => records,
        // Already keyed (or absent): nothing to re-index.
        Some(Value::Object(map)) => return map,
        _ => return indexed,
    };

    for record in records {
        match record.get("_id").and_then(Value::as_str) {
            Some(id) => {
                indexed.insert(id.to_owned(), record);
            }
            None => warn!(kind, "record without _id skipped"),
        }
    }
    indexed
}

/// Replace every DHW unit's `configuration` with its temperature reports.
pub(crate) fn attach_dhw_temperatures(dhw: &mut Map<String, Value>, measures: &Value) {
    let devices = measures
        .get("devices")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for (id, unit) in dhw.iter_mut() {
        let reports: Map<String, Value> = devices
            .iter()
            .find(|device| device.get("_id").and_then(Value::as_str) == Some(id.as_str()))
            .and_then(|device| device.get("reports"))
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter(|report| {
                report.get("measurement_category").and_then(Value::as_str)
                    == Some(TEMPERATURE_CATEGORY)
            })
            .filter_map(|report| {
                let key = report.get("_id").and_then(Value::as_str)?;
                Some((key.to_owned(), report.clone()))
            })
            .collect();

        if let Value::Object(unit) = unit {
            unit.insert("configuration".into(), Value::Object(reports));
        }
    }
}

// ── Staleness ────────────────────────────────────────────────────────

/// Derive `{pending, timestamp, age, stale}` from the reply meta blocks.
pub(crate) fn compute_meta<'a>(
    metas: impl IntoIterator<Item = &'a Value>,
    now_ms: i64,
    stale_after_ms: i64,
) -> SnapshotMeta {
    let mut pending = false;
    let mut recent = 0_i64;

    let states = metas
        .into_iter()
        .filter_map(|meta| meta.get("resourceState"))
        .filter_map(Value::as_array)
        .flatten();

    for state in states {
        if state.get("state").and_then(Value::as_str) != Some(SYNCED) {
            pending = true;
        }
        if let Some(ts) = state.get("timestamp").and_then(timestamp_of) {
            recent = recent.max(normalize_timestamp(ts));
        }
    }

    let age = now_ms.saturating_sub(recent);
    SnapshotMeta::new(pending, recent, age, age > stale_after_ms)
}

/// Seconds-precision timestamps (fewer than 13 digits) become milliseconds.
pub fn normalize_timestamp(ts: i64) -> i64 {
    let digits = ts.unsigned_abs().checked_ilog10().map_or(1, |d| d + 1);
    if digits < MILLIS_DIGITS {
        ts.saturating_mul(1000)
    } else {
        ts
    }
}

fn timestamp_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Local wall-clock time as epoch milliseconds.
///
/// The cloud stamps resources in the gateway's local time, so "now" is
/// shifted by the local UTC offset before ages are computed.
pub fn local_now_ms() -> i64 {
    chrono::Local::now()
        .naive_local()
        .and_utc()
        .timestamp_millis()
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
