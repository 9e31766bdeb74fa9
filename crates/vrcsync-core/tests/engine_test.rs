#![allow(clippy::unwrap_used)]
// End-to-end tests of `Bridge` over an in-memory cloud.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use vrcsync_api::{Error, Method, Request, Response, Transport};
use vrcsync_core::{
    Bridge, BridgeConfig, Credentials, FieldChange, FieldPath, SessionState, SyncEvent, ZoneMode,
};

// ── Fake cloud ──────────────────────────────────────────────────────

/// Two-facility account. Setpoints can be changed between polls and
/// individual facilities can be taken offline.
struct FakeCloud {
    setpoints: Mutex<HashMap<String, f64>>,
    offline: Mutex<Vec<String>>,
    requests: Mutex<Vec<Request>>,
}

impl FakeCloud {
    fn new(serials: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            setpoints: Mutex::new(serials.iter().map(|s| ((*s).to_owned(), 20.0)).collect()),
            offline: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn set_setpoint(&self, serial: &str, value: f64) {
        self.setpoints.lock().unwrap().insert(serial.to_owned(), value);
    }

    fn take_offline(&self, serial: &str) {
        self.offline.lock().unwrap().push(serial.to_owned());
    }

    fn count(&self, pred: impl Fn(&Request) -> bool) -> usize {
        self.requests.lock().unwrap().iter().filter(|r| pred(r)).count()
    }

    fn puts(&self) -> Vec<Request> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == Method::Put)
            .cloned()
            .collect()
    }

    fn reply(&self, route: &str) -> Result<Value, Error> {
        if route.starts_with("/account/authentication") {
            return Ok(json!({ "authToken": "tok" }));
        }
        if route == "/facilities" {
            let mut serials: Vec<String> = self.setpoints.lock().unwrap().keys().cloned().collect();
            serials.sort();
            let list: Vec<Value> = serials
                .iter()
                .map(|s| json!({ "facilitySerialNumber": s, "name": format!("House {s}"), "firmwareVersion": "1.0" }))
                .collect();
            return Ok(json!({ "facilitiesList": list }));
        }

        let mut parts = route.trim_start_matches('/').split('/');
        let (Some("facilities"), Some(serial)) = (parts.next(), parts.next()) else {
            return Ok(Value::Null);
        };
        if self.offline.lock().unwrap().iter().any(|s| s == serial) {
            return Err(Error::Api {
                status: 503,
                message: "gateway offline".into(),
            });
        }

        let rest: Vec<&str> = parts.collect();
        let setpoint = self.setpoints.lock().unwrap().get(serial).copied().unwrap_or(0.0);
        Ok(match rest.as_slice() {
            ["systemcontrol", "v1"] => json!({
                "zones": [{
                    "_id": "Control_ZO1",
                    "configuration": { "name": "Living", "inside_temperature": 19.5 },
                    "heating": { "configuration": { "setpoint_temperature": setpoint, "mode": "AUTO" } }
                }],
                "dhw": [{ "_id": "Control_DHW", "hotwater": { "configuration": { "operation_mode": "AUTO" } } }],
                "status": { "outside_temperature": 8.0 }
            }),
            ["livereport", "v1"] => json!({ "devices": [{
                "_id": "Control_DHW",
                "reports": [{
                    "_id": "DomesticHotWaterTankTemperature",
                    "measurement_category": "TEMPERATURE",
                    "value": 47.0
                }]
            }] }),
            ["public", "v1", "gatewayType"] => json!({ "gatewayType": "VR920" }),
            _ => json!({}),
        })
    }
}

#[async_trait]
impl Transport for FakeCloud {
    async fn execute(&self, request: &Request) -> Result<Response, Error> {
        self.requests.lock().unwrap().push(request.clone());
        let body = self.reply(&request.route)?;
        Ok(Response {
            status: 200,
            body,
            meta: json!({ "resourceState": [{ "state": "SYNCED", "timestamp": 1_700_000_000 }] }),
        })
    }
}

fn bridge(cloud: &Arc<FakeCloud>) -> Bridge {
    let config = BridgeConfig::new(Credentials::new("phone", "user", "pass"));
    Bridge::with_transport(config, Arc::clone(cloud) as Arc<dyn Transport>)
}

// ── Polling ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_two_facilities_discovered_then_single_change_dispatched() {
    let cloud = FakeCloud::new(&["SN1", "SN2"]);
    let bridge = bridge(&cloud);

    let seen = Arc::new(Mutex::new(Vec::new()));
    for serial in ["SN1", "SN2"] {
        let sink = Arc::clone(&seen);
        let tag = serial.to_owned();
        bridge.subscribe(serial, FieldPath::zone_setpoint("Control_ZO1"), move |change| {
            sink.lock().unwrap().push((tag.clone(), change.clone()));
        });
    }
    let mut events = bridge.events();

    let first = bridge.refresh_once().await.unwrap();
    assert_eq!(first.discovered, 2);
    assert_eq!(first.dispatched, 0);

    let mut discovered = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let SyncEvent::FacilityDiscovered { description, snapshot } = event {
            assert_eq!(description.gateway_type.as_deref(), Some("VR920"));
            assert!(!snapshot.meta().pending);
            discovered.push(description.serial_number);
        }
    }
    discovered.sort();
    assert_eq!(discovered, vec!["SN1", "SN2"]);

    cloud.set_setpoint("SN1", 21.5);
    let second = bridge.refresh_once().await.unwrap();

    assert_eq!(second.dispatched, 1);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(
            "SN1".to_owned(),
            FieldChange {
                previous: Some(json!(20.0)),
                current: Some(json!(21.5)),
            }
        )]
    );
    assert_eq!(
        bridge
            .snapshot("SN1")
            .unwrap()
            .get(&FieldPath::zone_setpoint("Control_ZO1")),
        Some(&json!(21.5))
    );
}

#[tokio::test]
async fn test_snapshot_is_normalized() {
    let cloud = FakeCloud::new(&["SN1"]);
    let bridge = bridge(&cloud);
    bridge.refresh_once().await.unwrap();

    let snapshot = bridge.snapshot("SN1").unwrap();
    assert_eq!(snapshot.zone_ids(), vec!["Control_ZO1"]);
    assert_eq!(
        snapshot.get(&FieldPath::dhw_report_value("Control_DHW", "DomesticHotWaterTankTemperature")),
        Some(&json!(47.0))
    );
    assert_eq!(snapshot.meta().timestamp, 1_700_000_000_000);
    assert!(snapshot.meta().gateway);
    // 2023 timestamps are far older than ten minutes.
    assert!(snapshot.meta().stale);
}

#[tokio::test]
async fn test_offline_facility_does_not_disturb_others() {
    let cloud = FakeCloud::new(&["SN1", "SN2"]);
    let bridge = bridge(&cloud);
    bridge.refresh_once().await.unwrap();

    let (_h, mut sn1) = bridge.subscribe_channel("SN1", FieldPath::zone_setpoint("Control_ZO1"));
    cloud.take_offline("SN2");
    cloud.set_setpoint("SN1", 18.0);
    cloud.set_setpoint("SN2", 18.0);

    let summary = bridge.refresh_once().await.unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(sn1.recv().await.unwrap().current, Some(json!(18.0)));
    assert_eq!(
        bridge
            .snapshot("SN2")
            .unwrap()
            .get(&FieldPath::zone_setpoint("Control_ZO1")),
        Some(&json!(20.0))
    );
}

#[tokio::test]
async fn test_all_polls_share_one_login() {
    let cloud = FakeCloud::new(&["SN1", "SN2"]);
    let bridge = bridge(&cloud);

    bridge.refresh_once().await.unwrap();
    bridge.refresh_once().await.unwrap();

    assert_eq!(
        cloud.count(|r| r.route == "/account/authentication/v1/authenticate"),
        1
    );
    assert_eq!(bridge.session_state().await, SessionState::Authenticated);
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_rapid_writes_send_one_command() {
    let cloud = FakeCloud::new(&["SN1"]);
    let bridge = bridge(&cloud);

    for t in [19.0, 19.5, 20.0, 20.5, 21.0] {
        bridge.set_zone_setpoint("SN1", "Control_ZO1", t).await.unwrap();
    }
    bridge.set_zone_mode("SN1", "Control_ZO1", ZoneMode::Night).await.unwrap();

    let report = bridge.flush_writes().await.unwrap();
    let puts = cloud.puts();

    assert_eq!(puts.len(), 2);
    assert_eq!(puts[0].payload, Some(json!({ "setpoint_temperature": 21.0 })));
    assert_eq!(puts[1].payload, Some(json!({ "mode": "NIGHT" })));
    assert!(report.is_clean());
}

#[tokio::test]
async fn test_invalid_write_is_rejected_before_queueing() {
    let cloud = FakeCloud::new(&["SN1"]);
    let bridge = bridge(&cloud);

    let result = bridge.set_dhw_setpoint("SN1", "Control_DHW", 95.0).await;
    assert!(result.is_err());
    assert!(cloud.puts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_flushes_writes_and_logs_out() {
    let cloud = FakeCloud::new(&["SN1"]);
    let bridge = bridge(&cloud);

    let mut events = bridge.events();
    assert!(bridge.start().await);
    while !matches!(events.recv().await.unwrap(), SyncEvent::CycleComplete(_)) {}

    bridge.set_dhw_setpoint("SN1", "Control_DHW", 55.0).await.unwrap();
    let report = bridge.shutdown().await.unwrap();

    assert_eq!(report.delivered.len(), 1);
    assert_eq!(
        cloud.count(|r| r.route == "/account/authentication/v1/logout"),
        1
    );
    tokio::time::sleep(Duration::from_secs(900)).await;
    assert_eq!(cloud.count(|r| r.route == "/facilities"), 1);
}
