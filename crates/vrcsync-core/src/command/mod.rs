// ── Commands and write intents ──
//
// A `WriteIntent` is what a caller asks for ("set zone Z1 to 21.5 °C").
// It validates and lowers into a `Command`, the unit the write queue
// coalesces on: the command's target key is the resource route, so two
// writes to the same setting collapse into one.

pub mod requests;

use serde::Serialize;
use serde_json::Value;
use vrcsync_api::{Method, Request, routes};

use crate::error::CoreError;
use crate::model::{DhwMode, FieldPath, ZoneMode};
pub use requests::{
    DhwModeRequest, DhwSetpointRequest, ZoneModeRequest, ZoneSetbackRequest, ZoneSetpointRequest,
};

/// Accepted range for zone setpoint and setback temperatures (°C).
pub const ZONE_TEMPERATURE_RANGE: (f64, f64) = (5.0, 30.0);
/// Accepted range for hot water setpoints (°C).
pub const DHW_TEMPERATURE_RANGE: (f64, f64) = (35.0, 70.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Verb {
    Read,
    Write,
}

/// One queued API call.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Resource route; also the coalescing key.
    pub target_key: String,
    pub payload: Option<Value>,
    pub verb: Verb,
}

impl Command {
    pub fn read(target_key: impl Into<String>) -> Self {
        Self {
            target_key: target_key.into(),
            payload: None,
            verb: Verb::Read,
        }
    }

    pub fn write(target_key: impl Into<String>, payload: Value) -> Self {
        Self {
            target_key: target_key.into(),
            payload: Some(payload),
            verb: Verb::Write,
        }
    }

    /// Lower into a pipeline request. Writes are `PUT`s.
    pub fn to_request(&self) -> Request {
        let method = match self.verb {
            Verb::Read => Method::Get,
            Verb::Write => Method::Put,
        };
        Request {
            route: self.target_key.clone(),
            method,
            payload: self.payload.clone(),
            authenticated: true,
        }
    }
}

/// A setting change requested by a consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteIntent {
    SetZoneSetpoint {
        serial: String,
        zone: String,
        temperature: f64,
    },
    SetZoneSetback {
        serial: String,
        zone: String,
        temperature: f64,
    },
    SetZoneMode {
        serial: String,
        zone: String,
        mode: ZoneMode,
    },
    SetDhwSetpoint {
        serial: String,
        dhw: String,
        temperature: f64,
    },
    SetDhwMode {
        serial: String,
        dhw: String,
        mode: DhwMode,
    },
}

impl WriteIntent {
    pub fn serial(&self) -> &str {
        match self {
            Self::SetZoneSetpoint { serial, .. }
            | Self::SetZoneSetback { serial, .. }
            | Self::SetZoneMode { serial, .. }
            | Self::SetDhwSetpoint { serial, .. }
            | Self::SetDhwMode { serial, .. } => serial,
        }
    }

    /// Snapshot path the write will eventually change.
    pub fn field_path(&self) -> FieldPath {
        match self {
            Self::SetZoneSetpoint { zone, .. } => FieldPath::zone_setpoint(zone),
            Self::SetZoneSetback { zone, .. } => FieldPath::zone_setback(zone),
            Self::SetZoneMode { zone, .. } => FieldPath::zone_mode(zone),
            Self::SetDhwSetpoint { dhw, .. } => FieldPath::dhw_setpoint(dhw),
            Self::SetDhwMode { dhw, .. } => FieldPath::dhw_mode(dhw),
        }
    }

    /// Reject values the regulator would refuse.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::SetZoneSetpoint { temperature, .. } => {
                check_range("setpoint_temperature", *temperature, ZONE_TEMPERATURE_RANGE)
            }
            Self::SetZoneSetback { temperature, .. } => {
                check_range("setback_temperature", *temperature, ZONE_TEMPERATURE_RANGE)
            }
            Self::SetDhwSetpoint { temperature, .. } => {
                check_range("temperature_setpoint", *temperature, DHW_TEMPERATURE_RANGE)
            }
            Self::SetZoneMode { .. } | Self::SetDhwMode { .. } => Ok(()),
        }
    }

    /// Validate and lower into a [`Command`].
    pub fn into_command(self) -> Result<Command, CoreError> {
        self.validate()?;
        let command = match self {
            Self::SetZoneSetpoint {
                serial,
                zone,
                temperature,
            } => Command::write(
                routes::zone_heating_configuration(&serial, &zone, "setpoint_temperature"),
                payload(&ZoneSetpointRequest {
                    setpoint_temperature: temperature,
                })?,
            ),
            Self::SetZoneSetback {
                serial,
                zone,
                temperature,
            } => Command::write(
                routes::zone_heating_configuration(&serial, &zone, "setback_temperature"),
                payload(&ZoneSetbackRequest {
                    setback_temperature: temperature,
                })?,
            ),
            Self::SetZoneMode { serial, zone, mode } => Command::write(
                routes::zone_heating_configuration(&serial, &zone, "mode"),
                payload(&ZoneModeRequest { mode })?,
            ),
            Self::SetDhwSetpoint {
                serial,
                dhw,
                temperature,
            } => Command::write(
                routes::dhw_hotwater_configuration(&serial, &dhw, "temperature_setpoint"),
                payload(&DhwSetpointRequest {
                    temperature_setpoint: temperature,
                })?,
            ),
            Self::SetDhwMode { serial, dhw, mode } => Command::write(
                routes::dhw_hotwater_configuration(&serial, &dhw, "operation_mode"),
                payload(&DhwModeRequest {
                    operation_mode: mode,
                })?,
            ),
        };
        Ok(command)
    }
}

fn check_range(field: &'static str, value: f64, (min, max): (f64, f64)) -> Result<(), CoreError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

fn payload<T: Serialize>(body: &T) -> Result<Value, CoreError> {
    serde_json::to_value(body).map_err(|e| CoreError::MalformedPayload {
        resource: "command".into(),
        message: e.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn zone_setpoint_lowers_to_put_on_configuration_route() {
        let cmd = WriteIntent::SetZoneSetpoint {
            serial: "SN1".into(),
            zone: "Control_ZO1".into(),
            temperature: 21.5,
        }
        .into_command()
        .unwrap();

        assert_eq!(
            cmd.target_key,
            "/facilities/SN1/systemcontrol/v1/zones/Control_ZO1/heating/configuration/setpoint_temperature"
        );
        assert_eq!(cmd.payload, Some(json!({ "setpoint_temperature": 21.5 })));
        assert_eq!(cmd.verb, Verb::Write);

        let req = cmd.to_request();
        assert_eq!(req.method, Method::Put);
        assert!(req.authenticated);
    }

    #[test]
    fn dhw_mode_payload_uses_operation_mode_key() {
        let cmd = WriteIntent::SetDhwMode {
            serial: "SN1".into(),
            dhw: "Control_DHW".into(),
            mode: DhwMode::On,
        }
        .into_command()
        .unwrap();

        assert_eq!(cmd.payload, Some(json!({ "operation_mode": "ON" })));
        assert!(cmd.target_key.ends_with("/hotwater/configuration/operation_mode"));
    }

    #[test]
    fn same_setting_yields_same_target_key() {
        let a = WriteIntent::SetZoneMode {
            serial: "SN1".into(),
            zone: "Z1".into(),
            mode: ZoneMode::Day,
        };
        let b = WriteIntent::SetZoneMode {
            serial: "SN1".into(),
            zone: "Z1".into(),
            mode: ZoneMode::Off,
        };
        assert_eq!(
            a.into_command().unwrap().target_key,
            b.into_command().unwrap().target_key
        );
    }

    #[test]
    fn out_of_range_temperatures_are_rejected() {
        let err = WriteIntent::SetDhwSetpoint {
            serial: "SN1".into(),
            dhw: "Control_DHW".into(),
            temperature: 90.0,
        }
        .into_command()
        .unwrap_err();
        assert!(matches!(err, CoreError::OutOfRange { field: "temperature_setpoint", .. }));

        assert!(
            WriteIntent::SetZoneSetback {
                serial: "SN1".into(),
                zone: "Z1".into(),
                temperature: 4.5,
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn intent_knows_the_affected_path() {
        let intent = WriteIntent::SetZoneSetback {
            serial: "SN1".into(),
            zone: "Z1".into(),
            temperature: 17.0,
        };
        assert_eq!(intent.serial(), "SN1");
        assert_eq!(
            intent.field_path().to_string(),
            "system.zones.Z1.heating.configuration.setback_temperature"
        );
    }
}
