// ── Typed request bodies for write commands ──
//
// Field names match what the regulator endpoints expect on the wire.

use serde::{Deserialize, Serialize};

use crate::model::{DhwMode, ZoneMode};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneSetpointRequest {
    pub setpoint_temperature: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneSetbackRequest {
    pub setback_temperature: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneModeRequest {
    pub mode: ZoneMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DhwSetpointRequest {
    pub temperature_setpoint: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhwModeRequest {
    pub operation_mode: DhwMode,
}
