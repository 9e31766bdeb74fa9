// multiMATIC endpoint catalogue
//
// Route builders for every call the bridge issues. Reads return a
// ready `Request`; write routes are returned as plain strings because
// the route doubles as the coalescing key of the write queue.

use secrecy::ExposeSecret;
use serde_json::json;

use crate::request::Request;
use crate::session::{Credentials, DeviceAuth};

/// Production API root.
pub const BASE_URL: &str = "https://smart.vaillant.com/mobile/api/v4/";

// ── Authentication ──────────────────────────────────────────────────

/// Exchange account credentials for a device-bound auth token.
pub fn new_token(credentials: &Credentials) -> Request {
    Request::post(
        "/account/authentication/v1/token/new",
        json!({
            "smartphoneId": credentials.device_id,
            "username": credentials.username,
            "password": credentials.password.expose_secret(),
        }),
    )
    .unauthenticated()
}

/// Open a session for a device token obtained from [`new_token`].
pub fn authenticate(auth: &DeviceAuth) -> Request {
    Request::post(
        "/account/authentication/v1/authenticate",
        json!({
            "smartphoneId": auth.device_id,
            "username": auth.username,
            "authToken": auth.token.expose_secret(),
        }),
    )
    .unauthenticated()
}

pub fn logout() -> Request {
    Request::post("/account/authentication/v1/logout", json!({}))
}

// ── Facility reads ──────────────────────────────────────────────────

/// All facilities of the account (`body.facilitiesList`).
pub fn facilities() -> Request {
    Request::get("/facilities")
}

/// Full system description: zones, DHW units, status.
pub fn system(serial: &str) -> Request {
    Request::get(format!("/facilities/{serial}/systemcontrol/v1"))
}

/// Live measurement report for every device of the facility.
pub fn live_report(serial: &str) -> Request {
    Request::get(format!("/facilities/{serial}/livereport/v1"))
}

pub fn status(serial: &str) -> Request {
    Request::get(format!("/facilities/{serial}/system/v1/status"))
}

pub fn gateway_type(serial: &str) -> Request {
    Request::get(format!("/facilities/{serial}/public/v1/gatewayType"))
}

// ── Write routes ────────────────────────────────────────────────────

/// `/facilities/{serial}/systemcontrol/v1/zones/{zone}/heating/configuration/{field}`
pub fn zone_heating_configuration(serial: &str, zone: &str, field: &str) -> String {
    format!("/facilities/{serial}/systemcontrol/v1/zones/{zone}/heating/configuration/{field}")
}

/// `/facilities/{serial}/systemcontrol/v1/dhw/{dhw}/hotwater/configuration/{field}`
pub fn dhw_hotwater_configuration(serial: &str, dhw: &str, field: &str) -> String {
    format!("/facilities/{serial}/systemcontrol/v1/dhw/{dhw}/hotwater/configuration/{field}")
}
