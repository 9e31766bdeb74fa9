// ── Field paths ──
//
// Dot-delimited addresses into a snapshot tree, e.g.
// `system.zones.Control_ZO1.heating.configuration.setpoint_temperature`.
// Shared by the aggregator (producer of the tree), the diff step and the
// subscription registry so no call site splits strings by hand.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::CoreError;

/// A parsed field path.
///
/// Segments address object keys; a purely numeric segment also indexes
/// into arrays. Segments never contain `.`, so `Display` and `FromStr`
/// round-trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// The empty path, addressing the whole tree.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::root());
        }
        let segments: Vec<String> = raw.split('.').map(str::to_owned).collect();
        if segments.iter().any(String::is_empty) {
            return Err(CoreError::InvalidPath {
                path: raw.to_owned(),
            });
        }
        Ok(Self(segments))
    }

    /// Extend the path by one segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// `true` if `self` is `other` or lies underneath it.
    pub fn starts_with(&self, other: &FieldPath) -> bool {
        self.0.starts_with(&other.0)
    }

    /// Look the path up in a JSON tree.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(root, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    // ── Well-known paths ─────────────────────────────────────────────

    /// Room temperature measured by a zone's regulator.
    pub fn zone_inside_temperature(zone: &str) -> Self {
        Self::from_segments(["system", "zones", zone, "configuration", "inside_temperature"])
    }

    pub fn zone_name(zone: &str) -> Self {
        Self::from_segments(["system", "zones", zone, "configuration", "name"])
    }

    pub fn zone_active_function(zone: &str) -> Self {
        Self::from_segments(["system", "zones", zone, "configuration", "active_function"])
    }

    pub fn zone_setpoint(zone: &str) -> Self {
        Self::zone_heating(zone, "setpoint_temperature")
    }

    pub fn zone_setback(zone: &str) -> Self {
        Self::zone_heating(zone, "setback_temperature")
    }

    pub fn zone_mode(zone: &str) -> Self {
        Self::zone_heating(zone, "mode")
    }

    pub fn dhw_setpoint(dhw: &str) -> Self {
        Self::dhw_hotwater(dhw, "temperature_setpoint")
    }

    pub fn dhw_mode(dhw: &str) -> Self {
        Self::dhw_hotwater(dhw, "operation_mode")
    }

    /// Value of one temperature report attached to a DHW unit.
    pub fn dhw_report_value(dhw: &str, report: &str) -> Self {
        Self::from_segments(["system", "dhw", dhw, "configuration", report, "value"])
    }

    pub fn outside_temperature() -> Self {
        Self::from_segments(["system", "status", "outside_temperature"])
    }

    fn zone_heating(zone: &str, field: &str) -> Self {
        Self::from_segments(["system", "zones", zone, "heating", "configuration", field])
    }

    fn dhw_hotwater(dhw: &str, field: &str) -> Self {
        Self::from_segments(["system", "dhw", dhw, "hotwater", "configuration", field])
    }

    fn from_segments<const N: usize>(segments: [&str; N]) -> Self {
        Self(segments.iter().map(|s| (*s).to_owned()).collect())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl FromStr for FieldPath {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_and_display_round_trip() {
        let raw = "system.zones.Control_ZO1.heating.configuration.mode";
        let path = FieldPath::parse(raw).unwrap();
        assert_eq!(path.segments().len(), 6);
        assert_eq!(path.to_string(), raw);
        assert_eq!(path, FieldPath::zone_mode("Control_ZO1"));
    }

    #[test]
    fn empty_segments_are_rejected() {
        assert!(FieldPath::parse("system..zones").is_err());
        assert!(FieldPath::parse("system.").is_err());
        assert!(FieldPath::parse("").unwrap().is_root());
    }

    #[test]
    fn resolve_walks_objects_and_arrays() {
        let tree = json!({
            "system": { "zones": { "Z1": { "configuration": { "inside_temperature": 20.5 } } } },
            "measures": { "devices": [ { "_id": "D1" } ] }
        });

        assert_eq!(
            FieldPath::zone_inside_temperature("Z1").resolve(&tree),
            Some(&json!(20.5))
        );
        assert_eq!(
            FieldPath::parse("measures.devices.0._id").unwrap().resolve(&tree),
            Some(&json!("D1"))
        );
        assert_eq!(FieldPath::zone_inside_temperature("Z9").resolve(&tree), None);
        assert_eq!(FieldPath::root().resolve(&tree), Some(&tree));
    }

    #[test]
    fn child_and_prefix() {
        let zones = FieldPath::parse("system.zones").unwrap();
        let zone = zones.child("Z1");
        assert!(zone.starts_with(&zones));
        assert!(!zones.starts_with(&zone));
        assert_eq!(zone.to_string(), "system.zones.Z1");
        assert!(FieldPath::zone_name("Z1").starts_with(&zone));
    }
}
