// ── Snapshot diff ──
//
// Leaf-level comparison of two snapshot trees. Objects are walked key by
// key; arrays and scalars are compared whole. A key present on only one
// side shows up with `None` on the other; an empty object that appears
// or disappears is reported as a leaf of its own.

use serde::Serialize;
use serde_json::Value;

use crate::model::{FieldPath, Snapshot};

/// Old and new value at one path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub previous: Option<Value>,
    pub current: Option<Value>,
}

/// Every leaf path whose value differs between the two snapshots.
pub fn diff_snapshots(previous: &Snapshot, current: &Snapshot) -> Vec<(FieldPath, FieldChange)> {
    diff(previous.tree(), current.tree())
}

pub fn diff(previous: &Value, current: &Value) -> Vec<(FieldPath, FieldChange)> {
    let mut changes = Vec::new();
    walk(&FieldPath::root(), Some(previous), Some(current), &mut changes);
    changes
}

fn walk(
    path: &FieldPath,
    previous: Option<&Value>,
    current: Option<&Value>,
    out: &mut Vec<(FieldPath, FieldChange)>,
) {
    match (previous, current) {
        (Some(Value::Object(prev)), Some(Value::Object(cur))) => {
            for (key, prev_value) in prev {
                walk(&path.child(key.as_str()), Some(prev_value), cur.get(key), out);
            }
            for (key, cur_value) in cur.iter().filter(|(k, _)| !prev.contains_key(*k)) {
                walk(&path.child(key.as_str()), None, Some(cur_value), out);
            }
        }
        (Some(Value::Object(prev)), None) if !prev.is_empty() => {
            for (key, value) in prev {
                walk(&path.child(key.as_str()), Some(value), None, out);
            }
        }
        (None, Some(Value::Object(cur))) if !cur.is_empty() => {
            for (key, value) in cur {
                walk(&path.child(key.as_str()), None, Some(value), out);
            }
        }
        (prev, cur) if prev != cur => out.push((
            path.clone(),
            FieldChange {
                previous: prev.cloned(),
                current: cur.cloned(),
            },
        )),
        _ => {}
    }
}
