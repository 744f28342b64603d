//! Structural comparison of two snapshots.
//!
//! Both sides are walked as generic JSON trees. Object keys are visited in
//! sorted order over the union of both sides, depth first, so the result is
//! deterministic. Arrays are compared index by index: a reordered list shows
//! up as a series of `Changed` events rather than a move.

use crate::snapshot::OrderSnapshot;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One difference between two trees, addressed by a dotted path such as
/// `RN123.details.tasks.scheduling.deliveryWindowDisplay` or `a.list[2]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation")]
pub enum ChangeEvent {
    Added {
        key: String,
        value: Value,
    },
    Removed {
        key: String,
        old_value: Value,
    },
    Changed {
        key: String,
        old_value: Value,
        value: Value,
    },
}

impl ChangeEvent {
    pub fn key(&self) -> &str {
        match self {
            ChangeEvent::Added { key, .. }
            | ChangeEvent::Removed { key, .. }
            | ChangeEvent::Changed { key, .. } => key,
        }
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeEvent::Added { key, value } => write!(f, "+ {key}: {value}"),
            ChangeEvent::Removed { key, old_value } => write!(f, "- {key}: {old_value}"),
            ChangeEvent::Changed {
                key,
                old_value,
                value,
            } => write!(f, "~ {key}: {old_value} -> {value}"),
        }
    }
}

enum Shape<'a> {
    Null,
    Scalar(&'a Value),
    Mapping(&'a Map<String, Value>),
    Sequence(&'a [Value]),
}

fn shape(value: &Value) -> Shape<'_> {
    match value {
        Value::Null => Shape::Null,
        Value::Object(map) => Shape::Mapping(map),
        Value::Array(items) => Shape::Sequence(items),
        scalar => Shape::Scalar(scalar),
    }
}

/// Compare two trees. Without a previous tree there is nothing to compare
/// against and the result is empty.
pub fn compare(old: Option<&Value>, new: &Value) -> Vec<ChangeEvent> {
    let mut events = Vec::new();
    if let Some(old) = old {
        walk("", old, new, &mut events);
    }
    events
}

/// Compare two snapshots keyed by order reference number, so an order that
/// appears or disappears is a single `Added` or `Removed` event.
pub fn compare_snapshots(
    old: Option<&OrderSnapshot>,
    new: &OrderSnapshot,
) -> Result<Vec<ChangeEvent>, serde_json::Error> {
    let old = old.map(OrderSnapshot::to_keyed_value).transpose()?;
    let new = new.to_keyed_value()?;
    Ok(compare(old.as_ref(), &new))
}

fn walk(path: &str, old: &Value, new: &Value, events: &mut Vec<ChangeEvent>) {
    match (shape(old), shape(new)) {
        (Shape::Mapping(a), Shape::Mapping(b)) => {
            for key in a.keys().chain(b.keys()).sorted().dedup() {
                let child = join(path, key);
                diff_slot(child, a.get(key), b.get(key), events);
            }
        }
        (Shape::Sequence(a), Shape::Sequence(b)) => {
            for i in 0..a.len().max(b.len()) {
                let child = format!("{path}[{i}]");
                diff_slot(child, a.get(i), b.get(i), events);
            }
        }
        (Shape::Null, Shape::Null) => {}
        (Shape::Scalar(a), Shape::Scalar(b)) if scalars_equal(a, b) => {}
        _ => events.push(ChangeEvent::Changed {
            key: path.to_string(),
            old_value: old.clone(),
            value: new.clone(),
        }),
    }
}

/// Numbers compare by value, so `1000` and `1000.0` are the same amount.
fn scalars_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x != y => {
            matches!((x.as_f64(), y.as_f64()), (Some(x), Some(y)) if x == y)
        }
        _ => a == b,
    }
}

fn diff_slot(
    key: String,
    old: Option<&Value>,
    new: Option<&Value>,
    events: &mut Vec<ChangeEvent>,
) {
    match (old, new) {
        (Some(old), Some(new)) => walk(&key, old, new, events),
        (None, Some(value)) => events.push(ChangeEvent::Added {
            key,
            value: value.clone(),
        }),
        (Some(old_value), None) => events.push(ChangeEvent::Removed {
            key,
            old_value: old_value.clone(),
        }),
        (None, None) => {}
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}
