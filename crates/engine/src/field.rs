//! Field accessor: dot-delimited paths into nested records.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::{Record, Value};

/// A dot-segmented address into a record, possibly nested.
/// `"user.address.city"` → `["user", "address", "city"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Split a dot-delimited string into segments. Never fails; an empty
    /// string yields one empty segment, which the config layer rejects.
    pub fn parse(path: &str) -> Self {
        Self(path.split('.').map(str::to_string).collect())
    }

    pub fn from_segments(segments: Vec<String>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The dotted form, `"user.address.city"`.
    pub fn dotted(&self) -> String {
        self.0.join(".")
    }

    pub fn is_nested(&self) -> bool {
        self.0.len() > 1
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dotted())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.dotted())
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// Walk `path` into `record`. `None` means absent — any hop missing or an
/// intermediate that is a scalar — which is distinct from a present null.
/// A numeric segment indexes into an array.
pub fn resolve<'a>(record: &'a Record, path: &FieldPath) -> Option<&'a Value> {
    let mut segments = path.segments().iter();
    let mut current = record.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Enumerate every leaf path in the batch, depth-first, in first-seen order.
/// Paths that first appear in later records are appended at the end, so
/// earlier records never invalidate the enumeration. Arrays and empty
/// objects count as leaves.
pub fn flatten(records: &[Record]) -> Vec<FieldPath> {
    let mut seen = HashSet::new();
    let mut paths = Vec::new();
    for record in records {
        for (name, value) in record {
            collect_leaves(&mut paths, &mut seen, vec![name.clone()], value);
        }
    }
    paths
}

fn collect_leaves(
    paths: &mut Vec<FieldPath>,
    seen: &mut HashSet<String>,
    prefix: Vec<String>,
    value: &Value,
) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (name, child) in map {
                let mut next = prefix.clone();
                next.push(name.clone());
                collect_leaves(paths, seen, next, child);
            }
        }
        _ => {
            let path = FieldPath::from_segments(prefix);
            if seen.insert(path.dotted()) {
                paths.push(path);
            }
        }
    }
}

/// Rebuild a record holding only the given paths with their resolved
/// values. Absent paths are simply omitted.
pub fn project(record: &Record, paths: &[FieldPath]) -> Record {
    let mut out = Record::new();
    for path in paths {
        if let Some(value) = resolve(record, path) {
            set_path(&mut out, path, value.clone());
        }
    }
    out
}

/// Insert `value` at `path`, creating intermediate objects as needed. An
/// intermediate that is not an object is replaced by one.
pub fn set_path(record: &mut Record, path: &FieldPath, value: Value) {
    set_segments(record, path.segments(), value);
}

fn set_segments(map: &mut Record, segments: &[String], value: Value) {
    let (head, rest) = match segments.split_first() {
        Some(split) => split,
        None => return,
    };
    if rest.is_empty() {
        map.insert(head.clone(), value);
        return;
    }
    let entry = map
        .entry(head.clone())
        .or_insert_with(|| Value::Object(Record::new()));
    if !entry.is_object() {
        *entry = Value::Object(Record::new());
    }
    if let Value::Object(child) = entry {
        set_segments(child, rest, value);
    }
}

/// Remove the value at `path` if present. Parent objects emptied by the
/// removal are pruned; pre-existing empty objects are untouched.
pub fn remove_path(record: &mut Record, path: &FieldPath) {
    remove_segments(record, path.segments());
}

fn remove_segments(map: &mut Record, segments: &[String]) -> bool {
    let (head, rest) = match segments.split_first() {
        Some(split) => split,
        None => return false,
    };
    if rest.is_empty() {
        return map.remove(head).is_some();
    }
    let (removed, now_empty) = match map.get_mut(head) {
        Some(Value::Object(child)) => {
            let removed = remove_segments(child, rest);
            (removed, child.is_empty())
        }
        _ => (false, false),
    };
    if removed && now_empty {
        map.remove(head);
    }
    removed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
