//! Equality engine: strict/fuzzy value equality, total ordering for sorts,
//! and composite-key extraction.

use std::cmp::Ordering;

use crate::field::{resolve, FieldPath};
use crate::model::{CompareMode, Record, Value};

// ---------------------------------------------------------------------------
// Value kinds
// ---------------------------------------------------------------------------

/// The runtime kind of a value, used for type-consistency checks and for
/// cross-kind ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

pub fn kind(value: &Value) -> ValueKind {
    match value {
        Value::Null => ValueKind::Null,
        Value::Bool(_) => ValueKind::Bool,
        Value::Number(_) => ValueKind::Number,
        Value::String(_) => ValueKind::String,
        Value::Array(_) => ValueKind::Array,
        Value::Object(_) => ValueKind::Object,
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool => write!(f, "boolean"),
            Self::Number => write!(f, "number"),
            Self::String => write!(f, "string"),
            Self::Array => write!(f, "list"),
            Self::Object => write!(f, "object"),
        }
    }
}

// ---------------------------------------------------------------------------
// Equality
// ---------------------------------------------------------------------------

/// Value equality under the given mode.
///
/// Strict is structural: lists element-wise in order, objects key-by-key
/// with no extra keys on either side, differing kinds never equal. Numbers
/// compare by numeric value, so 1 and 1.0 are equal.
///
/// Fuzzy coerces scalars to a canonical token first (numbers and numeric
/// strings meet, booleans and their string forms meet); lists and objects
/// recurse with fuzzy semantics at the scalar leaves.
pub fn equal(a: &Value, b: &Value, mode: CompareMode) -> bool {
    match mode {
        CompareMode::Strict => equal_strict(a, b),
        CompareMode::Fuzzy => match (a, b) {
            (Value::Array(x), Value::Array(y)) => {
                x.len() == y.len()
                    && x.iter().zip(y).all(|(l, r)| equal(l, r, CompareMode::Fuzzy))
            }
            (Value::Object(x), Value::Object(y)) => {
                x.len() == y.len()
                    && x.iter().all(|(name, l)| {
                        y.get(name)
                            .is_some_and(|r| equal(l, r, CompareMode::Fuzzy))
                    })
            }
            (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
                false
            }
            _ => scalar_token(a) == scalar_token(b),
        },
    }
}

fn equal_strict(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => number_value(x) == number_value(y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| equal_strict(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(name, l)| y.get(name).is_some_and(|r| equal_strict(l, r)))
        }
        _ => false,
    }
}

fn number_value(n: &serde_json::Number) -> f64 {
    n.as_f64().unwrap_or(f64::NAN)
}

/// Canonical token for a scalar under fuzzy comparison; `None` for lists
/// and objects. Numeric strings and numbers share one numeric token,
/// boolean strings (case-insensitive) share the boolean tokens, and the
/// literal string "null" meets null.
pub fn scalar_token(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some("null".to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(number_token(number_value(n))),
        Value::String(s) => {
            if let Ok(parsed) = s.parse::<f64>() {
                if parsed.is_finite() {
                    return Some(number_token(parsed));
                }
            }
            if s.eq_ignore_ascii_case("true") {
                return Some("true".to_string());
            }
            if s.eq_ignore_ascii_case("false") {
                return Some("false".to_string());
            }
            if s.eq_ignore_ascii_case("null") {
                return Some("null".to_string());
            }
            Some(s.clone())
        }
        _ => None,
    }
}

/// One numeric token per numeric value: 3, 3.0 and "3" all yield "3".
fn number_token(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Total order over values, used only for sorting — never as the duplicate
/// test. Cross-kind order is by kind rank (null < bool < number < string <
/// list < object); within a kind: numbers by magnitude, strings
/// lexicographic, false < true, lists element-wise then by length, objects
/// by first-differing entry with entries sorted by name, then by length.
/// Sorting object entries keeps the order consistent with equality, which
/// ignores entry order: equal objects must sort adjacent. Under fuzzy mode
/// scalars are canonicalized first so equivalent representations sort
/// adjacent.
pub fn order(a: &Value, b: &Value, mode: CompareMode) -> Ordering {
    if mode == CompareMode::Fuzzy {
        if let (Some(x), Some(y)) = (canon_scalar(a), canon_scalar(b)) {
            return x.order(&y);
        }
    }
    let (ka, kb) = (kind(a), kind(b));
    if ka != kb {
        return ka.cmp(&kb);
    }
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => number_value(x).total_cmp(&number_value(y)),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y) {
                let ord = order(l, r, mode);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => {
            let mut xs: Vec<(&String, &Value)> = x.iter().collect();
            let mut ys: Vec<(&String, &Value)> = y.iter().collect();
            xs.sort_by(|l, r| l.0.cmp(r.0));
            ys.sort_by(|l, r| l.0.cmp(r.0));
            for ((name_l, l), (name_r, r)) in xs.iter().zip(&ys) {
                let ord = name_l.cmp(name_r).then_with(|| order(l, r, mode));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => Ordering::Equal,
    }
}

/// A scalar reduced to its fuzzy comparison slot.
enum CanonScalar {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
}

impl CanonScalar {
    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Num(_) => 2,
            Self::Str(_) => 3,
        }
    }

    fn order(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Bool(x), Self::Bool(y)) => x.cmp(y),
            (Self::Num(x), Self::Num(y)) => x.total_cmp(y),
            (Self::Str(x), Self::Str(y)) => x.cmp(y),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn canon_scalar(value: &Value) -> Option<CanonScalar> {
    match value {
        Value::Null => Some(CanonScalar::Null),
        Value::Bool(b) => Some(CanonScalar::Bool(*b)),
        Value::Number(n) => Some(CanonScalar::Num(number_value(n))),
        Value::String(s) => {
            if let Ok(parsed) = s.parse::<f64>() {
                if parsed.is_finite() {
                    return Some(CanonScalar::Num(parsed));
                }
            }
            if s.eq_ignore_ascii_case("true") {
                return Some(CanonScalar::Bool(true));
            }
            if s.eq_ignore_ascii_case("false") {
                return Some(CanonScalar::Bool(false));
            }
            if s.eq_ignore_ascii_case("null") {
                return Some(CanonScalar::Null);
            }
            Some(CanonScalar::Str(s.clone()))
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Composite keys
// ---------------------------------------------------------------------------

/// Resolve a path list into an ordered key tuple. Absent elements come
/// through as `None`, distinguishable from a present null.
pub fn composite_key(record: &Record, paths: &[FieldPath]) -> Vec<Option<Value>> {
    paths.iter().map(|p| resolve(record, p).cloned()).collect()
}

/// Equality of one key slot; two absents are equal, absent never equals
/// a present value.
pub fn slot_equal(a: Option<&Value>, b: Option<&Value>, mode: CompareMode) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => equal(x, y, mode),
        _ => false,
    }
}

/// Ordering of one key slot; absent sorts below every present value.
pub fn slot_order(a: Option<&Value>, b: Option<&Value>, mode: CompareMode) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => order(x, y, mode),
    }
}

/// Lexicographic order over two key tuples of equal arity.
pub fn key_order(a: &[Option<Value>], b: &[Option<Value>], mode: CompareMode) -> Ordering {
    for (l, r) in a.iter().zip(b) {
        let ord = slot_order(l.as_ref(), r.as_ref(), mode);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Strict deep equality over two key tuples. The Deduplicator's duplicate
/// test always uses this regardless of the configured mode.
pub fn key_equal_strict(a: &[Option<Value>], b: &[Option<Value>]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(l, r)| slot_equal(l.as_ref(), r.as_ref(), CompareMode::Strict))
}

/// Serialized bucket token for a fully-present composite key. Two keys get
/// the same token iff `equal` holds slot-wise under `mode`: numbers are
/// canonicalized in both modes (1 and 1.0 share a bucket), fuzzy mode
/// canonicalizes every scalar (3 and "3" share a bucket), and object keys
/// are sorted since entry order is irrelevant to equality.
pub fn key_token(values: &[Value], mode: CompareMode) -> String {
    let mut out = String::new();
    for value in values {
        canon(value, mode, &mut out);
        out.push('\u{1f}');
    }
    out
}

fn canon(value: &Value, mode: CompareMode, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for item in items {
                canon(item, mode, out);
                out.push(',');
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|x, y| x.0.cmp(y.0));
            out.push('{');
            for (name, child) in entries {
                out.push_str(&quoted(name));
                out.push(':');
                canon(child, mode, out);
                out.push(',');
            }
            out.push('}');
        }
        scalar => match mode {
            CompareMode::Fuzzy => {
                out.push('~');
                if let Some(token) = scalar_token(scalar) {
                    out.push_str(&quoted(&token));
                }
            }
            CompareMode::Strict => match scalar {
                Value::Null => out.push('z'),
                Value::Bool(b) => out.push_str(if *b { "b1" } else { "b0" }),
                Value::Number(n) => {
                    out.push('n');
                    out.push_str(&number_token(number_value(n)));
                }
                Value::String(s) => {
                    out.push('s');
                    out.push_str(&quoted(s));
                }
                // arrays/objects handled above
                _ => {}
            },
        },
    }
}

/// JSON-quoted string, so tokens containing structural characters cannot
/// collide with the canonical encoding around them.
fn quoted(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
