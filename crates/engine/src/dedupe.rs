//! Single-input Deduplicator: order-preserving duplicate removal over a
//! configurable comparison-key set, with whole-collection type guarantees.

use crate::equality::{composite_key, key_equal_strict, key_order, kind, ValueKind};
use crate::error::EngineError;
use crate::field::{flatten, project, resolve, FieldPath};
use crate::model::{DedupeKeys, DedupeOptions, Record, Value};

/// Remove duplicate records, keeping the first occurrence of each key and
/// preserving the input order of everything kept.
///
/// Works in two passes: an O(n log n) stable sort over the key tuples
/// (using the total value order) followed by a single forward scan that
/// marks a record as a duplicate iff its key tuple is strictly deep-equal
/// to the last kept one. The duplicate test is always strict, regardless
/// of the configured mode; fuzzy mode only affects sort adjacency.
///
/// Flatten-derived key paths (`AllFields` / `AllExcept`) may be absent on
/// some records; those slots compare as Absent. Only explicitly `Selected`
/// paths are required to be present everywhere.
pub fn dedupe(input: &[Record], opts: &DedupeOptions) -> Result<Vec<Record>, EngineError> {
    let (paths, require_presence) = resolve_key_paths(input, &opts.keys)?;
    if input.is_empty() {
        return Ok(Vec::new());
    }

    check_type_consistency(input, &paths, require_presence)?;

    let keys: Vec<Vec<Option<Value>>> = input
        .iter()
        .map(|record| composite_key(record, &paths))
        .collect();

    // sort_by is stable, so equal keys keep their original relative order
    // and the forward scan always keeps the earliest occurrence.
    let mut by_key: Vec<usize> = (0..input.len()).collect();
    by_key.sort_by(|&x, &y| key_order(&keys[x], &keys[y], opts.mode));

    let mut removed = vec![false; input.len()];
    let mut last_kept: Option<usize> = None;
    for &i in &by_key {
        match last_kept {
            Some(j) if key_equal_strict(&keys[i], &keys[j]) => removed[i] = true,
            _ => last_kept = Some(i),
        }
    }

    let kept = input
        .iter()
        .enumerate()
        .filter(|(i, _)| !removed[*i])
        .map(|(_, record)| record);

    Ok(if opts.project_only {
        kept.map(|record| project(record, &paths)).collect()
    } else {
        kept.cloned().collect()
    })
}

/// Resolve the key spec into a concrete ordered path list, plus whether
/// every path must be present on every record. Flatten-derived lists are
/// allowed to be partially absent (a leaf first seen on a later record is
/// simply Absent on the earlier ones); an explicitly selected list is not.
fn resolve_key_paths(
    input: &[Record],
    keys: &DedupeKeys,
) -> Result<(Vec<FieldPath>, bool), EngineError> {
    match keys {
        DedupeKeys::AllFields => Ok((flatten(input), false)),
        DedupeKeys::AllExcept(excluded) => {
            let paths: Vec<FieldPath> = flatten(input)
                .into_iter()
                .filter(|path| !excluded.contains(path))
                .collect();
            if paths.is_empty() {
                return Err(EngineError::EmptyKeySpec);
            }
            Ok((paths, false))
        }
        DedupeKeys::Selected(paths) => {
            if paths.is_empty() {
                return Err(EngineError::EmptyKeySpec);
            }
            Ok((paths.clone(), true))
        }
    }
}

/// All present values of one key field must share one runtime kind across
/// the entire collection; with `require_presence`, the field must also be
/// present on every record. A violation aborts the whole call: key
/// integrity is a precondition for the sort structure, so there is no
/// per-record skipping.
fn check_type_consistency(
    input: &[Record],
    paths: &[FieldPath],
    require_presence: bool,
) -> Result<(), EngineError> {
    for path in paths {
        let mut first_kind: Option<ValueKind> = None;
        for record in input {
            let value = match resolve(record, path) {
                Some(value) => value,
                None if require_presence => {
                    return Err(EngineError::MissingField {
                        path: path.clone(),
                        hint_dot_notation: path.is_nested()
                            && record.contains_key(&path.dotted()),
                    })
                }
                None => continue,
            };
            let k = kind(value);
            match first_kind {
                None => first_kind = Some(k),
                Some(first) if first != k => {
                    return Err(EngineError::InconsistentFieldType {
                        path: path.clone(),
                        first,
                        second: k,
                    })
                }
                _ => {}
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
