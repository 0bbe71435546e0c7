//! Two-input Matcher: classifies every record of two ordered collections
//! into only-in-A / same / different / only-in-B against a composite key.

use std::collections::{HashMap, VecDeque};

use crate::equality::{equal, key_token};
use crate::error::EngineError;
use crate::field::{remove_path, resolve, set_path, FieldPath};
use crate::model::{
    ClassifiedRecord, CompareOptions, CompareOutput, MultiMatch, OutputRecord, Record, Resolution,
    Side, Value,
};

/// Compare two ordered record collections against the composite key in
/// `opts.keys`.
///
/// B is indexed by serialized composite key into order-preserving queues;
/// A is scanned left to right, consuming B's queue state as it stands at
/// that point. This greedy consumption is a behavioral contract: with
/// `MultiMatch::First`, an earlier A record can starve a later one that
/// shares its key. Never-consumed B records are swept into `only_in_b` in
/// B's original order.
pub fn compare(
    input_a: &[Record],
    input_b: &[Record],
    opts: &CompareOptions,
) -> Result<CompareOutput, EngineError> {
    if opts.keys.is_empty() {
        return Err(EngineError::EmptyKeySpec);
    }

    let a_paths: Vec<&FieldPath> = opts.keys.iter().map(|k| &k.input_a).collect();
    let b_paths: Vec<&FieldPath> = opts.keys.iter().map(|k| &k.input_b).collect();

    let mut output = CompareOutput::default();

    // Index over B: serialized composite key → queue of not-yet-consumed
    // indices, preserving B's relative order within each bucket. Records
    // with unresolvable keys never enter the index (lenient mode) and so
    // surface in the final only_in_b sweep.
    let mut index: HashMap<String, VecDeque<usize>> = HashMap::new();
    for (bi, record) in input_b.iter().enumerate() {
        match record_key(record, &b_paths) {
            Ok(key) => index
                .entry(key_token(&key, opts.mode))
                .or_default()
                .push_back(bi),
            Err(path) => {
                if !opts.lenient_keys {
                    return Err(EngineError::MissingKeyField {
                        side: Side::B,
                        path: path.clone(),
                        index: bi,
                    });
                }
            }
        }
    }

    let mut b_consumed = vec![false; input_b.len()];

    for (ai, record) in input_a.iter().enumerate() {
        let key = match record_key(record, &a_paths) {
            Ok(key) => key,
            Err(path) => {
                if !opts.lenient_keys {
                    return Err(EngineError::MissingKeyField {
                        side: Side::A,
                        path: path.clone(),
                        index: ai,
                    });
                }
                output
                    .only_in_a
                    .push(ClassifiedRecord::from_a(ai, record.clone()));
                continue;
            }
        };

        let candidates: Vec<usize> = match index.get_mut(&key_token(&key, opts.mode)) {
            Some(queue) if !queue.is_empty() => match opts.multi_match {
                MultiMatch::First => queue.pop_front().into_iter().collect(),
                MultiMatch::All => queue.drain(..).collect(),
            },
            _ => {
                output
                    .only_in_a
                    .push(ClassifiedRecord::from_a(ai, record.clone()));
                continue;
            }
        };

        for bi in candidates {
            b_consumed[bi] = true;
            let other = &input_b[bi];
            let same = pair_fields_equal(record, other, opts);
            let classified = ClassifiedRecord {
                index_a: Some(ai),
                index_b: Some(bi),
                record: shape_pair(record, other, &key, opts),
            };
            if same {
                output.same.push(classified);
            } else {
                output.different.push(classified);
            }
        }
    }

    for (bi, record) in input_b.iter().enumerate() {
        if !b_consumed[bi] {
            output
                .only_in_b
                .push(ClassifiedRecord::from_b(bi, record.clone()));
        }
    }

    Ok(output)
}

/// Composite key for one record; the first unresolvable path aborts.
fn record_key<'a>(
    record: &Record,
    paths: &[&'a FieldPath],
) -> Result<Vec<Value>, &'a FieldPath> {
    paths
        .iter()
        .map(|path| resolve(record, path).cloned().ok_or(*path))
        .collect()
}

/// The same/different decision: equality over everything both records
/// carry outside the key fields and `skip_fields`. Implemented by
/// stripping those paths from clones and deep-comparing the remainder, so
/// a field present on one side only counts as a difference.
fn pair_fields_equal(a: &Record, b: &Record, opts: &CompareOptions) -> bool {
    let a_rest = stripped(a, opts.keys.iter().map(|k| &k.input_a), &opts.skip_fields);
    let b_rest = stripped(b, opts.keys.iter().map(|k| &k.input_b), &opts.skip_fields);
    equal(&Value::Object(a_rest), &Value::Object(b_rest), opts.mode)
}

fn stripped<'a>(
    record: &Record,
    key_paths: impl Iterator<Item = &'a FieldPath>,
    skip_fields: &[FieldPath],
) -> Record {
    let mut copy = record.clone();
    for path in key_paths {
        remove_path(&mut copy, path);
    }
    for path in skip_fields {
        remove_path(&mut copy, path);
    }
    copy
}

/// Shape one matched pair per the resolution policy. This only decides
/// which values appear in the emitted record; it never influences the
/// same/different classification.
fn shape_pair(a: &Record, b: &Record, key: &[Value], opts: &CompareOptions) -> OutputRecord {
    match &opts.resolution {
        Resolution::PreferA => OutputRecord::Plain(a.clone()),
        Resolution::PreferB => OutputRecord::Plain(b.clone()),
        Resolution::Mix { prefer, except } => {
            let (base, other) = match prefer {
                Side::A => (a, b),
                Side::B => (b, a),
            };
            let mut merged = base.clone();
            for path in except {
                match resolve(other, path) {
                    Some(value) => set_path(&mut merged, path, value.clone()),
                    None => remove_path(&mut merged, path),
                }
            }
            OutputRecord::Plain(merged)
        }
        Resolution::IncludeBoth => {
            let mut key_map = Record::new();
            for (pair, value) in opts.keys.iter().zip(key) {
                key_map.insert(pair.input_a.dotted(), value.clone());
            }
            OutputRecord::Composite {
                key: key_map,
                input_a: a.clone(),
                input_b: b.clone(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CompareMode, KeyPair};
    use serde_json::json;

    fn rec(value: serde_json::Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn recs(values: serde_json::Value) -> Vec<Record> {
        match values {
            Value::Array(items) => items
                .into_iter()
                .map(|v| match v {
                    Value::Object(map) => map,
                    other => panic!("not an object: {other}"),
                })
                .collect(),
            other => panic!("not an array: {other}"),
        }
    }

    fn id_opts() -> CompareOptions {
        CompareOptions::new(vec![KeyPair::same("id")])
    }

    fn plain(classified: &ClassifiedRecord) -> &Record {
        match &classified.record {
            OutputRecord::Plain(record) => record,
            OutputRecord::Composite { .. } => panic!("expected plain record"),
        }
    }

    #[test]
    fn identical_records_classify_as_same() {
        let a = recs(json!([{"id": 1, "v": "x"}]));
        let b = recs(json!([{"id": 1, "v": "x"}]));
        let out = compare(&a, &b, &id_opts()).unwrap();
        assert_eq!(out.same.len(), 1);
        assert!(out.only_in_a.is_empty());
        assert!(out.different.is_empty());
        assert!(out.only_in_b.is_empty());
        assert_eq!(out.same[0].index_a, Some(0));
        assert_eq!(out.same[0].index_b, Some(0));
    }

    #[test]
    fn differing_field_classifies_as_different_prefer_b() {
        let a = recs(json!([{"id": 1, "v": "x"}]));
        let b = recs(json!([{"id": 1, "v": "y"}]));
        let mut opts = id_opts();
        opts.resolution = Resolution::PreferB;
        let out = compare(&a, &b, &opts).unwrap();
        assert_eq!(out.different.len(), 1);
        assert_eq!(
            Value::Object(plain(&out.different[0]).clone()),
            json!({"id": 1, "v": "y"})
        );
    }

    #[test]
    fn multi_match_all_drains_the_bucket() {
        let a = recs(json!([{"id": 1}]));
        let b = recs(json!([{"id": 1}, {"id": 1, "v": 2}]));
        let mut opts = id_opts();
        opts.multi_match = MultiMatch::All;
        let out = compare(&a, &b, &opts).unwrap();
        assert_eq!(out.same.len(), 1);
        assert_eq!(out.different.len(), 1);
        assert!(out.only_in_b.is_empty());
        assert_eq!(out.same[0].index_b, Some(0));
        assert_eq!(out.different[0].index_b, Some(1));
    }

    #[test]
    fn first_only_is_greedy_left_to_right() {
        // two A records share a key; B has one candidate. The earlier A
        // record consumes it, starving the later one.
        let a = recs(json!([{"id": 1, "v": "first"}, {"id": 1, "v": "second"}]));
        let b = recs(json!([{"id": 1, "v": "first"}]));
        let out = compare(&a, &b, &id_opts()).unwrap();
        assert_eq!(out.same.len(), 1);
        assert_eq!(out.same[0].index_a, Some(0));
        assert_eq!(out.only_in_a.len(), 1);
        assert_eq!(out.only_in_a[0].index_a, Some(1));
        assert!(out.only_in_b.is_empty());
    }

    #[test]
    fn unmatched_records_keep_source_order() {
        let a = recs(json!([{"id": 3}, {"id": 1}, {"id": 4}]));
        let b = recs(json!([{"id": 9}, {"id": 1}, {"id": 8}]));
        let out = compare(&a, &b, &id_opts()).unwrap();
        let a_only: Vec<_> = out.only_in_a.iter().map(|c| c.index_a).collect();
        let b_only: Vec<_> = out.only_in_b.iter().map(|c| c.index_b).collect();
        assert_eq!(a_only, vec![Some(0), Some(2)]);
        assert_eq!(b_only, vec![Some(0), Some(2)]);
    }

    #[test]
    fn empty_key_spec_fails_fast() {
        let err = compare(&[], &[], &CompareOptions::new(vec![])).unwrap_err();
        assert_eq!(err, EngineError::EmptyKeySpec);
    }

    #[test]
    fn missing_key_field_is_an_error_in_strict_key_mode() {
        let a = recs(json!([{"id": 1}, {"name": "no id"}]));
        let b = recs(json!([{"id": 1}]));
        let err = compare(&a, &b, &id_opts()).unwrap_err();
        assert_eq!(
            err,
            EngineError::MissingKeyField {
                side: Side::A,
                path: FieldPath::parse("id"),
                index: 1,
            }
        );
    }

    #[test]
    fn lenient_keys_route_to_only_in_buckets() {
        let a = recs(json!([{"name": "no id"}, {"id": 1}]));
        let b = recs(json!([{"id": 1}, {"other": true}]));
        let mut opts = id_opts();
        opts.lenient_keys = true;
        let out = compare(&a, &b, &opts).unwrap();
        assert_eq!(out.same.len(), 1);
        assert_eq!(out.only_in_a.len(), 1);
        assert_eq!(out.only_in_a[0].index_a, Some(0));
        assert_eq!(out.only_in_b.len(), 1);
        assert_eq!(out.only_in_b[0].index_b, Some(1));
    }

    #[test]
    fn null_key_is_present_not_missing() {
        let a = recs(json!([{"id": null, "v": 1}]));
        let b = recs(json!([{"id": null, "v": 1}]));
        let out = compare(&a, &b, &id_opts()).unwrap();
        assert_eq!(out.same.len(), 1);
    }

    #[test]
    fn cross_side_key_paths() {
        let a = recs(json!([{"id": 1, "v": "x"}]));
        let b = recs(json!([{"user": {"ref": 1}, "v": "x"}]));
        let opts = CompareOptions::new(vec![KeyPair {
            input_a: FieldPath::parse("id"),
            input_b: FieldPath::parse("user.ref"),
        }]);
        let out = compare(&a, &b, &opts).unwrap();
        // key fields are excluded from the same/different decision; the
        // "user" object on B is pruned once its only leaf is stripped
        assert_eq!(out.same.len(), 1);
    }

    #[test]
    fn skip_fields_are_ignored_by_the_decision() {
        let a = recs(json!([{"id": 1, "v": "x", "updated_at": "2026-01-01"}]));
        let b = recs(json!([{"id": 1, "v": "x", "updated_at": "2026-02-02"}]));
        let mut opts = id_opts();
        let out = compare(&a, &b, &opts).unwrap();
        assert_eq!(out.different.len(), 1);

        opts.skip_fields = vec![FieldPath::parse("updated_at")];
        let out = compare(&a, &b, &opts).unwrap();
        assert_eq!(out.same.len(), 1);
    }

    #[test]
    fn fuzzy_mode_matches_coerced_keys_and_fields() {
        let a = recs(json!([{"id": 1, "count": 5}]));
        let b = recs(json!([{"id": "1", "count": "5"}]));
        let mut opts = id_opts();
        let out = compare(&a, &b, &opts).unwrap();
        assert_eq!(out.only_in_a.len(), 1, "strict keys must not coerce");

        opts.mode = CompareMode::Fuzzy;
        let out = compare(&a, &b, &opts).unwrap();
        assert_eq!(out.same.len(), 1);
    }

    #[test]
    fn mix_resolution_overwrites_exactly_the_except_fields() {
        let a = recs(json!([{"id": 1, "v": "a", "note": "keep"}]));
        let b = recs(json!([{"id": 1, "v": "b", "note": "drop", "extra": 9}]));
        let mut opts = id_opts();
        opts.resolution = Resolution::Mix {
            prefer: Side::A,
            except: vec![FieldPath::parse("v")],
        };
        let out = compare(&a, &b, &opts).unwrap();
        assert_eq!(out.different.len(), 1);
        assert_eq!(
            Value::Object(plain(&out.different[0]).clone()),
            json!({"id": 1, "v": "b", "note": "keep"})
        );
    }

    #[test]
    fn mix_removes_except_fields_absent_on_the_other_side() {
        let a = recs(json!([{"id": 1, "v": "a"}]));
        let b = recs(json!([{"id": 1}]));
        let mut opts = id_opts();
        opts.resolution = Resolution::Mix {
            prefer: Side::A,
            except: vec![FieldPath::parse("v")],
        };
        let out = compare(&a, &b, &opts).unwrap();
        assert_eq!(out.different.len(), 1);
        assert_eq!(
            Value::Object(plain(&out.different[0]).clone()),
            json!({"id": 1})
        );
    }

    #[test]
    fn include_both_hoists_keys_and_keeps_both_originals() {
        let a = recs(json!([{"id": 1, "v": "x"}]));
        let b = recs(json!([{"id": 1, "v": "y"}]));
        let mut opts = id_opts();
        opts.resolution = Resolution::IncludeBoth;
        let out = compare(&a, &b, &opts).unwrap();
        match &out.different[0].record {
            OutputRecord::Composite { key, input_a, input_b } => {
                assert_eq!(key.get("id"), Some(&json!(1)));
                assert_eq!(Value::Object(input_a.clone()), json!({"id": 1, "v": "x"}));
                assert_eq!(Value::Object(input_b.clone()), json!({"id": 1, "v": "y"}));
            }
            OutputRecord::Plain(_) => panic!("expected composite record"),
        }
    }

    #[test]
    fn partition_accounts_for_every_record_under_first_only() {
        let a = recs(json!([
            {"id": 1}, {"id": 2, "v": 1}, {"id": 2, "v": 2}, {"id": 5}
        ]));
        let b = recs(json!([
            {"id": 2, "v": 1}, {"id": 3}, {"id": 1}, {"id": 2, "v": 9}
        ]));
        let out = compare(&a, &b, &id_opts()).unwrap();
        let a_total = out.only_in_a.len() + out.same.len() + out.different.len();
        let b_total = out.only_in_b.len() + out.same.len() + out.different.len();
        assert_eq!(a_total, a.len());
        assert_eq!(b_total, b.len());
    }
}
