//! Run layer: wraps the pure operations with run metadata and summaries.

use crate::dedupe::dedupe;
use crate::error::EngineError;
use crate::matcher::compare;
use crate::model::{
    CompareOptions, CompareResult, CompareSummary, DedupeOptions, DedupeResult, DedupeSummary,
    Record, RunMeta,
};

/// Run a comparison and wrap the classified output with meta + summary.
pub fn run_compare(
    input_a: &[Record],
    input_b: &[Record],
    opts: &CompareOptions,
) -> Result<CompareResult, EngineError> {
    let output = compare(input_a, input_b, opts)?;
    Ok(CompareResult {
        meta: RunMeta::now(),
        summary: CompareSummary::from_output(input_a.len(), input_b.len(), &output),
        output,
    })
}

/// Run a deduplication and wrap the kept records with meta + summary.
pub fn run_dedupe(input: &[Record], opts: &DedupeOptions) -> Result<DedupeResult, EngineError> {
    let records = dedupe(input, opts)?;
    Ok(DedupeResult {
        meta: RunMeta::now(),
        summary: DedupeSummary {
            input: input.len(),
            kept: records.len(),
            removed: input.len() - records.len(),
        },
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DedupeKeys, KeyPair};
    use serde_json::json;

    fn recs(values: serde_json::Value) -> Vec<Record> {
        match values {
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|v| match v {
                    serde_json::Value::Object(map) => map,
                    other => panic!("not an object: {other}"),
                })
                .collect(),
            other => panic!("not an array: {other}"),
        }
    }

    #[test]
    fn compare_summary_counts_match_output() {
        let a = recs(json!([{"id": 1, "v": 1}, {"id": 2, "v": 2}, {"id": 9, "v": 9}]));
        let b = recs(json!([{"id": 1, "v": 1}, {"id": 2, "v": 5}, {"id": 7, "v": 7}]));
        let result =
            run_compare(&a, &b, &CompareOptions::new(vec![KeyPair::same("id")])).unwrap();
        assert_eq!(result.summary.input_a, 3);
        assert_eq!(result.summary.input_b, 3);
        assert_eq!(result.summary.same, 1);
        assert_eq!(result.summary.different, 1);
        assert_eq!(result.summary.only_in_a, 1);
        assert_eq!(result.summary.only_in_b, 1);
        assert!(!result.meta.engine_version.is_empty());
    }

    #[test]
    fn dedupe_summary_counts_removed() {
        let input = recs(json!([{"id": 1}, {"id": 1}, {"id": 2}]));
        let opts = DedupeOptions {
            keys: DedupeKeys::Selected(vec![crate::field::FieldPath::parse("id")]),
            ..DedupeOptions::default()
        };
        let result = run_dedupe(&input, &opts).unwrap();
        assert_eq!(result.summary.input, 3);
        assert_eq!(result.summary.kept, 2);
        assert_eq!(result.summary.removed, 1);
    }
}
