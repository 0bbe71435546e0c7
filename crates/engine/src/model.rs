use serde::{Deserialize, Serialize};

use crate::field::FieldPath;

/// One field value inside a record. JSON-shaped; objects keep insertion
/// order (`preserve_order` feature).
pub type Value = serde_json::Value;

/// A single semi-structured record: an ordered map from field name to value.
pub type Record = serde_json::Map<String, Value>;

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// Which input collection a record (or a preference) refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    A,
    B,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Strict = type-sensitive deep equality. Fuzzy = scalar representations
/// are coerced before comparing (3 equals "3", true equals "true").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareMode {
    Strict,
    Fuzzy,
}

impl Default for CompareMode {
    fn default() -> Self {
        Self::Strict
    }
}

impl std::fmt::Display for CompareMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Fuzzy => write!(f, "fuzzy"),
        }
    }
}

/// How many B records one A record may consume from its key bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiMatch {
    /// Take exactly the head of the bucket queue.
    First,
    /// Drain the entire remaining queue.
    All,
}

impl Default for MultiMatch {
    fn default() -> Self {
        Self::First
    }
}

/// How a matched pair is shaped into one emitted record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Copy the A record wholesale.
    PreferA,
    /// Copy the B record wholesale.
    PreferB,
    /// Start from the preferred side, overwrite exactly `except` with the
    /// other side's values.
    Mix { prefer: Side, except: Vec<FieldPath> },
    /// Emit a composite record carrying both originals.
    IncludeBoth,
}

impl Default for Resolution {
    fn default() -> Self {
        Self::PreferA
    }
}

// ---------------------------------------------------------------------------
// Key specs
// ---------------------------------------------------------------------------

/// One element of the Matcher's composite join key: a path into each side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub input_a: FieldPath,
    pub input_b: FieldPath,
}

impl KeyPair {
    /// Same path on both sides.
    pub fn same(path: &str) -> Self {
        Self {
            input_a: FieldPath::parse(path),
            input_b: FieldPath::parse(path),
        }
    }
}

/// Which fields the Deduplicator compares on. Resolved once per run into a
/// concrete ordered path list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupeKeys {
    /// Every leaf path seen anywhere in the batch, first-seen order.
    AllFields,
    /// AllFields minus the listed paths.
    AllExcept(Vec<FieldPath>),
    /// Exactly the listed paths.
    Selected(Vec<FieldPath>),
}

impl Default for DedupeKeys {
    fn default() -> Self {
        Self::AllFields
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Full configuration for one `compare` call.
#[derive(Debug, Clone, Serialize)]
pub struct CompareOptions {
    pub keys: Vec<KeyPair>,
    pub mode: CompareMode,
    pub multi_match: MultiMatch,
    pub resolution: Resolution,
    /// Fields ignored by the same/different decision.
    pub skip_fields: Vec<FieldPath>,
    /// Route records with unresolvable key fields to their side's only-in
    /// bucket instead of failing.
    pub lenient_keys: bool,
}

impl CompareOptions {
    pub fn new(keys: Vec<KeyPair>) -> Self {
        Self {
            keys,
            mode: CompareMode::Strict,
            multi_match: MultiMatch::First,
            resolution: Resolution::PreferA,
            skip_fields: Vec::new(),
            lenient_keys: false,
        }
    }
}

/// Full configuration for one `dedupe` call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DedupeOptions {
    pub keys: DedupeKeys,
    pub mode: CompareMode,
    /// Return only the key-field paths of each kept record.
    pub project_only: bool,
}

// ---------------------------------------------------------------------------
// Classified output
// ---------------------------------------------------------------------------

/// An emitted record: either one plain record, or a composite exposing both
/// originals of a matched pair with the key values hoisted to top level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutputRecord {
    Plain(Record),
    Composite {
        #[serde(flatten)]
        key: Record,
        input_a: Record,
        input_b: Record,
    },
}

/// A record tagged with provenance: the originating index in A and/or B.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_a: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_b: Option<usize>,
    pub record: OutputRecord,
}

impl ClassifiedRecord {
    pub fn from_a(index: usize, record: Record) -> Self {
        Self {
            index_a: Some(index),
            index_b: None,
            record: OutputRecord::Plain(record),
        }
    }

    pub fn from_b(index: usize, record: Record) -> Self {
        Self {
            index_a: None,
            index_b: Some(index),
            record: OutputRecord::Plain(record),
        }
    }
}

/// The four classified streams produced by the Matcher. `only_in_a` and
/// `only_in_b` preserve the relative order of their source collection.
#[derive(Debug, Default, Serialize)]
pub struct CompareOutput {
    pub only_in_a: Vec<ClassifiedRecord>,
    pub same: Vec<ClassifiedRecord>,
    pub different: Vec<ClassifiedRecord>,
    pub only_in_b: Vec<ClassifiedRecord>,
}

// ---------------------------------------------------------------------------
// Run results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub engine_version: String,
    pub run_at: String,
}

impl RunMeta {
    pub fn now() -> Self {
        Self {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareSummary {
    pub input_a: usize,
    pub input_b: usize,
    pub only_in_a: usize,
    pub same: usize,
    pub different: usize,
    pub only_in_b: usize,
}

impl CompareSummary {
    pub fn from_output(input_a: usize, input_b: usize, output: &CompareOutput) -> Self {
        Self {
            input_a,
            input_b,
            only_in_a: output.only_in_a.len(),
            same: output.same.len(),
            different: output.different.len(),
            only_in_b: output.only_in_b.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CompareResult {
    pub meta: RunMeta,
    pub summary: CompareSummary,
    pub output: CompareOutput,
}

#[derive(Debug, Clone, Serialize)]
pub struct DedupeSummary {
    pub input: usize,
    pub kept: usize,
    pub removed: usize,
}

#[derive(Debug, Serialize)]
pub struct DedupeResult {
    pub meta: RunMeta,
    pub summary: DedupeSummary,
    pub records: Vec<Record>,
}
