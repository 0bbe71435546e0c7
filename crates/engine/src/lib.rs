//! `collate-engine` — Generic record matching and deduplication engine.
//!
//! Pure engine crate: receives pre-loaded records, returns classified results.
//! No CLI or IO dependencies.

pub mod config;
pub mod dedupe;
pub mod engine;
pub mod equality;
pub mod error;
pub mod field;
pub mod matcher;
pub mod model;

pub use config::{CompareConfig, DedupeConfig};
pub use dedupe::dedupe;
pub use engine::{run_compare, run_dedupe};
pub use error::EngineError;
pub use field::FieldPath;
pub use matcher::compare;
pub use model::{
    ClassifiedRecord, CompareOptions, CompareOutput, CompareResult, DedupeKeys, DedupeOptions,
    DedupeResult, Record, Value,
};
