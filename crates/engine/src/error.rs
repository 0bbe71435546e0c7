use std::fmt;

use crate::equality::ValueKind;
use crate::field::FieldPath;
use crate::model::Side;

/// Engine failures. All deterministic and non-retryable: they indicate
/// malformed configuration or malformed input, never transient state.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// No key fields resolved for a comparison/dedup key.
    EmptyKeySpec,
    /// A Matcher input record lacks a required key field (strict key mode).
    MissingKeyField {
        side: Side,
        path: FieldPath,
        index: usize,
    },
    /// A Deduplicator key field is absent on some record.
    MissingField {
        path: FieldPath,
        /// The record owns a literal top-level field named by the full
        /// dotted path, so dot-notation addressing is the likely culprit.
        hint_dot_notation: bool,
    },
    /// The same key field holds values of different kinds across the
    /// Deduplicator's input collection.
    InconsistentFieldType {
        path: FieldPath,
        first: ValueKind,
        second: ValueKind,
    },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty key list, bad mix reference, etc.).
    ConfigValidation(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyKeySpec => write!(f, "no key fields to compare on"),
            Self::MissingKeyField { side, path, index } => {
                write!(f, "input {side}, record {index}: key field '{path}' not found")
            }
            Self::MissingField { path, hint_dot_notation } => {
                write!(f, "field '{path}' is missing on some records")?;
                if *hint_dot_notation {
                    write!(
                        f,
                        " (the name contains '.' and is being read as a nested path; \
                         disable dot notation to address the field literally)"
                    )?;
                }
                Ok(())
            }
            Self::InconsistentFieldType { path, first, second } => {
                write!(
                    f,
                    "field '{path}' holds values of different types ({first} vs {second})"
                )
            }
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
