//! Typed TOML configuration: the translation from user-facing option text
//! into the engine's option structs.

use serde::Deserialize;

use crate::error::EngineError;
use crate::field::FieldPath;
use crate::model::{
    CompareMode, CompareOptions, DedupeKeys, DedupeOptions, KeyPair, MultiMatch, Resolution, Side,
};

// ---------------------------------------------------------------------------
// Compare config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CompareConfig {
    #[serde(default = "default_compare_kind")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub keys: Vec<KeyField>,
    #[serde(default)]
    pub mode: CompareMode,
    #[serde(default)]
    pub multiple_matches: MultiMatch,
    #[serde(default)]
    pub resolution: ResolutionKind,
    #[serde(default)]
    pub mix: Option<MixConfig>,
    #[serde(default)]
    pub skip_fields: Vec<String>,
    #[serde(default)]
    pub lenient_keys: bool,
}

fn default_compare_kind() -> String {
    "compare".into()
}

/// One composite-key element. Either `field` (same path on both sides) or
/// both `input_a` and `input_b`.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyField {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub input_a: Option<String>,
    #[serde(default)]
    pub input_b: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    PreferA,
    PreferB,
    Mix,
    IncludeBoth,
}

impl Default for ResolutionKind {
    fn default() -> Self {
        Self::PreferA
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MixConfig {
    pub prefer: Side,
    #[serde(default)]
    pub except: Vec<String>,
}

impl CompareConfig {
    pub fn from_toml(input: &str) -> Result<Self, EngineError> {
        let config: CompareConfig =
            toml::from_str(input).map_err(|e| EngineError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.kind != "compare" {
            return Err(EngineError::ConfigValidation(format!(
                "kind must be \"compare\", got \"{}\"",
                self.kind
            )));
        }

        if self.keys.is_empty() {
            return Err(EngineError::ConfigValidation(
                "at least one key field is required".into(),
            ));
        }

        for (i, key) in self.keys.iter().enumerate() {
            match (&key.field, &key.input_a, &key.input_b) {
                (Some(field), None, None) => require_path(field, &format!("keys[{i}].field"))?,
                (None, Some(a), Some(b)) => {
                    require_path(a, &format!("keys[{i}].input_a"))?;
                    require_path(b, &format!("keys[{i}].input_b"))?;
                }
                _ => {
                    return Err(EngineError::ConfigValidation(format!(
                        "keys[{i}]: set either 'field' or both 'input_a' and 'input_b'"
                    )))
                }
            }
        }

        for (i, field) in self.skip_fields.iter().enumerate() {
            require_path(field, &format!("skip_fields[{i}]"))?;
        }

        match (self.resolution, &self.mix) {
            (ResolutionKind::Mix, None) => {
                return Err(EngineError::ConfigValidation(
                    "resolution = \"mix\" requires a [mix] table".into(),
                ))
            }
            (kind, Some(_)) if kind != ResolutionKind::Mix => {
                return Err(EngineError::ConfigValidation(
                    "a [mix] table requires resolution = \"mix\"".into(),
                ))
            }
            (ResolutionKind::Mix, Some(mix)) => {
                for (i, field) in mix.except.iter().enumerate() {
                    require_path(field, &format!("mix.except[{i}]"))?;
                    let is_key = self.keys.iter().any(|key| {
                        key.field.as_deref() == Some(field.as_str())
                            || key.input_a.as_deref() == Some(field.as_str())
                            || key.input_b.as_deref() == Some(field.as_str())
                    });
                    if is_key {
                        return Err(EngineError::ConfigValidation(format!(
                            "mix.except[{i}]: '{field}' is a key field"
                        )));
                    }
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Translate into the engine's option struct. Call after `validate`.
    pub fn to_options(&self) -> CompareOptions {
        let keys = self
            .keys
            .iter()
            .map(|key| match (&key.field, &key.input_a, &key.input_b) {
                (Some(field), _, _) => KeyPair::same(field),
                (None, Some(a), Some(b)) => KeyPair {
                    input_a: FieldPath::parse(a),
                    input_b: FieldPath::parse(b),
                },
                // rejected by validate
                _ => KeyPair::same(""),
            })
            .collect();

        let resolution = match (self.resolution, &self.mix) {
            (ResolutionKind::PreferA, _) => Resolution::PreferA,
            (ResolutionKind::PreferB, _) => Resolution::PreferB,
            (ResolutionKind::IncludeBoth, _) => Resolution::IncludeBoth,
            (ResolutionKind::Mix, Some(mix)) => Resolution::Mix {
                prefer: mix.prefer,
                except: mix.except.iter().map(|f| FieldPath::parse(f)).collect(),
            },
            // rejected by validate
            (ResolutionKind::Mix, None) => Resolution::PreferA,
        };

        CompareOptions {
            keys,
            mode: self.mode,
            multi_match: self.multiple_matches,
            resolution,
            skip_fields: self.skip_fields.iter().map(|f| FieldPath::parse(f)).collect(),
            lenient_keys: self.lenient_keys,
        }
    }
}

// ---------------------------------------------------------------------------
// Dedupe config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DedupeConfig {
    #[serde(default = "default_dedupe_kind")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub compare: DedupeKeyKind,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub mode: CompareMode,
    #[serde(default)]
    pub project_only: bool,
}

fn default_dedupe_kind() -> String {
    "dedupe".into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupeKeyKind {
    AllFields,
    AllExcept,
    Selected,
}

impl Default for DedupeKeyKind {
    fn default() -> Self {
        Self::AllFields
    }
}

impl DedupeConfig {
    pub fn from_toml(input: &str) -> Result<Self, EngineError> {
        let config: DedupeConfig =
            toml::from_str(input).map_err(|e| EngineError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.kind != "dedupe" {
            return Err(EngineError::ConfigValidation(format!(
                "kind must be \"dedupe\", got \"{}\"",
                self.kind
            )));
        }

        match self.compare {
            DedupeKeyKind::AllFields => {
                if !self.fields.is_empty() {
                    return Err(EngineError::ConfigValidation(
                        "'fields' must be empty when compare = \"all_fields\"".into(),
                    ));
                }
            }
            DedupeKeyKind::AllExcept | DedupeKeyKind::Selected => {
                if self.fields.is_empty() {
                    return Err(EngineError::ConfigValidation(format!(
                        "compare = \"{}\" requires a non-empty 'fields' list",
                        if self.compare == DedupeKeyKind::AllExcept {
                            "all_except"
                        } else {
                            "selected"
                        }
                    )));
                }
            }
        }

        for (i, field) in self.fields.iter().enumerate() {
            require_path(field, &format!("fields[{i}]"))?;
        }

        Ok(())
    }

    /// Translate into the engine's option struct. Call after `validate`.
    pub fn to_options(&self) -> DedupeOptions {
        let paths: Vec<FieldPath> = self.fields.iter().map(|f| FieldPath::parse(f)).collect();
        let keys = match self.compare {
            DedupeKeyKind::AllFields => DedupeKeys::AllFields,
            DedupeKeyKind::AllExcept => DedupeKeys::AllExcept(paths),
            DedupeKeyKind::Selected => DedupeKeys::Selected(paths),
        };
        DedupeOptions {
            keys,
            mode: self.mode,
            project_only: self.project_only,
        }
    }
}

fn require_path(path: &str, what: &str) -> Result<(), EngineError> {
    if path.trim().is_empty() || path.split('.').any(|segment| segment.is_empty()) {
        return Err(EngineError::ConfigValidation(format!(
            "{what}: '{path}' is not a valid field path"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_COMPARE: &str = r#"
kind = "compare"
name = "Orders vs Ledger"
mode = "fuzzy"
multiple_matches = "all"
resolution = "prefer_b"
skip_fields = ["updated_at"]
lenient_keys = true

[[keys]]
field = "order_id"

[[keys]]
input_a = "customer.id"
input_b = "customerId"
"#;

    #[test]
    fn parse_valid_compare() {
        let config = CompareConfig::from_toml(VALID_COMPARE).unwrap();
        assert_eq!(config.name, "Orders vs Ledger");
        assert_eq!(config.mode, CompareMode::Fuzzy);
        assert_eq!(config.multiple_matches, MultiMatch::All);
        assert_eq!(config.resolution, ResolutionKind::PreferB);
        assert!(config.lenient_keys);

        let opts = config.to_options();
        assert_eq!(opts.keys.len(), 2);
        assert_eq!(opts.keys[0], KeyPair::same("order_id"));
        assert_eq!(opts.keys[1].input_a, FieldPath::parse("customer.id"));
        assert_eq!(opts.keys[1].input_b, FieldPath::parse("customerId"));
        assert_eq!(opts.skip_fields, vec![FieldPath::parse("updated_at")]);
    }

    #[test]
    fn compare_defaults() {
        let config = CompareConfig::from_toml(
            r#"
[[keys]]
field = "id"
"#,
        )
        .unwrap();
        let opts = config.to_options();
        assert_eq!(opts.mode, CompareMode::Strict);
        assert_eq!(opts.multi_match, MultiMatch::First);
        assert_eq!(opts.resolution, Resolution::PreferA);
        assert!(!opts.lenient_keys);
    }

    #[test]
    fn reject_compare_without_keys() {
        let err = CompareConfig::from_toml("kind = \"compare\"").unwrap_err();
        assert!(err.to_string().contains("at least one key field"));
    }

    #[test]
    fn reject_key_with_one_sided_path() {
        let err = CompareConfig::from_toml(
            r#"
[[keys]]
input_a = "id"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("keys[0]"));
    }

    #[test]
    fn reject_empty_path_segment() {
        let err = CompareConfig::from_toml(
            r#"
[[keys]]
field = "user..id"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("not a valid field path"));
    }

    #[test]
    fn mix_requires_its_table_and_vice_versa() {
        let err = CompareConfig::from_toml(
            r#"
resolution = "mix"
[[keys]]
field = "id"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("[mix] table"));

        let err = CompareConfig::from_toml(
            r#"
[[keys]]
field = "id"
[mix]
prefer = "a"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("requires resolution"));
    }

    #[test]
    fn reject_mix_except_over_a_key_field() {
        let err = CompareConfig::from_toml(
            r#"
resolution = "mix"
[[keys]]
field = "id"
[mix]
prefer = "a"
except = ["id"]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("is a key field"));
    }

    #[test]
    fn parse_mix_resolution() {
        let config = CompareConfig::from_toml(
            r#"
resolution = "mix"
[[keys]]
field = "id"
[mix]
prefer = "b"
except = ["notes", "user.email"]
"#,
        )
        .unwrap();
        match config.to_options().resolution {
            Resolution::Mix { prefer, except } => {
                assert_eq!(prefer, Side::B);
                assert_eq!(except.len(), 2);
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn parse_valid_dedupe() {
        let config = DedupeConfig::from_toml(
            r#"
kind = "dedupe"
name = "Customers"
compare = "selected"
fields = ["id", "user.email"]
project_only = true
"#,
        )
        .unwrap();
        let opts = config.to_options();
        assert!(opts.project_only);
        match opts.keys {
            DedupeKeys::Selected(paths) => assert_eq!(paths.len(), 2),
            other => panic!("unexpected keys: {other:?}"),
        }
    }

    #[test]
    fn dedupe_defaults_to_all_fields() {
        let config = DedupeConfig::from_toml("kind = \"dedupe\"").unwrap();
        assert_eq!(config.to_options().keys, DedupeKeys::AllFields);
    }

    #[test]
    fn reject_dedupe_field_list_mismatches() {
        let err = DedupeConfig::from_toml("compare = \"selected\"").unwrap_err();
        assert!(err.to_string().contains("non-empty 'fields'"));

        let err = DedupeConfig::from_toml(
            r#"
compare = "all_fields"
fields = ["id"]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("must be empty"));
    }

    #[test]
    fn reject_wrong_kind() {
        let err = CompareConfig::from_toml("kind = \"dedupe\"").unwrap_err();
        assert!(err.to_string().contains("kind must be \"compare\""));
        let err = DedupeConfig::from_toml("kind = \"compare\"").unwrap_err();
        assert!(err.to_string().contains("kind must be \"dedupe\""));
    }

    #[test]
    fn reject_invalid_enum_values() {
        let err = CompareConfig::from_toml(
            r#"
mode = "sloppy"
[[keys]]
field = "id"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::ConfigParse(_)));
    }
}
