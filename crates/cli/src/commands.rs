//! `collate compare` / `collate dedupe` / `collate validate` implementations.

use std::path::{Path, PathBuf};

use collate_engine::model::Record;
use collate_engine::{run_compare, run_dedupe, CompareConfig, DedupeConfig};

use crate::exit_codes::EXIT_DIFFS;
use crate::CliError;

/// Extract the `kind` field from a TOML string, defaulting to "compare".
fn extract_kind(config_str: &str) -> String {
    #[derive(serde::Deserialize)]
    struct KindProbe {
        #[serde(default = "default_kind")]
        kind: String,
    }
    fn default_kind() -> String {
        "compare".into()
    }

    toml::from_str::<KindProbe>(config_str)
        .map(|p| p.kind)
        .unwrap_or_else(|_| "compare".into())
}

fn read_config(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map_err(|e| CliError::usage(format!("cannot read config {}: {e}", path.display())))
}

/// Load one input file as a JSON array of objects.
fn load_records(path: &Path) -> Result<Vec<Record>, CliError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| CliError::usage(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&data)
        .map_err(|e| CliError::input(format!("{}: {e}", path.display())))
        .map_err(|e| e.with_hint("inputs must be a JSON array of objects: [{...}, {...}]"))
}

fn emit_json(
    json_str: &str,
    json_output: bool,
    output_file: Option<&PathBuf>,
) -> Result<(), CliError> {
    if let Some(path) = output_file {
        std::fs::write(path, json_str)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }
    if json_output {
        println!("{json_str}");
    }
    Ok(())
}

fn label(name: &str) -> &str {
    if name.is_empty() {
        "(unnamed)"
    } else {
        name
    }
}

// ----------------------------------------------------------------------------
// compare
// ----------------------------------------------------------------------------

pub fn cmd_compare(
    config_path: PathBuf,
    input_a: PathBuf,
    input_b: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    fail_on_diff: bool,
) -> Result<(), CliError> {
    let config_str = read_config(&config_path)?;
    let config = CompareConfig::from_toml(&config_str).map_err(CliError::engine)?;

    let a = load_records(&input_a)?;
    let b = load_records(&input_b)?;

    let result = run_compare(&a, &b, &config.to_options()).map_err(CliError::engine)?;

    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
    emit_json(&json_str, json_output, output_file.as_ref())?;

    // Human summary to stderr
    let s = &result.summary;
    eprintln!(
        "compare '{}': {} vs {} records — {} same, {} different, {} only in A, {} only in B",
        label(&config.name),
        s.input_a,
        s.input_b,
        s.same,
        s.different,
        s.only_in_a,
        s.only_in_b,
    );

    if fail_on_diff && (s.different + s.only_in_a + s.only_in_b) > 0 {
        return Err(CliError {
            code: EXIT_DIFFS,
            message: "differences found".into(),
            hint: None,
        });
    }

    Ok(())
}

// ----------------------------------------------------------------------------
// dedupe
// ----------------------------------------------------------------------------

pub fn cmd_dedupe(
    config_path: PathBuf,
    input: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let config_str = read_config(&config_path)?;
    let config = DedupeConfig::from_toml(&config_str).map_err(CliError::engine)?;

    let records = load_records(&input)?;
    let result = run_dedupe(&records, &config.to_options()).map_err(CliError::engine)?;

    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
    emit_json(&json_str, json_output, output_file.as_ref())?;

    let s = &result.summary;
    eprintln!(
        "dedupe '{}': {} records — kept {}, removed {}",
        label(&config.name),
        s.input,
        s.kept,
        s.removed,
    );

    Ok(())
}

// ----------------------------------------------------------------------------
// validate
// ----------------------------------------------------------------------------

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config_str = read_config(&config_path)?;

    match extract_kind(&config_str).as_str() {
        "compare" => {
            let config = CompareConfig::from_toml(&config_str).map_err(CliError::engine)?;
            eprintln!(
                "valid: compare '{}' with {} key field(s)",
                label(&config.name),
                config.keys.len(),
            );
            Ok(())
        }
        "dedupe" => {
            let config = DedupeConfig::from_toml(&config_str).map_err(CliError::engine)?;
            eprintln!(
                "valid: dedupe '{}' comparing {} field(s)",
                label(&config.name),
                if config.fields.is_empty() {
                    "all".to_string()
                } else {
                    config.fields.len().to_string()
                },
            );
            Ok(())
        }
        other => Err(CliError::config(format!(
            "unknown config kind: \"{other}\" (expected \"compare\" or \"dedupe\")"
        ))),
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
