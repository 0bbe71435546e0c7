//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success                                                  |
//! | 1    | Differences found (only with --fail-on-diff)             |
//! | 2    | Usage error (bad arguments, missing file)                |
//! | 3    | Invalid config (TOML parse or validation failure)        |
//! | 4    | Input parse error (input file is not a JSON record list) |
//! | 5    | Engine error (missing key fields, inconsistent types)    |

use collate_engine::EngineError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Differences found. Like `diff(1)`, exit 1 means "inputs differ".
/// Only emitted when --fail-on-diff is set.
pub const EXIT_DIFFS: u8 = 1;

/// Usage error - bad arguments, missing file.
pub const EXIT_USAGE: u8 = 2;

/// Config file failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Input file is not a JSON array of objects.
pub const EXIT_INPUT_PARSE: u8 = 4;

/// The engine rejected the run (missing key field, inconsistent field type).
pub const EXIT_ENGINE: u8 = 5;

/// Map an engine error to its exit code.
pub fn engine_exit_code(err: &EngineError) -> u8 {
    match err {
        EngineError::ConfigParse(_) | EngineError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        _ => EXIT_ENGINE,
    }
}
