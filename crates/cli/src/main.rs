// Collate CLI - config-driven record matching and deduplication

mod commands;
mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{engine_exit_code, EXIT_INPUT_PARSE, EXIT_INVALID_CONFIG, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "collate")]
#[command(about = "Match, diff and deduplicate collections of JSON records")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two record collections by key
    #[command(after_help = "\
Exit code 1 (with --fail-on-diff) indicates differences: records classified \
as different or present on only one side.

Examples:
  collate compare --config orders.toml a.json b.json
  collate compare --config orders.toml a.json b.json --json | jq .summary
  collate compare --config orders.toml a.json b.json --output result.json
  collate compare --config orders.toml a.json b.json --fail-on-diff")]
    Compare {
        /// Path to the TOML config file (kind = "compare")
        #[arg(long, short = 'c')]
        config: PathBuf,

        /// First input collection (JSON array of objects)
        input_a: PathBuf,

        /// Second input collection (JSON array of objects)
        input_b: PathBuf,

        /// Print the full JSON result to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON result to a file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Exit 1 if any record is different or present on only one side
        #[arg(long)]
        fail_on_diff: bool,
    },

    /// Remove duplicate records from a collection
    #[command(after_help = "\
Examples:
  collate dedupe --config customers.toml customers.json
  collate dedupe --config customers.toml customers.json --json
  collate dedupe --config customers.toml customers.json --output clean.json")]
    Dedupe {
        /// Path to the TOML config file (kind = "dedupe")
        #[arg(long, short = 'c')]
        config: PathBuf,

        /// Input collection (JSON array of objects)
        input: PathBuf,

        /// Print the full JSON result to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON result to a file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Validate a config file without running
    #[command(after_help = "\
Examples:
  collate validate orders.toml")]
    Validate {
        /// Path to the TOML config file
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compare {
            config,
            input_a,
            input_b,
            json,
            output,
            fail_on_diff,
        } => commands::cmd_compare(config, input_a, input_b, json, output, fail_on_diff),
        Commands::Dedupe {
            config,
            input,
            json,
            output,
        } => commands::cmd_dedupe(config, input, json, output),
        Commands::Validate { config } => commands::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INVALID_CONFIG, message: msg.into(), hint: None }
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INPUT_PARSE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    /// Create error from an engine error with the proper exit code.
    pub fn engine(err: collate_engine::EngineError) -> Self {
        Self {
            code: engine_exit_code(&err),
            message: err.to_string(),
            hint: None,
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
