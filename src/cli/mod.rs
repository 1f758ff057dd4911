//! CLI module for the mutcheck harness
//!
//! ## Commands
//!
//! - `run` - Run the compatibility pipeline for one or more interpreter specifiers
//! - `synthesize <dir>` - Write the demo project only
//! - `gate <version>` - Check a version string against the gated-dependency minimum
//! - `specs` - List the interpreter specifiers exercised by default
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use mutcheck_core::VersionTriple;
use mutcheck_core::vocab;

use crate::version::MUTCHECK_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// End-to-end compatibility harness for mutmut
#[derive(Parser, Debug)]
#[command(name = "mutcheck")]
#[command(version = MUTCHECK_VERSION)]
#[command(about = "End-to-end compatibility harness for mutmut", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Provision, install, gate, synthesize and run mutmut for each specifier
    Run(RunArgs),

    /// Write the demo project into an empty directory
    Synthesize {
        /// Target directory (created if missing, must be empty otherwise)
        #[arg(value_name = "DIR")]
        dir: PathBuf,
        /// Interpreter specifier recorded as the project's floor
        #[arg(long = "python", value_name = "SPEC", default_value = "3.14")]
        python: String,
        /// Install mutmut from this source tree (editable) instead of by name
        #[arg(long, value_name = "DIR", env = "MUTCHECK_SOURCE_ROOT")]
        source_root: Option<PathBuf>,
    },

    /// Check a libcst version string against the minimum
    Gate {
        /// Version text as reported by the installed distribution
        #[arg(value_name = "VERSION")]
        version: String,
        /// Lowest acceptable version
        #[arg(long, value_name = "X.Y.Z", default_value_t = vocab::GATED_DEPENDENCY_MINIMUM)]
        minimum: VersionTriple,
    },

    /// List the interpreter specifiers run by default
    Specs,
}

/// Output format for `run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    /// Colored, pytest-like lines on stderr
    #[default]
    Console,
    /// One JSON object per case, then a summary, on stdout
    Json,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Interpreter specifier to exercise (repeatable; default: 3.12 and 3.14)
    #[arg(long = "python", value_name = "SPEC")]
    pub python: Vec<String>,
    /// Install mutmut from this source tree (editable) instead of by name
    #[arg(long, value_name = "DIR", env = "MUTCHECK_SOURCE_ROOT")]
    pub source_root: Option<PathBuf>,
    /// Environment provisioner program
    #[arg(long, value_name = "PROGRAM", env = "MUTCHECK_PROVISIONER", default_value = vocab::PROVISIONER_PROGRAM)]
    pub provisioner: PathBuf,
    /// Lowest acceptable libcst version
    #[arg(long, value_name = "X.Y.Z", default_value_t = vocab::GATED_DEPENDENCY_MINIMUM)]
    pub minimum: VersionTriple,
    /// Put case projects under this directory instead of a temporary one
    #[arg(long, value_name = "DIR", conflicts_with = "keep")]
    pub workdir: Option<PathBuf>,
    /// Keep temporary case directories after the run
    #[arg(long)]
    pub keep: bool,
    /// Stream subprocess output to the terminal instead of capturing it
    #[arg(long)]
    pub stream: bool,
    /// Stop on first failure
    #[arg(short = 'x', long = "exitfirst")]
    pub stop_on_fail: bool,
    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    pub format: ReportFormat,
    /// Verbose output (print every completed stage)
    #[arg(short, long)]
    pub verbose: bool,
    /// Extra environment override for the install, gate and tool steps
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,
}

fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{}`", raw)),
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Run(args) => commands::run_cases(&args),
        Command::Synthesize {
            dir,
            python,
            source_root,
        } => commands::synthesize_project(&dir, &python, source_root),
        Command::Gate { version, minimum } => commands::gate_check(&version, minimum),
        Command::Specs => commands::list_specs(),
    }
}

// ============================================================================
// Tests
// ============================================================================
