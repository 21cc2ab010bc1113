//! CLI module for gtest-bridge
//!
//! ## Commands
//!
//! - `list <binary>` - Discover the tests in a Google Test binary
//! - `run <binary> --filter EXPR` - Execute a filtered subset and print its output
//! - `test <binary>` - Run every discovered test as its own case (pytest-style report)
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

use crate::version::BRIDGE_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// A test failed or a command could not complete.
    pub const FAILURE: ExitCode = ExitCode(1);
    /// The registry could not be reached or listed; nothing ran.
    pub const DISCOVERY_FAILED: ExitCode = ExitCode(2);
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

/// Discover and drive Google Test binaries
#[derive(Parser, Debug)]
#[command(name = "gtest-bridge")]
#[command(version = BRIDGE_VERSION)]
#[command(about = "Discover and drive Google Test binaries", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Where the test binary is and how to invoke it.
#[derive(Args, Debug, Clone)]
pub struct RegistryArgs {
    /// Google Test executable
    #[arg(value_name = "BINARY")]
    pub binary: PathBuf,
    /// Working directory for the test binary
    #[arg(long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,
    /// Directory for per-run scratch files (default: system temp dir)
    #[arg(long, value_name = "DIR", env = "GTEST_BRIDGE_SCRATCH_DIR")]
    pub scratch_dir: Option<PathBuf>,
    /// Also discover and run DISABLED_ tests
    #[arg(long)]
    pub include_disabled: bool,
    /// Extra arguments for the binary, placed before the gtest flags
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

/// Report format for `test`
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Console,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the tests in a binary without running them
    List {
        #[command(flatten)]
        registry: RegistryArgs,
        /// Print the listing in gtest's grouped layout
        #[arg(long)]
        raw: bool,
    },

    /// Run the tests selected by a filter and print their output
    Run {
        #[command(flatten)]
        registry: RegistryArgs,
        /// gtest filter expression (POSITIVE[-NEGATIVE])
        #[arg(short, long, value_name = "EXPR", default_value = "*")]
        filter: String,
        /// Run all selected tests in one invocation instead of one per test
        #[arg(long)]
        batched: bool,
    },

    /// Run every discovered test as a separate case
    Test {
        #[command(flatten)]
        registry: RegistryArgs,
        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
        /// Stop on first failure
        #[arg(short = 'x', long = "exitfirst")]
        stop_on_fail: bool,
        /// Only run tests whose name contains KEYWORD
        #[arg(short = 'k', value_name = "KEYWORD")]
        keyword: Option<String>,
        /// Report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
        format: ReportFormat,
        /// Use batched execution mode (one registry invocation per filter)
        #[arg(long)]
        batched: bool,
    },
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
        Command::List { registry, raw } => commands::list_tests(&registry, raw),
        Command::Run {
            registry,
            filter,
            batched,
        } => commands::run_filter(&registry, &filter, batched),
        Command::Test {
            registry,
            verbose,
            stop_on_fail,
            keyword,
            format,
            batched,
        } => {
            let mut options = crate::config::SuiteOptions::new().with_stop_on_fail(stop_on_fail);
            if let Some(keyword) = keyword {
                options = options.with_keyword(keyword);
            }
            commands::run_suite(&registry, options, verbose, format, batched)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
