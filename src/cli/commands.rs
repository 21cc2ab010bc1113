//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::io::{self, IsTerminal};

use gtest_syntax::render_listing;

use crate::bridge::{DiscoveryError, ExecutionRequest, TestBridge};
use crate::config::{BridgeConfig, ExecutionMode, SuiteOptions};
use crate::host::{ConsoleReporter, HostAdapter, HostSuite, JsonReporter, TestReporter};
use crate::registry::{ProcessRegistry, ProcessRegistryConfig, RegistryError};

use super::{CliError, CliResult, ExitCode, RegistryArgs, ReportFormat};

/// Translate CLI flags into a registry configuration.
pub fn registry_config(args: &RegistryArgs) -> ProcessRegistryConfig {
    let mut config = ProcessRegistryConfig::new(&args.binary)
        .with_args(&args.args)
        .with_color(false);
    if let Some(dir) = &args.workdir {
        config = config.with_working_dir(dir);
    }
    if let Some(dir) = &args.scratch_dir {
        config = config.with_scratch_root(dir);
    }
    config
}

fn bridge_config(args: &RegistryArgs, batched: bool) -> BridgeConfig {
    let mode = if batched { ExecutionMode::Batched } else { ExecutionMode::Isolated };
    BridgeConfig::new()
        .with_mode(mode)
        .with_include_disabled(args.include_disabled)
}

fn open_registry(args: &RegistryArgs) -> Result<ProcessRegistry, RegistryError> {
    ProcessRegistry::open(registry_config(args))
}

/// Render a discovery failure with its diagnostic code and help text.
fn discovery_failure(err: DiscoveryError) -> CliError {
    CliError::new(format!("{:?}", miette::Report::new(err)), ExitCode::DISCOVERY_FAILED)
}

/// `list`: print discovered test names, one per line (or gtest's grouped layout with `raw`).
pub fn list_tests(args: &RegistryArgs, raw: bool) -> CliResult<ExitCode> {
    let registry = open_registry(args).map_err(|e| discovery_failure(e.into()))?;
    let bridge = TestBridge::with_config(registry, bridge_config(args, false));
    let tests = bridge.discover().map_err(discovery_failure)?;

    if raw {
        print!("{}", render_listing(&tests));
    } else {
        for name in tests.iter() {
            println!("{name}");
        }
    }
    tracing::info!(count = tests.len(), "listed tests");
    Ok(ExitCode::SUCCESS)
}

/// `run`: execute a filter, print the captured output, exit 0 on success and 1 otherwise.
pub fn run_filter(args: &RegistryArgs, filter: &str, batched: bool) -> CliResult<ExitCode> {
    let request =
        ExecutionRequest::parse(filter).map_err(|e| CliError::failure(format!("Invalid filter: {}", e)))?;
    let registry = open_registry(args).map_err(|e| discovery_failure(e.into()))?;
    let bridge = TestBridge::with_config(registry, bridge_config(args, batched));

    let result = bridge.run(&request);
    print!("{}", result.output);
    if result.output.is_empty() {
        eprintln!("No tests matched filter '{}'", request.filter());
    }

    if result.success {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// `test`: one host case per discovered test, reported through the chosen reporter.
pub fn run_suite(
    args: &RegistryArgs,
    options: SuiteOptions,
    verbose: bool,
    format: ReportFormat,
    batched: bool,
) -> CliResult<ExitCode> {
    let mut reporter: Box<dyn TestReporter> = match format {
        ReportFormat::Console => Box::new(ConsoleReporter::stderr(verbose).with_color(io::stderr().is_terminal())),
        ReportFormat::Json => Box::new(JsonReporter::stdout()),
    };

    let registry = match open_registry(args) {
        Ok(registry) => registry,
        Err(err) => {
            let err = DiscoveryError::from(err);
            tracing::error!(%err, "cannot set up test suite");
            reporter.on_collection_error(&err);
            reporter.on_collection_complete(0);
            return Err(CliError::new("", ExitCode::DISCOVERY_FAILED));
        }
    };

    let adapter = HostAdapter::setup(registry, bridge_config(args, batched));
    let outcome = HostSuite::new(&adapter, options).run(reporter.as_mut());
    drop(adapter.teardown());

    match outcome {
        Ok(summary) if summary.is_success() => Ok(ExitCode::SUCCESS),
        // Tests failed - summary already printed
        Ok(_) => Err(CliError::new("", ExitCode::FAILURE)),
        Err(_) => Err(CliError::new("", ExitCode::DISCOVERY_FAILED)),
    }
}
