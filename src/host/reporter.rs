//! Reporting for host suite runs.
//!
//! ## TestReporter Trait
//!
//! [`HostSuite`](super::HostSuite) only decides what runs; everything a user sees goes through a [`TestReporter`].
//! Two implementations ship: a pytest-style console reporter and a JSON reporter that emits one document per run.

use std::error::Error as _;
use std::io::{self, Write};
use std::time::Duration;

use gtest_syntax::TestName;
use serde_json::{Value, json};

use crate::bridge::DiscoveryError;
use crate::version::BRIDGE_VERSION;

use super::suite::SuiteSummary;
use super::{CaseState, HostCase};

/// Hooks called by the suite driver, in order.
pub trait TestReporter {
    /// Called before the registry is queried
    fn on_discovery_start(&mut self, _location: &str) {}

    /// Called when discovery failed; followed by `on_collection_complete(0)`
    fn on_collection_error(&mut self, _error: &DiscoveryError) {}

    /// Called when test collection is complete
    fn on_collection_complete(&mut self, test_count: usize);

    /// Called when a case begins
    fn on_test_start(&mut self, test: &TestName);

    /// Called when a case completes
    fn on_test_complete(&mut self, case: &HostCase, duration: Duration);

    /// Called when all cases have completed
    fn on_run_complete(&mut self, summary: &SuiteSummary);
}

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const BOLD_RED: &str = "\x1b[1;31m";
const BOLD_GREEN: &str = "\x1b[1;32m";
const RESET: &str = "\x1b[0m";

/// Console reporter (pytest-style)
pub struct ConsoleReporter<W: Write> {
    out: W,
    verbose: bool,
    color: bool,
    failures: Vec<(TestName, String)>,
}

impl ConsoleReporter<io::Stderr> {
    pub fn stderr(verbose: bool) -> Self {
        Self::new(io::stderr(), verbose)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self {
            out,
            verbose,
            color: true,
            failures: Vec::new(),
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, color: &'static str, text: &str) -> String {
        if self.color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

// Write errors on the report stream are ignored, like `eprintln!` would.
impl<W: Write> TestReporter for ConsoleReporter<W> {
    fn on_discovery_start(&mut self, location: &str) {
        let banner = self.paint(BOLD, "=================== native test session starts ===================");
        let _ = writeln!(self.out, "{banner}");
        let _ = writeln!(self.out, "registry: {location}");
    }

    fn on_collection_error(&mut self, error: &DiscoveryError) {
        let label = self.paint(RED, "ERROR");
        let _ = writeln!(self.out, "{label} collecting tests: {error}");
        let mut source = error.source();
        while let Some(cause) = source {
            let _ = writeln!(self.out, "  caused by: {cause}");
            source = cause.source();
        }
        if let DiscoveryError::EnumerationFailed { output, .. } = error {
            if !output.is_empty() {
                let _ = writeln!(self.out, "{}", output.trim_end());
            }
        }
    }

    fn on_collection_complete(&mut self, test_count: usize) {
        if test_count == 0 {
            let _ = writeln!(self.out, "No tests collected");
        } else {
            let _ = writeln!(self.out, "collected {test_count} item(s)");
            let _ = writeln!(self.out);
        }
    }

    fn on_test_start(&mut self, test: &TestName) {
        if self.verbose {
            let _ = write!(self.out, "{test} ... ");
        }
    }

    fn on_test_complete(&mut self, case: &HostCase, duration: Duration) {
        let passed = case.state() == CaseState::Passed;
        let status = match (passed, self.verbose) {
            (true, true) => format!("{} ({}ms)", self.paint(GREEN, "PASSED"), duration.as_millis()),
            (false, true) => format!("{} ({}ms)", self.paint(RED, "FAILED"), duration.as_millis()),
            (true, false) => self.paint(GREEN, "."),
            (false, false) => self.paint(RED, "F"),
        };
        if self.verbose {
            let _ = writeln!(self.out, "{status}");
        } else {
            let _ = write!(self.out, "{status}");
        }

        if let Some(failure) = case.failure() {
            self.failures.push((failure.name.clone(), failure.output.clone()));
        }
    }

    fn on_run_complete(&mut self, summary: &SuiteSummary) {
        if !self.verbose && summary.total > 0 {
            let _ = writeln!(self.out);
        }

        if !self.failures.is_empty() {
            let _ = writeln!(self.out);
            let heading = self.paint(BOLD_RED, "=================== FAILURES ===================");
            let _ = writeln!(self.out, "{heading}");
            for (name, output) in &self.failures {
                let _ = writeln!(self.out);
                let title = format!("___________ {name} ___________");
                let _ = writeln!(self.out, "{}", self.paint(BOLD, &title));
                for line in output.lines() {
                    let _ = writeln!(self.out, "    {line}");
                }
            }
        }

        let mut parts = Vec::new();
        if summary.passed > 0 {
            parts.push(self.paint(GREEN, &format!("{} passed", summary.passed)));
        }
        if summary.failed > 0 {
            parts.push(self.paint(RED, &format!("{} failed", summary.failed)));
        }
        if summary.not_run > 0 {
            parts.push(self.paint(YELLOW, &format!("{} not run", summary.not_run)));
        }
        if parts.is_empty() {
            parts.push("no tests ran".to_string());
        }

        let rule_color = if summary.is_success() { BOLD_GREEN } else { BOLD_RED };
        let _ = writeln!(self.out);
        let _ = writeln!(
            self.out,
            "{} {} in {:.2}s {}",
            self.paint(rule_color, "==================="),
            parts.join(", "),
            summary.duration.as_secs_f64(),
            self.paint(rule_color, "===================")
        );
    }
}

/// Collects the run and writes it as one JSON document when the run completes (or collection fails).
pub struct JsonReporter<W: Write> {
    out: W,
    registry: String,
    tests: Vec<Value>,
    error: Option<String>,
}

impl JsonReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            registry: String::new(),
            tests: Vec::new(),
            error: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_document(&mut self, summary: Option<&SuiteSummary>) {
        let summary = summary.map(|s| {
            json!({
                "total": s.total,
                "passed": s.passed,
                "failed": s.failed,
                "not_run": s.not_run,
                "duration_ms": s.duration.as_millis() as u64,
            })
        });
        let document = json!({
            "version": BRIDGE_VERSION,
            "registry": self.registry,
            "tests": self.tests,
            "summary": summary,
            "error": self.error,
        });
        match serde_json::to_string_pretty(&document) {
            Ok(text) => {
                let _ = writeln!(self.out, "{text}");
            }
            Err(err) => tracing::error!(%err, "failed to serialize run report"),
        }
    }
}

impl<W: Write> TestReporter for JsonReporter<W> {
    fn on_discovery_start(&mut self, location: &str) {
        self.registry = location.to_string();
    }

    fn on_collection_error(&mut self, error: &DiscoveryError) {
        self.error = Some(error.to_string());
    }

    fn on_collection_complete(&mut self, _test_count: usize) {
        if self.error.is_some() {
            self.write_document(None);
        }
    }

    fn on_test_start(&mut self, _test: &TestName) {}

    fn on_test_complete(&mut self, case: &HostCase, duration: Duration) {
        let status = match case.state() {
            CaseState::Passed => "passed",
            _ => "failed",
        };
        let mut entry = json!({
            "name": case.name().as_str(),
            "suite": case.name().suite(),
            "case": case.name().case(),
            "status": status,
            "duration_ms": duration.as_millis() as u64,
        });
        if let Some(failure) = case.failure() {
            entry["output"] = Value::String(failure.output.clone());
        }
        self.tests.push(entry);
    }

    fn on_run_complete(&mut self, summary: &SuiteSummary) {
        self.write_document(Some(summary));
    }
}
