//! Host suite driver: collect parameters once, run each case once, report.

use std::time::{Duration, Instant};

use crate::bridge::DiscoveryError;
use crate::config::SuiteOptions;
use crate::registry::NativeTestRegistry;

use super::reporter::TestReporter;
use super::{HostAdapter, HostCase};

/// Summary of a suite run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteSummary {
    /// Cases collected (after keyword narrowing)
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Cases never started because the run stopped early
    pub not_run: usize,
    pub duration: Duration,
}

impl SuiteSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Drives every host case of one adapter through a reporter.
pub struct HostSuite<'a, R> {
    adapter: &'a HostAdapter<R>,
    options: SuiteOptions,
}

impl<'a, R: NativeTestRegistry> HostSuite<'a, R> {
    pub fn new(adapter: &'a HostAdapter<R>, options: SuiteOptions) -> Self {
        Self { adapter, options }
    }

    /// Collect and run the suite.
    ///
    /// ## Errors
    /// A discovery failure aborts setup: the reporter sees zero collected cases and the error is returned.
    #[tracing::instrument(skip_all)]
    pub fn run(&self, reporter: &mut dyn TestReporter) -> Result<SuiteSummary, DiscoveryError> {
        let start = Instant::now();
        reporter.on_discovery_start(&self.adapter.bridge().location());

        let cases = match self.adapter.cases() {
            Ok(cases) => cases,
            Err(err) => {
                tracing::error!(%err, "test discovery failed");
                reporter.on_collection_error(&err);
                reporter.on_collection_complete(0);
                return Err(err);
            }
        };

        let keyword = self.options.keyword.as_deref();
        let mut cases: Vec<HostCase> = cases
            .into_iter()
            .filter(|case| keyword.is_none_or(|k| case.name().as_str().contains(k)))
            .collect();
        reporter.on_collection_complete(cases.len());

        let mut summary = SuiteSummary {
            total: cases.len(),
            ..SuiteSummary::default()
        };

        for case in &mut cases {
            reporter.on_test_start(case.name());
            let case_start = Instant::now();
            let outcome = case.execute(self.adapter);
            reporter.on_test_complete(case, case_start.elapsed());

            match outcome {
                Ok(()) => summary.passed += 1,
                Err(_) => {
                    summary.failed += 1;
                    if self.options.stop_on_fail {
                        break;
                    }
                }
            }
        }

        summary.not_run = summary.total - summary.passed - summary.failed;
        summary.duration = start.elapsed();
        reporter.on_run_complete(&summary);
        Ok(summary)
    }
}
