//! In-memory registry with scripted cases.
//!
//! Renders the same listing and run transcript a Google Test binary would print, so the bridge parses and reports it
//! exactly as it would real output.

use std::sync::{Mutex, PoisonError};

use gtest_syntax::{Filter, TestName, render_listing};

use super::{ExecuteOptions, NativeTestRegistry, RegistryError, RegistryRun, RunStatus};

/// What a scripted case does when executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    Pass,
    /// Fails an assertion; the message is printed like a gtest failure.
    Fail(String),
    /// Takes the whole registry down (crash). Cases after it do not run.
    Abort(String),
    /// Panics inside the registry call itself.
    Panic(String),
}

/// One call that reached the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Enumerate,
    Execute(String),
}

#[derive(Debug)]
pub struct MemoryRegistry {
    label: String,
    cases: Vec<(TestName, CaseOutcome)>,
    raw_listing: Option<String>,
    unavailable: Option<String>,
    invocations: Mutex<Vec<Invocation>>,
}

impl MemoryRegistry {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            cases: Vec::new(),
            raw_listing: None,
            unavailable: None,
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Add a case. Cases are listed and executed in insertion order.
    pub fn with_case(mut self, name: TestName, outcome: CaseOutcome) -> Self {
        self.cases.push((name, outcome));
        self
    }

    /// Replace the enumeration output with arbitrary text.
    pub fn with_raw_listing(mut self, text: impl Into<String>) -> Self {
        self.raw_listing = Some(text.into());
        self
    }

    /// Make every call fail as if the native library could not be loaded.
    pub fn unavailable(mut self, reason: impl Into<String>) -> Self {
        self.unavailable = Some(reason.into());
        self
    }

    /// Calls received so far, oldest first.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Filters passed to execution mode so far.
    pub fn executed_filters(&self) -> Vec<String> {
        self.invocations()
            .into_iter()
            .filter_map(|i| match i {
                Invocation::Execute(filter) => Some(filter),
                Invocation::Enumerate => None,
            })
            .collect()
    }

    fn record(&self, invocation: Invocation) {
        self.invocations.lock().unwrap_or_else(PoisonError::into_inner).push(invocation);
    }

    fn check_available(&self) -> Result<(), RegistryError> {
        match &self.unavailable {
            Some(reason) => Err(RegistryError::Unavailable {
                location: self.label.clone(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl NativeTestRegistry for MemoryRegistry {
    fn location(&self) -> String {
        self.label.clone()
    }

    fn enumerate(&self) -> Result<RegistryRun, RegistryError> {
        self.check_available()?;
        self.record(Invocation::Enumerate);
        let output = match &self.raw_listing {
            Some(text) => text.clone(),
            None => {
                let names: Vec<TestName> = self.cases.iter().map(|(name, _)| name.clone()).collect();
                render_listing(&names)
            }
        };
        Ok(RegistryRun {
            status: RunStatus::Exited(0),
            output,
        })
    }

    fn execute(&self, filter: &Filter, options: &ExecuteOptions) -> Result<RegistryRun, RegistryError> {
        self.check_available()?;
        self.record(Invocation::Execute(filter.as_str().to_string()));

        let selected: Vec<&(TestName, CaseOutcome)> = self
            .cases
            .iter()
            .filter(|(name, _)| filter.matches(name.as_str()))
            .filter(|(name, _)| options.also_run_disabled || !name.is_disabled())
            .collect();

        let mut output = format!("Note: Google Test filter = {filter}\n");
        output.push_str(&format!("[==========] Running {} tests.\n", selected.len()));
        let mut failed = Vec::new();

        for (name, outcome) in selected.iter().copied() {
            output.push_str(&format!("[ RUN      ] {name}\n"));
            match outcome {
                CaseOutcome::Pass => output.push_str(&format!("[       OK ] {name} (0 ms)\n")),
                CaseOutcome::Fail(message) => {
                    output.push_str(&format!("{message}\n[  FAILED  ] {name} (0 ms)\n"));
                    failed.push(name);
                }
                CaseOutcome::Abort(reason) => {
                    output.push_str(&format!("{reason}\n"));
                    return Ok(RegistryRun {
                        status: RunStatus::Aborted(reason.clone()),
                        output,
                    });
                }
                CaseOutcome::Panic(message) => panic!("{message}"),
            }
        }

        output.push_str(&format!("[==========] {} tests ran.\n", selected.len()));
        output.push_str(&format!("[  PASSED  ] {} tests.\n", selected.len() - failed.len()));
        for name in &failed {
            output.push_str(&format!("[  FAILED  ] {name}\n"));
        }

        let code = if failed.is_empty() { 0 } else { 1 };
        Ok(RegistryRun {
            status: RunStatus::Exited(code),
            output,
        })
    }
}
