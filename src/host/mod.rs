//! Host test adapter
//!
//! Binds a [`TestBridge`] into a parameterized host harness: each discovered [`TestName`] becomes one host case.
//!
//! The two hooks a harness needs are:
//! - [`HostAdapter::enumerate_parameters`], the parameter source (one discovery, no execution), and
//! - [`HostAdapter::run_one`], the per-parameter body that executes one test and asserts it passed.
//!
//! ```rust,no_run
//! use gtest_bridge::host::HostAdapter;
//! use gtest_bridge::registry::{ProcessRegistry, ProcessRegistryConfig};
//!
//! let registry = ProcessRegistry::open(ProcessRegistryConfig::new("./build/unit_tests")).unwrap();
//! let adapter = HostAdapter::setup(registry, Default::default());
//! for name in adapter.enumerate_parameters().unwrap() {
//!     adapter.run_one(&name).unwrap();
//! }
//! ```

pub mod reporter;
pub mod suite;

use gtest_syntax::TestName;
use thiserror::Error;

use crate::bridge::{DiscoveryError, ExecutionRequest, TestBridge};
use crate::config::BridgeConfig;
use crate::registry::NativeTestRegistry;

pub use reporter::{ConsoleReporter, JsonReporter, TestReporter};
pub use suite::{HostSuite, SuiteSummary};

/// A native test finished and reported failure. Carries everything it printed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("native test `{name}` failed\n{output}")]
pub struct AssertionFailure {
    pub name: TestName,
    pub output: String,
}

/// Lifecycle of one host case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseState {
    Created,
    Running,
    Passed,
    Failed,
}

/// One host-visible test case bound to a native test name. Executes at most once.
#[derive(Debug, Clone)]
pub struct HostCase {
    name: TestName,
    state: CaseState,
    failure: Option<AssertionFailure>,
}

impl HostCase {
    pub fn new(name: TestName) -> Self {
        Self {
            name,
            state: CaseState::Created,
            failure: None,
        }
    }

    pub fn name(&self) -> &TestName {
        &self.name
    }

    pub fn state(&self) -> CaseState {
        self.state
    }

    pub fn failure(&self) -> Option<&AssertionFailure> {
        self.failure.as_ref()
    }

    /// Run the native test once. Later calls return the recorded outcome without executing again.
    pub fn execute<R: NativeTestRegistry>(&mut self, adapter: &HostAdapter<R>) -> Result<(), AssertionFailure> {
        match self.state {
            CaseState::Created => {}
            CaseState::Passed => return Ok(()),
            CaseState::Running | CaseState::Failed => {
                return match &self.failure {
                    Some(failure) => Err(failure.clone()),
                    None => Err(AssertionFailure {
                        name: self.name.clone(),
                        output: "case was interrupted while running".to_string(),
                    }),
                };
            }
        }

        self.state = CaseState::Running;
        match adapter.run_one(&self.name) {
            Ok(()) => {
                self.state = CaseState::Passed;
                Ok(())
            }
            Err(failure) => {
                self.state = CaseState::Failed;
                self.failure = Some(failure.clone());
                Err(failure)
            }
        }
    }
}

/// Parameter source and per-parameter runner for a host harness.
pub struct HostAdapter<R> {
    bridge: TestBridge<R>,
}

impl<R: NativeTestRegistry> HostAdapter<R> {
    pub fn new(bridge: TestBridge<R>) -> Self {
        Self { bridge }
    }

    /// Acquire the registry for the suite.
    pub fn setup(registry: R, config: BridgeConfig) -> Self {
        Self::new(TestBridge::with_config(registry, config))
    }

    /// Release the registry at suite teardown.
    pub fn teardown(self) -> R {
        self.bridge.into_registry()
    }

    pub fn bridge(&self) -> &TestBridge<R> {
        &self.bridge
    }

    /// The parameter list: one entry per discovered native test. Never executes a test.
    pub fn enumerate_parameters(&self) -> Result<Vec<TestName>, DiscoveryError> {
        Ok(self.bridge.discover()?.into_vec())
    }

    /// One fresh [`HostCase`] per parameter.
    pub fn cases(&self) -> Result<Vec<HostCase>, DiscoveryError> {
        Ok(self.enumerate_parameters()?.into_iter().map(HostCase::new).collect())
    }

    /// Execute exactly `name` and assert it passed.
    ///
    /// ## Errors
    /// Returns [`AssertionFailure`] with the captured output when the test failed or aborted.
    pub fn run_one(&self, name: &TestName) -> Result<(), AssertionFailure> {
        let result = self.bridge.run(&ExecutionRequest::exact(name));
        tracing::debug!(test = %name, success = result.success, output = %result.output, "native test finished");
        if result.success {
            Ok(())
        } else {
            Err(AssertionFailure {
                name: name.clone(),
                output: result.output,
            })
        }
    }
}
