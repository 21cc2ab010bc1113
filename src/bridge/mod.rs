//! The test bridge: discovery and filtered execution against one native test registry.
//!
//! ## Failure model
//!
//! - Discovery failures (registry unreachable, enumeration crashed, malformed listing) are returned as
//!   [`DiscoveryError`]. Nothing useful can run without a test list.
//! - Execution never fails from the caller's point of view. Crashes, signals, panics and spawn failures become
//!   `success = false` with a diagnostic line appended to the captured output.
//!
//! ## Zero-match policy
//!
//! `run` resolves the filter against a fresh discovery first. A filter that selects no test is a vacuous success with
//! empty output, and the registry's execution mode is not invoked at all. This keeps "ran nothing" distinguishable
//! from "ran and passed" regardless of how a particular binary reports an empty run.
//!
//! ## Concurrency
//!
//! The registry is a single shared resource. Every registry call happens under the bridge's lock, so concurrent `run`
//! calls (for example from a multi-threaded test harness) execute one after another.

mod error;
mod types;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError};

use gtest_syntax::{Filter, parse_listing};

pub use error::{DiscoveryError, ExecutionError};
pub use types::{ExecutionRequest, ExecutionResult, TestList};

use crate::config::{BridgeConfig, ExecutionMode};
use crate::registry::{ExecuteOptions, NativeTestRegistry, RunStatus};

/// Owns a registry handle for the lifetime of a suite.
///
/// Acquire it at suite setup; dropping it (or calling [`TestBridge::into_registry`]) releases the registry.
pub struct TestBridge<R> {
    registry: Mutex<R>,
    config: BridgeConfig,
}

impl<R: NativeTestRegistry> TestBridge<R> {
    pub fn new(registry: R) -> Self {
        Self::with_config(registry, BridgeConfig::default())
    }

    pub fn with_config(registry: R, config: BridgeConfig) -> Self {
        Self {
            registry: Mutex::new(registry),
            config,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Location of the underlying registry, for reports.
    pub fn location(&self) -> String {
        self.lock().location()
    }

    /// Release the registry handle.
    pub fn into_registry(self) -> R {
        self.registry.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the registry, e.g. to inspect a fake between calls.
    pub fn with_registry<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        f(&self.lock())
    }

    /// List every test in the registry, in the order it reports them.
    ///
    /// Queries the registry on every call. `DISABLED_` tests are left out unless the bridge is configured to include
    /// them, so every returned name is runnable with an exact filter.
    ///
    /// ## Errors
    /// Returns [`DiscoveryError`] when the registry cannot be invoked, enumeration ends abnormally, or the listing is
    /// malformed.
    #[tracing::instrument(skip_all)]
    pub fn discover(&self) -> Result<TestList, DiscoveryError> {
        let registry = self.lock();
        self.discover_locked(&registry)
    }

    /// Execute the tests selected by `request` and report their aggregate outcome.
    ///
    /// `success` comes from the registry's exit status, never from the text it printed. When several tests are
    /// selected, `success` is the AND of their outcomes and `output` their concatenation in discovery order.
    #[tracing::instrument(skip_all, fields(filter = %request.filter()))]
    pub fn run(&self, request: &ExecutionRequest) -> ExecutionResult {
        let registry = self.lock();
        let filter = request.filter();

        let tests = match self.discover_locked(&registry) {
            Ok(tests) => tests,
            Err(source) => {
                let err = ExecutionError::Resolution {
                    filter: filter.to_string(),
                    source,
                };
                tracing::warn!(%err, "cannot run tests");
                return ExecutionResult::failed(String::new(), err);
            }
        };

        let selected = filter.select(&tests);
        if selected.is_empty() {
            tracing::debug!("filter matched no tests");
            return ExecutionResult::vacuous();
        }
        tracing::debug!(count = selected.len(), mode = ?self.config.mode, "running tests");

        match self.config.mode {
            ExecutionMode::Batched => self.execute_locked(&registry, filter),
            ExecutionMode::Isolated => {
                let mut combined = ExecutionResult::vacuous();
                for name in &selected {
                    combined.absorb(self.execute_locked(&registry, &Filter::exact(name)));
                }
                combined
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, R> {
        // A panic while holding the lock is already reported as a failed run; the registry itself stays usable.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn discover_locked(&self, registry: &R) -> Result<TestList, DiscoveryError> {
        let location = registry.location();
        let run = guarded(|| registry.enumerate())
            .map_err(|message| DiscoveryError::Panicked {
                location: location.clone(),
                message,
            })??;

        if !run.status.is_success() {
            return Err(DiscoveryError::EnumerationFailed {
                location,
                status: run.status,
                output: run.output,
            });
        }

        let listed = parse_listing(&run.output).map_err(|source| DiscoveryError::Malformed {
            location: location.clone(),
            source,
        })?;

        let include_disabled = self.config.include_disabled;
        let names: Vec<_> = listed
            .into_iter()
            .map(|t| t.name)
            .filter(|name| include_disabled || !name.is_disabled())
            .collect();
        tracing::debug!(%location, count = names.len(), "discovered tests");
        Ok(TestList::new(names))
    }

    fn execute_locked(&self, registry: &R, filter: &Filter) -> ExecutionResult {
        let options = ExecuteOptions {
            also_run_disabled: self.config.include_disabled,
        };

        let run = match guarded(|| registry.execute(filter, &options)) {
            Ok(Ok(run)) => run,
            Ok(Err(source)) => {
                let err = ExecutionError::Invocation {
                    filter: filter.to_string(),
                    source,
                };
                tracing::warn!(%err, "registry invocation failed");
                return ExecutionResult::failed(String::new(), err);
            }
            Err(message) => {
                let err = ExecutionError::Aborted {
                    filter: filter.to_string(),
                    reason: format!("registry panicked: {message}"),
                };
                tracing::warn!(%err, "registry panicked");
                return ExecutionResult::failed(String::new(), err);
            }
        };

        match run.status {
            RunStatus::Exited(code) => {
                tracing::debug!(%filter, code, "registry finished");
                ExecutionResult {
                    success: code == 0,
                    output: run.output,
                }
            }
            RunStatus::Aborted(reason) => {
                let err = ExecutionError::Aborted {
                    filter: filter.to_string(),
                    reason,
                };
                tracing::warn!(%err, "registry aborted");
                ExecutionResult::failed(run.output, err)
            }
        }
    }
}

/// Run a registry call, turning a panic into its message.
fn guarded<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(panic_message)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CaseOutcome, Invocation, MemoryRegistry, RegistryError, RegistryRun};
    use gtest_syntax::TestName;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn name(text: &str) -> TestName {
        TestName::parse(text).unwrap()
    }

    fn suite_a() -> MemoryRegistry {
        MemoryRegistry::new("memory")
            .with_case(name("SuiteA.Case1"), CaseOutcome::Pass)
            .with_case(name("SuiteA.Case2"), CaseOutcome::Pass)
    }

    #[test]
    fn test_discover_lists_in_order() {
        let bridge = TestBridge::new(suite_a());
        let tests = bridge.discover().unwrap();
        let names: Vec<&str> = tests.iter().map(TestName::as_str).collect();
        assert_eq!(names, ["SuiteA.Case1", "SuiteA.Case2"]);
    }

    #[test]
    fn test_discover_requeries_every_call() {
        let bridge = TestBridge::new(suite_a());
        let first = bridge.discover().unwrap();
        let second = bridge.discover().unwrap();
        assert_eq!(first, second);
        bridge.with_registry(|r| {
            assert_eq!(r.invocations(), vec![Invocation::Enumerate, Invocation::Enumerate]);
        });
    }

    #[test]
    fn test_discover_excludes_disabled_by_default() {
        let registry = suite_a().with_case(name("SuiteA.DISABLED_Slow"), CaseOutcome::Pass);
        let bridge = TestBridge::new(registry);
        assert_eq!(bridge.discover().unwrap().len(), 2);
    }

    #[test]
    fn test_discover_includes_disabled_when_configured() {
        let registry = suite_a().with_case(name("SuiteA.DISABLED_Slow"), CaseOutcome::Pass);
        let bridge = TestBridge::with_config(registry, BridgeConfig::new().with_include_disabled(true));
        assert_eq!(bridge.discover().unwrap().len(), 3);
        let result = bridge.run(&ExecutionRequest::exact(&name("SuiteA.DISABLED_Slow")));
        assert!(result.success);
        assert!(result.output.contains("[       OK ] SuiteA.DISABLED_Slow"));
    }

    #[test]
    fn test_discover_unavailable_registry() {
        let bridge = TestBridge::new(suite_a().unavailable("dlopen failed"));
        let err = bridge.discover().unwrap_err();
        assert!(matches!(err, DiscoveryError::Unavailable(_)));
        assert!(err.to_string().contains("dlopen failed"));
    }

    #[test]
    fn test_discover_malformed_listing() {
        let bridge = TestBridge::new(suite_a().with_raw_listing("  orphan\n"));
        let err = bridge.discover().unwrap_err();
        match err {
            DiscoveryError::Malformed { location, source } => {
                assert_eq!(location, "memory");
                assert_eq!(source.line(), 1);
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_run_single_passing_test() {
        let bridge = TestBridge::new(suite_a());
        let result = bridge.run(&ExecutionRequest::exact(&name("SuiteA.Case1")));
        assert!(result.success);
        assert!(result.output.contains("[       OK ] SuiteA.Case1"));
        assert!(!result.output.contains("SuiteA.Case2"));
        bridge.with_registry(|r| assert_eq!(r.executed_filters(), vec!["SuiteA.Case1".to_string()]));
    }

    #[test]
    fn test_run_failing_test_reports_output() {
        let registry = suite_a().with_case(name("SuiteB.Broken"), CaseOutcome::Fail("Value of: x\n  Actual: 2".to_string()));
        let bridge = TestBridge::new(registry);
        let result = bridge.run(&ExecutionRequest::exact(&name("SuiteB.Broken")));
        assert!(!result.success);
        assert!(result.output.contains("Actual: 2"));
    }

    #[test]
    fn test_run_zero_match_is_vacuous_and_skips_execution() {
        let bridge = TestBridge::new(suite_a());
        let result = bridge.run(&ExecutionRequest::parse("Nothing.*").unwrap());
        assert_eq!(result, ExecutionResult::vacuous());
        bridge.with_registry(|r| assert!(r.executed_filters().is_empty()));
    }

    #[test]
    fn test_run_multi_match_isolated_ands_and_concatenates() {
        let registry = MemoryRegistry::new("memory")
            .with_case(name("S.first"), CaseOutcome::Pass)
            .with_case(name("S.second"), CaseOutcome::Fail("boom".to_string()))
            .with_case(name("S.third"), CaseOutcome::Pass);
        let bridge = TestBridge::new(registry);
        let result = bridge.run(&ExecutionRequest::parse("S.*").unwrap());
        assert!(!result.success);

        let first = result.output.find("[ RUN      ] S.first").unwrap();
        let second = result.output.find("[ RUN      ] S.second").unwrap();
        let third = result.output.find("[ RUN      ] S.third").unwrap();
        assert!(first < second && second < third);
        bridge.with_registry(|r| assert_eq!(r.executed_filters(), ["S.first", "S.second", "S.third"]));
    }

    #[test]
    fn test_run_batched_uses_one_invocation() {
        let bridge = TestBridge::with_config(suite_a(), BridgeConfig::new().with_mode(ExecutionMode::Batched));
        let result = bridge.run(&ExecutionRequest::parse("SuiteA.*").unwrap());
        assert!(result.success);
        bridge.with_registry(|r| assert_eq!(r.executed_filters(), ["SuiteA.*"]));
    }

    #[test]
    fn test_run_abort_becomes_failure_and_later_tests_still_run() {
        let registry = MemoryRegistry::new("memory")
            .with_case(name("S.crash"), CaseOutcome::Abort("Segmentation fault".to_string()))
            .with_case(name("S.after"), CaseOutcome::Pass);
        let bridge = TestBridge::new(registry);
        let result = bridge.run(&ExecutionRequest::all());
        assert!(!result.success);
        assert!(result.output.contains("aborted abnormally: Segmentation fault"));
        assert!(result.output.contains("[       OK ] S.after"));
    }

    #[test]
    fn test_run_panic_in_registry_is_contained() {
        let registry = MemoryRegistry::new("memory")
            .with_case(name("S.panics"), CaseOutcome::Panic("native fault".to_string()))
            .with_case(name("S.fine"), CaseOutcome::Pass);
        let bridge = TestBridge::new(registry);

        let result = bridge.run(&ExecutionRequest::exact(&name("S.panics")));
        assert!(!result.success);
        assert!(result.output.contains("registry panicked: native fault"));

        // The bridge stays usable afterwards.
        assert!(bridge.run(&ExecutionRequest::exact(&name("S.fine"))).success);
    }

    #[test]
    fn test_run_against_unavailable_registry_fails_softly() {
        let bridge = TestBridge::new(suite_a().unavailable("gone"));
        let result = bridge.run(&ExecutionRequest::all());
        assert!(!result.success);
        assert!(result.output.contains("could not resolve `*`"));
    }

    /// Wraps a registry and records how many `execute` calls were in flight at once.
    struct OverlapRegistry {
        inner: MemoryRegistry,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl NativeTestRegistry for OverlapRegistry {
        fn location(&self) -> String {
            self.inner.location()
        }

        fn enumerate(&self) -> Result<RegistryRun, RegistryError> {
            self.inner.enumerate()
        }

        fn execute(&self, filter: &Filter, options: &ExecuteOptions) -> Result<RegistryRun, RegistryError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            let run = self.inner.execute(filter, options);
            self.active.fetch_sub(1, Ordering::SeqCst);
            run
        }
    }

    #[test]
    fn test_concurrent_runs_are_serialized() {
        let bridge = TestBridge::new(OverlapRegistry {
            inner: suite_a(),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        });

        thread::scope(|scope| {
            let handles: Vec<_> = ["SuiteA.Case1", "SuiteA.Case2", "SuiteA.Case1", "SuiteA.Case2"]
                .into_iter()
                .map(|test| {
                    let bridge = &bridge;
                    scope.spawn(move || bridge.run(&ExecutionRequest::exact(&name(test))))
                })
                .collect();
            for handle in handles {
                assert!(handle.join().unwrap().success);
            }
        });

        let registry = bridge.into_registry();
        assert_eq!(registry.max_active.load(Ordering::SeqCst), 1);
        assert_eq!(registry.inner.executed_filters().len(), 4);
    }

    #[test]
    fn test_boxed_registry() {
        let boxed: Box<dyn NativeTestRegistry> = Box::new(suite_a());
        let bridge = TestBridge::new(boxed);
        assert_eq!(bridge.location(), "memory");
        assert_eq!(bridge.discover().unwrap().len(), 2);
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(7_u8)), "non-string panic payload");
    }
}
