//! Property-based tests for the bridge
//!
//! Random registries of passing and failing tests, checked against the outcomes the bridge reports.

use gtest_bridge::registry::{CaseOutcome, MemoryRegistry};
use gtest_bridge::{BridgeConfig, ExecutionMode, ExecutionRequest, TestBridge, TestName};
use proptest::prelude::*;

fn identifier() -> impl Strategy<Value = String> {
    "[A-Z][A-Za-z0-9_]{0,8}"
}

/// Distinct test names with a pass/fail flag each, in listing order.
fn registry_cases() -> impl Strategy<Value = Vec<(TestName, bool)>> {
    prop::collection::btree_map((identifier(), identifier()), any::<bool>(), 0..12).prop_map(|cases| {
        cases
            .into_iter()
            .filter_map(|((suite, case), passes)| {
                let name = TestName::new(&suite, &case).ok()?;
                (!name.is_disabled()).then_some((name, passes))
            })
            .collect()
    })
}

fn registry(cases: &[(TestName, bool)]) -> MemoryRegistry {
    cases.iter().fold(MemoryRegistry::new("memory"), |registry, (name, passes)| {
        let outcome = if *passes {
            CaseOutcome::Pass
        } else {
            CaseOutcome::Fail(format!("{name} failed"))
        };
        registry.with_case(name.clone(), outcome)
    })
}

proptest! {
    /// Property: discovery returns exactly the registered tests, in order, every time
    #[test]
    fn discovery_matches_registry(cases in registry_cases()) {
        let bridge = TestBridge::new(registry(&cases));
        let expected: Vec<TestName> = cases.iter().map(|(name, _)| name.clone()).collect();
        prop_assert_eq!(bridge.discover().unwrap().into_vec(), expected.clone());
        prop_assert_eq!(bridge.discover().unwrap().into_vec(), expected);
    }

    /// Property: an exact request reports that test's own outcome and runs nothing else
    #[test]
    fn exact_run_reports_own_outcome(cases in registry_cases(), pick in any::<prop::sample::Index>()) {
        prop_assume!(!cases.is_empty());
        let (name, passes) = &cases[pick.index(cases.len())];
        let bridge = TestBridge::new(registry(&cases));

        let result = bridge.run(&ExecutionRequest::exact(name));
        prop_assert_eq!(result.success, *passes);
        prop_assert_eq!(bridge.with_registry(|r| r.executed_filters()), vec![name.to_string()]);
    }

    /// Property: a wildcard run succeeds iff every test passes, in either execution mode
    #[test]
    fn wildcard_run_is_conjunction(cases in registry_cases(), batched in any::<bool>()) {
        let mode = if batched { ExecutionMode::Batched } else { ExecutionMode::Isolated };
        let bridge = TestBridge::with_config(registry(&cases), BridgeConfig::new().with_mode(mode));

        let result = bridge.run(&ExecutionRequest::all());
        prop_assert_eq!(result.success, cases.iter().all(|(_, passes)| *passes));
        if cases.is_empty() {
            prop_assert!(result.output.is_empty());
        }
    }
}
