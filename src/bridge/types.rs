//! Values exchanged with the bridge.

use std::ops::Deref;

use gtest_syntax::{Filter, FilterError, TestName};

/// Discovered tests in discovery order. Built fresh by every discovery call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestList {
    names: Vec<TestName>,
}

impl TestList {
    pub fn new(names: Vec<TestName>) -> Self {
        Self { names }
    }

    pub fn into_vec(self) -> Vec<TestName> {
        self.names
    }
}

impl Deref for TestList {
    type Target = [TestName];

    fn deref(&self) -> &[TestName] {
        &self.names
    }
}

impl IntoIterator for TestList {
    type Item = TestName;
    type IntoIter = std::vec::IntoIter<TestName>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}

/// Which tests to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    filter: Filter,
}

impl ExecutionRequest {
    pub fn new(filter: Filter) -> Self {
        Self { filter }
    }

    /// Select exactly one test.
    pub fn exact(name: &TestName) -> Self {
        Self::new(Filter::exact(name))
    }

    /// Parse a `--gtest_filter` expression.
    pub fn parse(expr: &str) -> Result<Self, FilterError> {
        Filter::parse(expr).map(Self::new)
    }

    pub fn all() -> Self {
        Self::new(Filter::all())
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }
}

/// Outcome of one `run` call, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub success: bool,
    pub output: String,
}

impl ExecutionResult {
    /// Nothing ran, nothing failed.
    pub fn vacuous() -> Self {
        Self {
            success: true,
            output: String::new(),
        }
    }

    pub(crate) fn failed(mut output: String, diagnostic: impl std::fmt::Display) -> Self {
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&format!("[  BRIDGE  ] {diagnostic}\n"));
        Self { success: false, output }
    }

    /// Fold another result in: AND the success flags, append the output.
    pub(crate) fn absorb(&mut self, other: ExecutionResult) {
        self.success &= other.success;
        self.output.push_str(&other.output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vacuous_result() {
        let result = ExecutionResult::vacuous();
        assert!(result.success);
        assert!(result.output.is_empty());
    }

    #[test]
    fn test_failed_result_appends_diagnostic_line() {
        let result = ExecutionResult::failed("partial".to_string(), "crashed");
        assert!(!result.success);
        assert_eq!(result.output, "partial\n[  BRIDGE  ] crashed\n");
    }

    #[test]
    fn test_absorb_ands_success_and_concatenates() {
        let mut total = ExecutionResult::vacuous();
        total.absorb(ExecutionResult {
            success: true,
            output: "one\n".to_string(),
        });
        total.absorb(ExecutionResult {
            success: false,
            output: "two\n".to_string(),
        });
        total.absorb(ExecutionResult {
            success: true,
            output: "three\n".to_string(),
        });
        assert!(!total.success);
        assert_eq!(total.output, "one\ntwo\nthree\n");
    }

    #[test]
    fn test_exact_request_uses_name_as_filter() {
        let name = TestName::parse("SuiteA.Case1").unwrap();
        assert_eq!(ExecutionRequest::exact(&name).filter().as_str(), "SuiteA.Case1");
    }

    #[test]
    fn test_test_list_derefs_to_slice() {
        let list = TestList::new(vec![TestName::parse("A.b").unwrap()]);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].as_str(), "A.b");
    }
}
