//! Fully qualified test names (`Suite.Case`).

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Prefix Google Test uses to mark a suite or case as disabled.
pub const DISABLED_PREFIX: &str = "DISABLED_";

/// Characters with meaning in a `--gtest_filter` expression. A name containing any of them could not be selected by
/// an exact filter, so such names are rejected.
const FILTER_METACHARS: [char; 4] = ['*', '?', ':', '-'];

/// Why a piece of text is not a usable test name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("test name is empty")]
    Empty,

    #[error("test name `{0}` has no `Suite.Case` separator")]
    MissingSeparator(String),

    #[error("test name `{name}` has an empty {part}")]
    EmptyComponent { name: String, part: &'static str },

    #[error("test name `{name}` has a `.` in its suite, so the suite/case split is ambiguous")]
    DottedSuite { name: String },

    #[error("test name `{name}` contains whitespace")]
    Whitespace { name: String },

    #[error("test name `{name}` contains `{ch}`, which has meaning in a test filter")]
    FilterMetachar { name: String, ch: char },
}

/// A test case identifier as Google Test prints it: suite and case joined by the first `.`.
///
/// Value- and type-parameterized tests keep their instantiation prefixes and indices
/// (`Instantiation/Suite.Case/0`), exactly as the registry reports them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestName {
    full: String,
    dot: usize,
}

impl TestName {
    /// Build a name from its two components.
    pub fn new(suite: &str, case: &str) -> Result<Self, NameError> {
        let full = format!("{suite}.{case}");
        if suite.is_empty() {
            return Err(NameError::EmptyComponent { name: full, part: "suite" });
        }
        if case.is_empty() {
            return Err(NameError::EmptyComponent { name: full, part: "case" });
        }
        // The first `.` separates suite from case; anything else would make two names print the same.
        if suite.contains('.') {
            return Err(NameError::DottedSuite { name: full });
        }
        validate_chars(&full)?;
        Ok(Self { dot: suite.len(), full })
    }

    /// Parse `Suite.Case`.
    pub fn parse(text: &str) -> Result<Self, NameError> {
        if text.is_empty() {
            return Err(NameError::Empty);
        }
        let Some((suite, case)) = text.split_once('.') else {
            return Err(NameError::MissingSeparator(text.to_string()));
        };
        Self::new(suite, case)
    }

    pub fn suite(&self) -> &str {
        &self.full[..self.dot]
    }

    pub fn case(&self) -> &str {
        &self.full[self.dot + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.full
    }

    pub fn into_string(self) -> String {
        self.full
    }

    /// Whether Google Test skips this test unless `--gtest_also_run_disabled_tests` is given.
    ///
    /// Mirrors gtest's `DISABLED_*:*/DISABLED_*` rule, applied to the suite and the case separately.
    pub fn is_disabled(&self) -> bool {
        is_disabled_component(self.suite()) || is_disabled_component(self.case())
    }
}

fn is_disabled_component(component: &str) -> bool {
    component.starts_with(DISABLED_PREFIX) || component.contains(&format!("/{DISABLED_PREFIX}"))
}

fn validate_chars(full: &str) -> Result<(), NameError> {
    if full.chars().any(char::is_whitespace) {
        return Err(NameError::Whitespace { name: full.to_string() });
    }
    if let Some(ch) = full.chars().find(|c| FILTER_METACHARS.contains(c)) {
        return Err(NameError::FilterMetachar {
            name: full.to_string(),
            ch,
        });
    }
    Ok(())
}

impl fmt::Display for TestName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl FromStr for TestName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for TestName {
    fn as_ref(&self) -> &str {
        &self.full
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_name() {
        let name = TestName::parse("TestVector3D.basic").unwrap();
        assert_eq!(name.suite(), "TestVector3D");
        assert_eq!(name.case(), "basic");
        assert_eq!(name.to_string(), "TestVector3D.basic");
    }

    #[test]
    fn test_parse_parameterized_name_splits_at_first_dot() {
        let name = TestName::parse("Sizes/MatrixTest.Inverts/3").unwrap();
        assert_eq!(name.suite(), "Sizes/MatrixTest");
        assert_eq!(name.case(), "Inverts/3");
    }

    #[test]
    fn test_parse_rejects_missing_separator() {
        assert_eq!(
            TestName::parse("NoDot"),
            Err(NameError::MissingSeparator("NoDot".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(TestName::parse(""), Err(NameError::Empty));
        assert!(matches!(
            TestName::parse(".case"),
            Err(NameError::EmptyComponent { part: "suite", .. })
        ));
        assert!(matches!(
            TestName::parse("Suite."),
            Err(NameError::EmptyComponent { part: "case", .. })
        ));
    }

    #[test]
    fn test_parse_rejects_filter_metachars() {
        for text in ["Suite.Ca*se", "Suite.Case?", "A:B.C", "Suite.Neg-ative"] {
            assert!(
                matches!(TestName::parse(text), Err(NameError::FilterMetachar { .. })),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn test_new_rejects_dotted_suite() {
        assert!(matches!(TestName::new("A.B", "c"), Err(NameError::DottedSuite { .. })));
        // The same text is still a name when the dot belongs to the case.
        let name = TestName::new("A", "B.c").unwrap();
        assert_eq!(name, TestName::parse("A.B.c").unwrap());
        assert_eq!(name.case(), "B.c");
    }

    #[test]
    fn test_parse_rejects_whitespace() {
        assert!(matches!(
            TestName::parse("Suite.Two words"),
            Err(NameError::Whitespace { .. })
        ));
    }

    #[test]
    fn test_disabled_detection() {
        assert!(TestName::parse("DISABLED_Suite.Case").unwrap().is_disabled());
        assert!(TestName::parse("Suite.DISABLED_Case").unwrap().is_disabled());
        assert!(TestName::parse("Inst/DISABLED_Suite.Case/0").unwrap().is_disabled());
        assert!(!TestName::parse("Suite.NotDISABLED_Case").unwrap().is_disabled());
    }

    #[test]
    fn test_from_str_matches_parse() {
        let parsed: TestName = "A.b".parse().unwrap();
        assert_eq!(parsed, TestName::new("A", "b").unwrap());
    }
}
