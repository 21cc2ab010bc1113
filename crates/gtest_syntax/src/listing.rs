//! Parser for `--gtest_list_tests` output.
//!
//! The format is line oriented: a suite line ends with `.`, and each case of that suite follows on its own line
//! indented by two spaces. Parameterized tests append a comment:
//!
//! ```text
//! Running main() from gtest_main.cc
//! TestVector3D.
//!   basic
//!   rayIntersection
//! Sizes/MatrixTest.
//!   Inverts/0  # GetParam() = 4
//! Typed/0.  # TypeParam = float
//!   Works
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::name::{NameError, TestName};

/// Banner printed by `gtest_main` before any listing output.
const GTEST_MAIN_BANNER: &str = "Running main() from";
const TYPE_PARAM_KEY: &str = "TypeParam = ";
const VALUE_PARAM_KEY: &str = "GetParam() = ";

/// One entry of a parsed listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedTest {
    pub name: TestName,
    /// Type parameter of a typed test suite, if the listing reported one.
    pub type_param: Option<String>,
    /// Value parameter of a value-parameterized test, if the listing reported one.
    pub value_param: Option<String>,
}

/// A listing line that cannot be turned into test names. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingError {
    #[error("line {line}: test case `{text}` appears before any test suite")]
    CaseOutsideSuite { line: usize, text: String },

    #[error("line {line}: malformed test suite line `{text}`")]
    MalformedSuite { line: usize, text: String },

    #[error("line {line}: {source}")]
    InvalidName {
        line: usize,
        #[source]
        source: NameError,
    },

    #[error("line {line}: test `{name}` is listed twice")]
    Duplicate { line: usize, name: String },
}

impl ListingError {
    pub fn line(&self) -> usize {
        match self {
            ListingError::CaseOutsideSuite { line, .. }
            | ListingError::MalformedSuite { line, .. }
            | ListingError::InvalidName { line, .. }
            | ListingError::Duplicate { line, .. } => *line,
        }
    }
}

/// Parse enumeration output into tests, in listing order.
///
/// An empty listing is valid and yields no tests.
///
/// ## Errors
/// Returns the first malformed line; nothing is returned for a partially parsed listing.
#[tracing::instrument(skip_all, fields(text_len = text.len()))]
pub fn parse_listing(text: &str) -> Result<Vec<ListedTest>, ListingError> {
    let mut tests = Vec::new();
    let mut seen = HashSet::new();
    // (suite name, type parameter)
    let mut suite: Option<(String, Option<String>)> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        if raw.trim().is_empty() {
            continue;
        }

        if raw.starts_with(' ') || raw.starts_with('\t') {
            let (case, value_param) = split_comment(raw.trim(), VALUE_PARAM_KEY);
            let Some((suite_name, type_param)) = &suite else {
                return Err(ListingError::CaseOutsideSuite {
                    line,
                    text: case.to_string(),
                });
            };
            let name = TestName::new(suite_name, case).map_err(|source| ListingError::InvalidName { line, source })?;
            if !seen.insert(name.clone()) {
                return Err(ListingError::Duplicate {
                    line,
                    name: name.into_string(),
                });
            }
            tests.push(ListedTest {
                name,
                type_param: type_param.clone(),
                value_param,
            });
            continue;
        }

        if suite.is_none() && raw.starts_with(GTEST_MAIN_BANNER) {
            continue;
        }

        let (head, type_param) = split_comment(raw.trim(), TYPE_PARAM_KEY);
        match head.strip_suffix('.') {
            Some(suite_name) if !suite_name.is_empty() => {
                suite = Some((suite_name.to_string(), type_param));
            }
            _ => {
                return Err(ListingError::MalformedSuite {
                    line,
                    text: raw.trim().to_string(),
                });
            }
        }
    }

    tracing::debug!(count = tests.len(), "parsed test listing");
    Ok(tests)
}

/// Split `text  # Key value` into the text and the value after `key` (or the whole comment if `key` is absent).
fn split_comment<'a>(text: &'a str, key: &str) -> (&'a str, Option<String>) {
    match text.split_once('#') {
        Some((head, comment)) => {
            let comment = comment.trim();
            let value = comment.strip_prefix(key).unwrap_or(comment);
            (head.trim_end(), Some(value.to_string()))
        }
        None => (text, None),
    }
}

/// Render names in the `--gtest_list_tests` layout. Consecutive names sharing a suite are grouped under one suite
/// line, so rendering then parsing yields the same names in the same order.
pub fn render_listing(names: &[TestName]) -> String {
    let mut out = String::new();
    let mut current: Option<&str> = None;
    for name in names {
        if current != Some(name.suite()) {
            out.push_str(name.suite());
            out.push_str(".\n");
            current = Some(name.suite());
        }
        out.push_str("  ");
        out.push_str(name.case());
        out.push('\n');
    }
    out
}
