//! `--gtest_filter` expressions.
//!
//! Grammar: `POSITIVE[-NEGATIVE]`, where each side is a `:`-separated list of glob patterns. `*` matches any string
//! (including the empty one) and `?` matches exactly one character. A test is selected when it matches at least one
//! positive pattern and no negative pattern. An empty positive side means `*`.

use std::fmt;

use thiserror::Error;

use crate::name::TestName;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("filter expression is empty")]
    Empty,

    #[error("filter expression `{0}` contains whitespace")]
    Whitespace(String),
}

/// A parsed filter expression. Keeps the original text so it can be forwarded to the registry unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    source: String,
    positive: Vec<String>,
    negative: Vec<String>,
}

impl Filter {
    pub fn parse(expr: &str) -> Result<Self, FilterError> {
        if expr.is_empty() {
            return Err(FilterError::Empty);
        }
        if expr.chars().any(char::is_whitespace) {
            return Err(FilterError::Whitespace(expr.to_string()));
        }

        let (positive, negative) = match expr.split_once('-') {
            Some((pos, neg)) => (split_patterns(pos), split_patterns(neg)),
            None => (split_patterns(expr), Vec::new()),
        };
        let positive = if positive.is_empty() { vec!["*".to_string()] } else { positive };

        Ok(Self {
            source: expr.to_string(),
            positive,
            negative,
        })
    }

    /// The filter that selects every test.
    pub fn all() -> Self {
        Self {
            source: "*".to_string(),
            positive: vec!["*".to_string()],
            negative: Vec::new(),
        }
    }

    /// A filter selecting exactly `name`. Well-formed names carry no filter metacharacters, so the name itself is
    /// the pattern.
    pub fn exact(name: &TestName) -> Self {
        Self {
            source: name.as_str().to_string(),
            positive: vec![name.as_str().to_string()],
            negative: Vec::new(),
        }
    }

    /// The expression as written, suitable for `--gtest_filter=`.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, full_name: &str) -> bool {
        self.positive.iter().any(|p| glob_matches(p, full_name)) && !self.negative.iter().any(|p| glob_matches(p, full_name))
    }

    /// The names this filter selects, in their original order.
    pub fn select(&self, names: &[TestName]) -> Vec<TestName> {
        names.iter().filter(|n| self.matches(n.as_str())).cloned().collect()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn split_patterns(side: &str) -> Vec<String> {
    side.split(':').filter(|p| !p.is_empty()).map(str::to_string).collect()
}

/// Glob match with `*` and `?`, backtracking to the most recent `*` on mismatch.
fn glob_matches(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    // (pattern index of the last `*`, text index it is currently absorbing up to)
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
