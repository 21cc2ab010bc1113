//! Bridge and host suite configuration.
//!
//! Plain structs with defaults and builder methods; the CLI fills them from flags.

/// How [`TestBridge::run`](crate::bridge::TestBridge::run) drives the registry for a filter that selects several
/// tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// One registry invocation per selected test, each with an exact filter.
    #[default]
    Isolated,
    /// A single registry invocation carrying the whole filter.
    Batched,
}

/// Bridge configuration
#[derive(Debug, Clone, Default)]
pub struct BridgeConfig {
    pub mode: ExecutionMode,
    /// Discover and run `DISABLED_` tests too
    pub include_disabled: bool,
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_include_disabled(mut self, include: bool) -> Self {
        self.include_disabled = include;
        self
    }
}

/// Options for a whole host suite run
#[derive(Debug, Clone, Default)]
pub struct SuiteOptions {
    /// Stop after the first failing case
    pub stop_on_fail: bool,
    /// Only collect tests whose name contains this keyword
    pub keyword: Option<String>,
}

impl SuiteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stop_on_fail(mut self, stop: bool) -> Self {
        self.stop_on_fail = stop;
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }
}
