//! Native test registry capability.
//!
//! A registry is the compiled test binary the bridge drives. It is modeled as an opaque capability with two modes,
//! enumeration and filtered execution, so the bridge never depends on how the tests are actually hosted.
//!
//! ## Implementations
//!
//! - [`ProcessRegistry`] spawns a Google Test executable per invocation.
//! - [`MemoryRegistry`] holds scripted cases in memory and records every invocation. Use it to exercise the bridge
//!   without a native binary.

pub mod memory;
pub mod process;

use std::fmt;

use gtest_syntax::Filter;
use thiserror::Error;

pub use memory::{CaseOutcome, Invocation, MemoryRegistry};
pub use process::{ProcessRegistry, ProcessRegistryConfig};

/// How one registry invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// The registry finished and reported an aggregate status (0 means every selected test passed).
    Exited(i32),
    /// The registry did not finish on its own terms: crash, signal, panic or premature exit.
    Aborted(String),
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Exited(0))
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Exited(code) => write!(f, "exit status {code}"),
            RunStatus::Aborted(reason) => write!(f, "aborted: {reason}"),
        }
    }
}

/// Raw result of one registry invocation: status plus everything the registry printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRun {
    pub status: RunStatus,
    pub output: String,
}

/// Per-invocation switches forwarded to execution mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Run `DISABLED_` tests selected by the filter.
    pub also_run_disabled: bool,
}

/// The registry could not be invoked at all.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("native test registry `{location}` is not available: {reason}")]
    Unavailable { location: String, reason: String },

    #[error("failed to invoke native test registry `{location}`: {source}")]
    Spawn {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Enumeration and filtered execution of a native test binary.
///
/// Implementations are a single shared resource: callers must not invoke one concurrently from several threads.
/// [`TestBridge`](crate::bridge::TestBridge) serializes access for that reason.
pub trait NativeTestRegistry: Send {
    /// Where the registry lives (binary path, label), for diagnostics.
    fn location(&self) -> String;

    /// Enumeration mode. Must not execute any test.
    ///
    /// On success the output is exactly the `--gtest_list_tests` text, with nothing else the registry printed mixed
    /// in. On failure it may carry whatever helps diagnose the failure.
    fn enumerate(&self) -> Result<RegistryRun, RegistryError>;

    /// Execution mode restricted to `filter`.
    fn execute(&self, filter: &Filter, options: &ExecuteOptions) -> Result<RegistryRun, RegistryError>;
}

impl<R: NativeTestRegistry + ?Sized> NativeTestRegistry for Box<R> {
    fn location(&self) -> String {
        (**self).location()
    }

    fn enumerate(&self) -> Result<RegistryRun, RegistryError> {
        (**self).enumerate()
    }

    fn execute(&self, filter: &Filter, options: &ExecuteOptions) -> Result<RegistryRun, RegistryError> {
        (**self).execute(filter, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_success() {
        assert!(RunStatus::Exited(0).is_success());
        assert!(!RunStatus::Exited(1).is_success());
        assert!(!RunStatus::Aborted("boom".to_string()).is_success());
    }

    #[test]
    fn test_run_status_display() {
        assert_eq!(RunStatus::Exited(1).to_string(), "exit status 1");
        assert_eq!(
            RunStatus::Aborted("terminated by signal 11 (SIGSEGV)".to_string()).to_string(),
            "aborted: terminated by signal 11 (SIGSEGV)"
        );
    }
}
