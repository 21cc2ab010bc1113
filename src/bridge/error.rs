//! Bridge error taxonomy.
//!
//! Only [`DiscoveryError`] ever reaches callers: without a test list no suite can be built. [`ExecutionError`] is
//! converted into a failed [`ExecutionResult`](super::ExecutionResult) at the bridge boundary.

use gtest_syntax::ListingError;
use miette::Diagnostic;
use thiserror::Error;

use crate::registry::{RegistryError, RunStatus};

#[derive(Debug, Error, Diagnostic)]
pub enum DiscoveryError {
    #[error("cannot reach native test registry: {0}")]
    #[diagnostic(
        code(gtest_bridge::discovery::unavailable),
        help("check that the test binary exists, is executable and can load its libraries")
    )]
    Unavailable(#[from] RegistryError),

    #[error("enumerating tests in `{location}` failed ({status})")]
    #[diagnostic(code(gtest_bridge::discovery::enumeration_failed))]
    EnumerationFailed {
        location: String,
        status: RunStatus,
        output: String,
    },

    #[error("`{location}` printed a malformed test listing")]
    #[diagnostic(
        code(gtest_bridge::discovery::malformed_listing),
        help("the binary must understand `--gtest_list_tests`; is it a Google Test executable?")
    )]
    Malformed {
        location: String,
        #[source]
        source: ListingError,
    },

    #[error("native test registry `{location}` panicked while enumerating tests: {message}")]
    #[diagnostic(code(gtest_bridge::discovery::panicked))]
    Panicked { location: String, message: String },
}

/// A single execution that did not produce a structured pass/fail.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("`{filter}` aborted abnormally: {reason}")]
    Aborted { filter: String, reason: String },

    #[error("could not execute `{filter}`: {source}")]
    Invocation {
        filter: String,
        #[source]
        source: RegistryError,
    },

    #[error("could not resolve `{filter}` against the registry: {source}")]
    Resolution {
        filter: String,
        #[source]
        source: DiscoveryError,
    },
}
