#![forbid(unsafe_code)]
//! gtest-bridge: discover and drive Google-Test-style native test binaries from a host test harness.
//!
//! The bridge lists the tests a native binary contains, executes any filtered subset, captures what the binary
//! prints and reduces each execution to a pass/fail signal. A host harness turns every discovered test into one
//! host-visible case.
//!
//! ## Layers
//!
//! - [`registry`]: the native binary as an opaque capability (enumerate, execute filtered).
//! - [`bridge`]: discovery and execution with a failure model that never lets a native crash escape.
//! - [`host`]: parameter source, per-case runner, suite driver and reporters.
//! - [`cli`]: the `gtest-bridge` command.
//!
//! Names, listings and filters come from the [`gtest_syntax`] crate.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//! - **Registry panics**: a panic raised inside a registry call is caught at the bridge boundary and reported as an
//!   aborted execution.

pub mod bridge;
pub mod cli;
pub mod config;
pub mod host;
pub mod registry;
pub mod version;

pub use gtest_syntax::{Filter, TestName};

pub use bridge::{DiscoveryError, ExecutionError, ExecutionRequest, ExecutionResult, TestBridge, TestList};
pub use config::{BridgeConfig, ExecutionMode, SuiteOptions};
pub use host::{AssertionFailure, HostAdapter, HostCase, HostSuite, SuiteSummary};
pub use registry::{MemoryRegistry, NativeTestRegistry, ProcessRegistry, ProcessRegistryConfig};
