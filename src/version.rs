//! gtest-bridge version information.
//!
//! Exposed as a single constant so the CLI and the JSON run reports agree on the same value.
//!
//! ## Notes
//!
//! - The value is taken from Cargo metadata (`CARGO_PKG_VERSION`) at compile time.
//! - Prefer this constant over repeating `env!("CARGO_PKG_VERSION")` in multiple places.

/// The gtest-bridge version string (for example, `0.1.0`).
pub const BRIDGE_VERSION: &str = env!("CARGO_PKG_VERSION");
