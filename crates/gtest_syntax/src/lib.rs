//! Text layer for Google-Test-style native test binaries: test names, the `--gtest_list_tests` listing format and
//! the `--gtest_filter` expression grammar.
//!
//! This crate does no IO. It is shared by the bridge, the CLI and the fuzz targets so that every consumer agrees on
//! what a well-formed test name is and which names a filter selects.
//!
//! ## Examples
//! ```rust
//! use gtest_syntax::{filter::Filter, listing};
//!
//! let tests = listing::parse_listing("SuiteA.\n  Case1\n  Case2\n").unwrap();
//! let names: Vec<_> = tests.into_iter().map(|t| t.name).collect();
//! let filter = Filter::parse("SuiteA.*-*2").unwrap();
//! assert_eq!(filter.select(&names).len(), 1);
//! ```

pub mod filter;
pub mod listing;
pub mod name;

pub use filter::{Filter, FilterError};
pub use listing::{ListedTest, ListingError, parse_listing, render_listing};
pub use name::{NameError, TestName};
