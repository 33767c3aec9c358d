//! Integration tests for forge-lib.

mod common;

mod cache_tests;
mod resolve_props;
#[cfg(unix)]
mod scenario_tests;
