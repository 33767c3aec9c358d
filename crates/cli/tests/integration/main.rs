//! CLI integration tests.

mod common;

mod build_tests;
mod plan_tests;
