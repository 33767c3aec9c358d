//! forge-lib: dependency-aware build orchestration.
//!
//! This crate provides everything behind the `forge` command:
//! - `recipe`: declarative project recipes loaded from TOML
//! - `registry`: the set of known recipes, keyed by name
//! - `resolve`: dependency resolution into an ordered `BuildPlan`
//! - `execute`: acquiring sources, running steps and installing artifacts
//! - `env`: per-project build environments
//! - `report`: summaries of a run

pub mod acquire;
pub mod build;
pub mod cache;
pub mod config;
pub mod consts;
pub mod env;
pub mod execute;
pub mod placeholder;
pub mod platform;
pub mod recipe;
pub mod registry;
pub mod report;
pub mod resolve;
pub mod util;
