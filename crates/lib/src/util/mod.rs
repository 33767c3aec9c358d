//! Shared utilities: content hashing and filesystem copies.

pub mod fs;
pub mod hash;

#[cfg(test)]
pub mod testutil;
