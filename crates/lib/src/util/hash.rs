//! SHA-256 helpers for verifying downloaded sources.
//!
//! Checksums in recipes are lowercase hexadecimal SHA-256 digests. This module
//! provides the digest newtype plus file and byte hashing used by the download
//! cache.

use std::fs;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 digest.
pub const SHA256_HEX_LEN: usize = 64;

/// A full 64-character lowercase SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(pub String);

impl ContentHash {
  /// Compare against an expected digest, ignoring ASCII case.
  pub fn matches(&self, expected: &str) -> bool {
    self.0.eq_ignore_ascii_case(expected)
  }
}

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Returns true if `value` looks like a hex-encoded SHA-256 digest.
pub fn is_sha256_hex(value: &str) -> bool {
  value.len() == SHA256_HEX_LEN && value.chars().all(|c| c.is_ascii_hexdigit())
}

/// Hash a file's contents, streaming it in fixed-size chunks.
pub fn hash_file(path: &Path) -> std::io::Result<ContentHash> {
  let mut file = fs::File::open(path)?;
  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(ContentHash(hex::encode(hasher.finalize())))
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
  let mut hasher = Sha256::new();
  hasher.update(data);
  ContentHash(hex::encode(hasher.finalize()))
}
