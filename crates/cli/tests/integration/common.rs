//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Path to a fixture recipe directory.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Isolated test environment.
///
/// Each test gets its own prefix, build root, cache and config location.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Canonical temp root, without the `\\?\` prefix on Windows.
  pub fn root(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap_or_else(|_| self.temp.path().to_path_buf())
  }

  pub fn prefix(&self) -> PathBuf {
    self.root().join("prefix")
  }

  pub fn build_root(&self) -> PathBuf {
    self.root().join("build")
  }

  /// A `forge` command with every default location inside the temp dir.
  ///
  /// `FORGE_CONFIG` points at a file that does not exist, so the built-in
  /// defaults apply.
  pub fn forge_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("forge");
    cmd.env("FORGE_CONFIG", self.root().join("forge.toml"));
    cmd.env("XDG_DATA_HOME", self.root().join("data"));
    cmd.env("XDG_CACHE_HOME", self.root().join("cache"));
    cmd.env("LOCALAPPDATA", self.root().join("data"));
    cmd.env_remove("RUST_LOG");
    cmd
  }

  /// `forge build` against a fixture directory with isolated output paths.
  pub fn build_cmd(&self, fixture: &str) -> Command {
    let mut cmd = self.forge_cmd();
    cmd
      .arg("build")
      .arg("--recipes")
      .arg(fixture_path(fixture))
      .arg("--prefix")
      .arg(self.prefix())
      .arg("--build-root")
      .arg(self.build_root());
    cmd
  }

  /// Write the config file that `forge_cmd` points at.
  pub fn write_config(&self, content: &str) {
    std::fs::write(self.root().join("forge.toml"), content).unwrap();
  }
}
