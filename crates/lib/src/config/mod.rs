//! Global build configuration.
//!
//! Loaded from `forge.toml` (see [`crate::platform::paths::config_file`]).
//! Every field has a default, so an empty or missing file is a valid
//! configuration. The CLI applies its flags on top of the loaded value.
//!
//! ```toml
//! prefix = 'C:\gtk-build\gtk\x64\release'
//! build_root = 'C:\gtk-build\build\x64\release'
//! toolchain_root = 'C:\Program Files\Microsoft Visual Studio\2022\Community'
//! python_dir = 'C:\Python311'
//! py_wheel = true
//! policy = "best-effort"
//!
//! [env]
//! CL = "/MP"
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::DEFAULT_FETCH_TIMEOUT_SECS;
use crate::platform::paths;

/// What the executor does after a project fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
  /// Stop dispatching new projects after the first failure.
  #[default]
  Halt,
  /// Keep building projects that do not depend on a failed one.
  BestEffort,
}

impl std::fmt::Display for FailurePolicy {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      FailurePolicy::Halt => write!(f, "halt"),
      FailurePolicy::BestEffort => write!(f, "best-effort"),
    }
  }
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: Box<toml::de::Error>,
  },

  #[error("invalid config: {0}")]
  Invalid(String),
}

/// Global configuration shared by every project in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForgeConfig {
  /// Install prefix that receives every project's artifacts.
  pub prefix: PathBuf,
  /// Root for per-project build directories.
  pub build_root: PathBuf,
  /// Root of the shared download cache.
  pub cache_dir: PathBuf,
  /// Toolchain installation root; `bin`, `include` and `lib` below it are used
  /// when the explicit lists are empty.
  pub toolchain_root: Option<PathBuf>,
  pub toolchain_bin: Vec<PathBuf>,
  pub toolchain_include: Vec<PathBuf>,
  pub toolchain_lib: Vec<PathBuf>,
  /// Python installation used by binding recipes (`$${python_dir}`).
  pub python_dir: Option<PathBuf>,
  /// Package Python bindings as wheels into the prefix.
  pub py_wheel: bool,
  /// Extra flags that recipe steps can test with `when`.
  pub features: BTreeSet<String>,
  /// Global environment defaults.
  pub env: BTreeMap<String, String>,
  /// Start every project environment from the current process environment.
  pub inherit_env: bool,
  pub policy: FailurePolicy,
  /// Maximum number of projects built concurrently.
  pub jobs: usize,
  /// Shell used to run `cmd` steps.
  pub shell: Option<String>,
  pub fetch_timeout_secs: u64,
  /// Wipe each project's build directory before acquiring its source.
  pub clean: bool,
  /// Projects assumed to be already installed; they are not built.
  pub skip: BTreeSet<String>,
}

impl Default for ForgeConfig {
  fn default() -> Self {
    Self {
      prefix: paths::default_prefix(),
      build_root: paths::default_build_root(),
      cache_dir: paths::cache_dir(),
      toolchain_root: None,
      toolchain_bin: Vec::new(),
      toolchain_include: Vec::new(),
      toolchain_lib: Vec::new(),
      python_dir: None,
      py_wheel: false,
      features: BTreeSet::new(),
      env: BTreeMap::new(),
      inherit_env: true,
      policy: FailurePolicy::default(),
      jobs: num_cpus(),
      shell: None,
      fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
      clean: false,
      skip: BTreeSet::new(),
    }
  }
}

impl ForgeConfig {
  /// Parse a configuration from TOML text.
  pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
    let config: ForgeConfig = toml::from_str(text).map_err(|e| ConfigError::Parse {
      path: origin.to_path_buf(),
      source: Box::new(e),
    })?;
    config.validate()?;
    Ok(config)
  }

  /// Load a configuration file that must exist.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_toml_str(&text, path)
  }

  /// Load `path` if given, otherwise the default config file if it exists,
  /// otherwise the built-in defaults.
  pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
    if let Some(path) = path {
      return Self::load(path);
    }

    let default_path = paths::config_file();
    if default_path.is_file() {
      debug!(path = %default_path.display(), "loading config");
      Self::load(&default_path)
    } else {
      debug!(path = %default_path.display(), "no config file, using defaults");
      Ok(Self::default())
    }
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.jobs == 0 {
      return Err(ConfigError::Invalid("jobs must be at least 1".to_string()));
    }
    if self.fetch_timeout_secs == 0 {
      return Err(ConfigError::Invalid("fetch_timeout_secs must be at least 1".to_string()));
    }
    Ok(())
  }

  /// Whether a `when` flag is enabled.
  pub fn flag_enabled(&self, flag: &str) -> bool {
    match flag {
      "py_wheel" => self.py_wheel,
      other => self.features.contains(other),
    }
  }

  pub fn toolchain_bin_dirs(&self) -> Vec<PathBuf> {
    self.toolchain_dirs(&self.toolchain_bin, "bin")
  }

  pub fn toolchain_include_dirs(&self) -> Vec<PathBuf> {
    self.toolchain_dirs(&self.toolchain_include, "include")
  }

  pub fn toolchain_lib_dirs(&self) -> Vec<PathBuf> {
    self.toolchain_dirs(&self.toolchain_lib, "lib")
  }

  fn toolchain_dirs(&self, explicit: &[PathBuf], subdir: &str) -> Vec<PathBuf> {
    if !explicit.is_empty() {
      return explicit.to_vec();
    }
    self.toolchain_root.iter().map(|root| root.join(subdir)).collect()
  }
}

/// Get the number of CPUs for default parallelism.
fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}
