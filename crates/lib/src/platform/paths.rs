//! Default locations for configuration, build trees and the download cache.
//!
//! Follows the XDG base directory layout on Unix and `%APPDATA%` /
//! `%LOCALAPPDATA%` on Windows.

use std::path::PathBuf;

use crate::consts::{APP_NAME, CONFIG_ENV_VAR, CONFIG_FILENAME};

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  std::env::var("USERPROFILE")
    .map(PathBuf::from)
    .unwrap_or_else(|_| PathBuf::from("C:\\"))
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  std::env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("/"))
}

/// Directory holding `forge.toml`.
#[cfg(windows)]
pub fn config_dir() -> PathBuf {
  std::env::var("APPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join("AppData").join("Roaming"))
    .join(APP_NAME)
}

/// Directory holding `forge.toml`.
#[cfg(not(windows))]
pub fn config_dir() -> PathBuf {
  std::env::var("XDG_CONFIG_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".config"))
    .join(APP_NAME)
}

/// Root for build trees and the default install prefix.
#[cfg(windows)]
pub fn data_dir() -> PathBuf {
  std::env::var("LOCALAPPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join("AppData").join("Local"))
    .join(APP_NAME)
}

/// Root for build trees and the default install prefix.
#[cfg(not(windows))]
pub fn data_dir() -> PathBuf {
  std::env::var("XDG_DATA_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".local").join("share"))
    .join(APP_NAME)
}

/// Root of the shared download cache.
#[cfg(windows)]
pub fn cache_dir() -> PathBuf {
  data_dir().join("Cache")
}

/// Root of the shared download cache.
#[cfg(not(windows))]
pub fn cache_dir() -> PathBuf {
  std::env::var("XDG_CACHE_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".cache"))
    .join(APP_NAME)
}

/// Config file location: `$FORGE_CONFIG` if set, else `<config_dir>/forge.toml`.
pub fn config_file() -> PathBuf {
  std::env::var(CONFIG_ENV_VAR)
    .map(PathBuf::from)
    .unwrap_or_else(|_| config_dir().join(CONFIG_FILENAME))
}

/// Default install prefix for built projects.
pub fn default_prefix() -> PathBuf {
  data_dir().join("install")
}

/// Default root under which per-project build directories are created.
pub fn default_build_root() -> PathBuf {
  data_dir().join("build")
}
