//! Build environment assembly.
//!
//! [`build_env`] merges four layers, each overriding the one before it:
//!
//! 1. the base environment (the process environment, or nothing when
//!    `inherit_env` is off)
//! 2. global defaults from the configuration's `env` table
//! 3. toolchain search paths: the install prefix and toolchain directories
//!    prepended to `PATH`, `INCLUDE`, `LIB` and `PKG_CONFIG_PATH`
//! 4. the project's own overrides
//!
//! The merge is a pure function of its inputs. Only [`base_env`] reads the
//! process environment.

mod vars;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::trace;

pub use vars::ProjectVars;

use crate::config::ForgeConfig;
use crate::execute::StepResolver;
use crate::placeholder::{self, PlaceholderError};
use crate::platform::join_path_list;
use crate::recipe::{EnvOverride, ProjectSpec};

/// An environment: variable name to value.
pub type Env = BTreeMap<String, String>;

/// Whether variable names compare case-insensitively on this platform.
const KEYS_IGNORE_CASE: bool = cfg!(windows);

/// Look up `name`, matching `Path` for `PATH` where the platform does.
pub fn get_var<'a>(env: &'a Env, name: &str) -> Option<&'a str> {
  let key = key_for(env, name, KEYS_IGNORE_CASE);
  env.get(&key).map(String::as_str)
}

/// Set `name`, replacing an existing variable spelled with different case
/// where the platform treats them as one.
fn set_var(env: &mut Env, name: &str, value: String) {
  let key = key_for(env, name, KEYS_IGNORE_CASE);
  env.insert(key, value);
}

/// The key `name` is stored under: an existing case-insensitive match when
/// `ignore_case` is set, otherwise `name` itself.
fn key_for(env: &Env, name: &str, ignore_case: bool) -> String {
  if ignore_case
    && !env.contains_key(name)
    && let Some(existing) = env.keys().find(|k| k.eq_ignore_ascii_case(name))
  {
    return existing.clone();
  }
  name.to_string()
}

/// The environment every project starts from.
pub fn base_env(config: &ForgeConfig) -> Env {
  if config.inherit_env {
    std::env::vars().collect()
  } else {
    Env::new()
  }
}

/// Compute the environment for building `spec`.
///
/// Placeholders in override values are resolved against `vars` and, for
/// `$${env:NAME}`, against the environment as it stands before any project
/// override is applied.
pub fn build_env(base: &Env, config: &ForgeConfig, spec: &ProjectSpec, vars: &ProjectVars) -> Result<Env, PlaceholderError> {
  let mut env = base.clone();

  for (key, value) in &config.env {
    set_var(&mut env, key, value.clone());
  }

  apply_toolchain_paths(&mut env, config);

  let snapshot = env.clone();
  let resolver = StepResolver::new(vars, &snapshot);
  for (key, over) in &spec.env {
    let value = placeholder::substitute(over.value(), &resolver)?;
    trace!(project = %spec.name, key = %key, value = %value, "env override");
    apply_override(&mut env, key, over, value);
  }

  Ok(env)
}

fn apply_toolchain_paths(env: &mut Env, config: &ForgeConfig) {
  let prefix = &config.prefix;

  let mut bin = vec![prefix.join("bin")];
  bin.extend(config.toolchain_bin_dirs());
  prepend_paths(env, "PATH", &bin);

  let mut include = vec![prefix.join("include")];
  include.extend(config.toolchain_include_dirs());
  prepend_paths(env, "INCLUDE", &include);

  let mut lib = vec![prefix.join("lib")];
  lib.extend(config.toolchain_lib_dirs());
  prepend_paths(env, "LIB", &lib);

  prepend_paths(
    env,
    "PKG_CONFIG_PATH",
    &[prefix.join("lib").join("pkgconfig"), prefix.join("share").join("pkgconfig")],
  );
}

fn prepend_paths(env: &mut Env, key: &str, dirs: &[PathBuf]) {
  let mut entries: Vec<String> = dirs.iter().map(|d| path_str(d)).collect();
  if let Some(existing) = get_var(env, key) {
    entries.push(existing.to_string());
  }
  set_var(env, key, join_path_list(entries));
}

fn apply_override(env: &mut Env, key: &str, over: &EnvOverride, value: String) {
  let merged = match (over, get_var(env, key)) {
    (EnvOverride::Set(_), _) | (_, None) => value,
    (EnvOverride::Prepend(_), Some(existing)) => join_path_list([value.as_str(), existing]),
    (EnvOverride::Append(_), Some(existing)) => join_path_list([existing, value.as_str()]),
  };
  set_var(env, key, merged);
}

fn path_str(path: &Path) -> String {
  path.display().to_string()
}
