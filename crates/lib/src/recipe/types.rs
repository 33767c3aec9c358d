//! Recipe data types.
//!
//! A recipe declares one buildable project. It composes an acquisition
//! strategy ([`Source`]) with a build strategy ([`BuildSystem`]), followed by
//! the project's own ordered [`Step`]s.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::VERSION_TOKEN;

/// Where a project's source comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Source {
  /// A release archive, verified against a SHA-256 checksum and extracted.
  Tarball {
    /// URL template; `{version}` is replaced with the project version.
    url: String,
    sha256: String,
    /// Move the contents of a single top-level directory up one level.
    #[serde(default = "default_true")]
    strip_root: bool,
  },
  /// A shallow clone of a tag.
  Git {
    repo: String,
    /// Tag template; `{version}` is replaced with the project version.
    tag: String,
  },
  /// A local directory copied into the build directory.
  Local { path: PathBuf },
}

fn default_true() -> bool {
  true
}

fn default_build_type() -> String {
  "release".to_string()
}

/// How the project is configured, compiled and installed before its own steps run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "system", rename_all = "snake_case")]
pub enum BuildSystem {
  Meson {
    #[serde(default)]
    options: Vec<String>,
    #[serde(default = "default_build_type")]
    build_type: String,
  },
  Cmake {
    #[serde(default)]
    options: Vec<String>,
    #[serde(default = "default_build_type")]
    build_type: String,
  },
  Autotools {
    #[serde(default)]
    configure_args: Vec<String>,
  },
  /// Only the recipe's own steps run.
  #[default]
  None,
}

impl BuildSystem {
  pub fn as_str(&self) -> &'static str {
    match self {
      BuildSystem::Meson { .. } => "meson",
      BuildSystem::Cmake { .. } => "cmake",
      BuildSystem::Autotools { .. } => "autotools",
      BuildSystem::None => "none",
    }
  }
}

/// One action of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepAction {
  /// Run a shell command in the build directory (or `cwd`, relative to it).
  Cmd {
    cmd: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cwd: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    env: BTreeMap<String, String>,
  },
  /// Run `cmd` once per file matching `pattern` (relative to the build
  /// directory), in sorted order, with `$${item}` bound to the match.
  ForEach { pattern: String, cmd: String },
  /// Copy a file (or every file matching a glob) into `prefix/dest`.
  Install { src: String, dest: String },
  /// Copy the contents of a directory tree into `prefix/dest`.
  InstallDir { src: String, dest: String },
}

/// A recipe step, optionally gated on a configuration flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
  #[serde(flatten)]
  pub action: StepAction,
  /// Run only when this flag is enabled (`py_wheel` or a configured feature).
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub when: Option<String>,
}

impl Step {
  pub fn cmd(cmd: impl Into<String>) -> Self {
    StepAction::Cmd {
      cmd: cmd.into(),
      cwd: None,
      env: BTreeMap::new(),
    }
    .into()
  }

  pub fn install(src: impl Into<String>, dest: impl Into<String>) -> Self {
    StepAction::Install {
      src: src.into(),
      dest: dest.into(),
    }
    .into()
  }

  pub fn when(mut self, flag: impl Into<String>) -> Self {
    self.when = Some(flag.into());
    self
  }

  /// Short human-readable form used in logs and error messages.
  pub fn describe(&self) -> String {
    match &self.action {
      StepAction::Cmd { cmd, .. } => format!("cmd `{}`", first_line(cmd)),
      StepAction::ForEach { pattern, cmd } => format!("for_each {pattern} `{}`", first_line(cmd)),
      StepAction::Install { src, dest } => format!("install {src} -> {dest}"),
      StepAction::InstallDir { src, dest } => format!("install_dir {src} -> {dest}"),
    }
  }

  /// Every templated string in the step, for validation.
  pub(crate) fn templates(&self) -> Vec<&str> {
    match &self.action {
      StepAction::Cmd { cmd, cwd, env } => {
        let mut out = vec![cmd.as_str()];
        out.extend(cwd.as_deref());
        out.extend(env.values().map(String::as_str));
        out
      }
      StepAction::ForEach { pattern, cmd } => vec![pattern.as_str(), cmd.as_str()],
      StepAction::Install { src, dest } | StepAction::InstallDir { src, dest } => vec![src.as_str(), dest.as_str()],
    }
  }
}

impl From<StepAction> for Step {
  fn from(action: StepAction) -> Self {
    Step { action, when: None }
  }
}

fn first_line(text: &str) -> &str {
  text.trim().lines().next().unwrap_or_default()
}

/// How a recipe modifies one environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvOverride {
  Set(String),
  /// Prepend to a PATH-like list.
  Prepend(String),
  /// Append to a PATH-like list.
  Append(String),
}

impl EnvOverride {
  pub fn value(&self) -> &str {
    match self {
      EnvOverride::Set(v) | EnvOverride::Prepend(v) | EnvOverride::Append(v) => v,
    }
  }
}

/// A registered project recipe. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSpec {
  pub name: String,
  pub version: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub source: Source,
  #[serde(default)]
  pub build: BuildSystem,
  /// Names of projects that must be built first, in declaration order.
  #[serde(default)]
  pub dependencies: Vec<String>,
  #[serde(default)]
  pub steps: Vec<Step>,
  /// Per-project environment overrides; these win over global defaults.
  #[serde(default)]
  pub env: BTreeMap<String, EnvOverride>,
}

impl ProjectSpec {
  pub fn new(name: impl Into<String>, version: impl Into<String>, source: Source) -> Self {
    Self {
      name: name.into(),
      version: version.into(),
      description: None,
      source,
      build: BuildSystem::None,
      dependencies: Vec::new(),
      steps: Vec::new(),
      env: BTreeMap::new(),
    }
  }

  pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.dependencies = deps.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_build(mut self, build: BuildSystem) -> Self {
    self.build = build;
    self
  }

  pub fn with_step(mut self, step: Step) -> Self {
    self.steps.push(step);
    self
  }

  pub fn with_env(mut self, key: impl Into<String>, value: EnvOverride) -> Self {
    self.env.insert(key.into(), value);
    self
  }

  /// Expand `{version}` in a template.
  pub fn expand_version(&self, template: &str) -> String {
    template.replace(VERSION_TOKEN, &self.version)
  }

  /// The concrete archive URL for tarball sources.
  pub fn archive_url(&self) -> Option<String> {
    match &self.source {
      Source::Tarball { url, .. } => Some(self.expand_version(url)),
      _ => None,
    }
  }

  /// Directory name of this project under the build root.
  pub fn dir_name(&self) -> String {
    format!("{}-{}", self.name, self.version)
  }

  /// Identity of the source, recorded in the build directory to make
  /// re-acquisition idempotent.
  pub fn source_id(&self) -> String {
    match &self.source {
      Source::Tarball { sha256, .. } => format!("sha256:{}", sha256.to_ascii_lowercase()),
      Source::Git { repo, tag } => format!("git:{}@{}", repo, self.expand_version(tag)),
      Source::Local { path } => format!("local:{}", path.display()),
    }
  }
}
