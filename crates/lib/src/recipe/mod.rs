//! Recipe loading and validation.
//!
//! Recipes are TOML files, one project per file:
//!
//! ```toml
//! name = "pycairo"
//! version = "1.24.0"
//! dependencies = ["cairo"]
//!
//! [source]
//! kind = "tarball"
//! url = "https://github.com/pygobject/pycairo/releases/download/v{version}/pycairo-{version}.tar.gz"
//! sha256 = "1444d52f1bb4cc79a4a0c0fe2ccec4bd78ff885ab01ebe1c0f637d8392bcafb6"
//!
//! [build]
//! system = "meson"
//!
//! [[steps]]
//! kind = "install"
//! src = "COPYING"
//! dest = "share/doc/pycairo"
//! ```

pub mod types;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::placeholder;
use crate::util::hash::is_sha256_hex;

pub use types::{BuildSystem, EnvOverride, ProjectSpec, Source, Step, StepAction};

/// A malformed recipe.
#[derive(Debug, Error)]
pub enum RecipeError {
  #[error("failed to read recipe {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse recipe {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: Box<toml::de::Error>,
  },

  #[error("invalid recipe '{name}': {reason}")]
  Invalid { name: String, reason: String },
}

impl ProjectSpec {
  /// Parse and validate a recipe from TOML text.
  pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, RecipeError> {
    let spec: ProjectSpec = toml::from_str(text).map_err(|e| RecipeError::Parse {
      path: origin.to_path_buf(),
      source: Box::new(e),
    })?;
    spec.validate()?;
    Ok(spec)
  }

  /// Read, parse and validate a recipe file.
  ///
  /// A relative `local` source path is taken relative to the recipe file's
  /// directory, made absolute where possible.
  pub fn load(path: &Path) -> Result<Self, RecipeError> {
    let text = std::fs::read_to_string(path).map_err(|source| RecipeError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let mut spec = Self::from_toml_str(&text, path)?;

    if let Source::Local { path: local } = &mut spec.source
      && local.is_relative()
      && let Some(dir) = path.parent()
    {
      let dir = dunce::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
      *local = dir.join(&*local);
    }

    Ok(spec)
  }

  /// Check the recipe for missing or malformed fields.
  pub fn validate(&self) -> Result<(), RecipeError> {
    let invalid = |reason: String| RecipeError::Invalid {
      name: if self.name.is_empty() {
        "<unnamed>".to_string()
      } else {
        self.name.clone()
      },
      reason,
    };

    if self.name.is_empty() {
      return Err(invalid("missing name".to_string()));
    }
    if !self
      .name
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+'))
    {
      return Err(invalid(format!("name contains invalid characters: {}", self.name)));
    }
    if self.version.trim().is_empty() {
      return Err(invalid("missing version".to_string()));
    }
    // The version names the build directory and is spliced into URLs.
    if self.version.contains(['/', '\\']) || self.version.contains("..") || self.version == "." {
      return Err(invalid(format!("version contains invalid characters: {}", self.version)));
    }

    match &self.source {
      Source::Tarball { url, sha256, .. } => {
        if url.trim().is_empty() {
          return Err(invalid("missing source url".to_string()));
        }
        if !(url.starts_with("https://") || url.starts_with("http://")) {
          return Err(invalid(format!("source url must be http(s): {url}")));
        }
        if !is_sha256_hex(sha256) {
          return Err(invalid(format!("sha256 must be 64 hex characters, got '{sha256}'")));
        }
      }
      Source::Git { repo, tag } => {
        if repo.trim().is_empty() {
          return Err(invalid("missing git repo".to_string()));
        }
        if tag.trim().is_empty() {
          return Err(invalid("missing git tag".to_string()));
        }
      }
      Source::Local { path } => {
        if path.as_os_str().is_empty() {
          return Err(invalid("missing local source path".to_string()));
        }
      }
    }

    let mut seen = HashSet::new();
    for dep in &self.dependencies {
      if dep.is_empty() {
        return Err(invalid("empty dependency name".to_string()));
      }
      if dep == &self.name {
        return Err(invalid("project depends on itself".to_string()));
      }
      if !seen.insert(dep.as_str()) {
        return Err(invalid(format!("duplicate dependency '{dep}'")));
      }
    }

    for (index, step) in self.steps.iter().enumerate() {
      if step.when.as_deref().is_some_and(str::is_empty) {
        return Err(invalid(format!("step {index} has an empty `when` flag")));
      }
      for template in step.templates() {
        placeholder::validate(template).map_err(|e| invalid(format!("step {index}: {e}")))?;
      }
    }

    for (key, value) in &self.env {
      if key.is_empty() {
        return Err(invalid("empty environment variable name".to_string()));
      }
      placeholder::validate(value.value()).map_err(|e| invalid(format!("env {key}: {e}")))?;
    }

    Ok(())
  }
}

/// Load every `*.toml` recipe in `dir`, ordered by file name.
pub fn load_dir(dir: &Path) -> Result<Vec<ProjectSpec>, RecipeError> {
  let entries = std::fs::read_dir(dir).map_err(|source| RecipeError::Read {
    path: dir.to_path_buf(),
    source,
  })?;

  let mut files = Vec::new();
  for entry in entries {
    let path = entry
      .map_err(|source| RecipeError::Read {
        path: dir.to_path_buf(),
        source,
      })?
      .path();
    if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
      files.push(path);
    }
  }
  files.sort();

  let mut specs = Vec::with_capacity(files.len());
  for path in files {
    debug!(path = %path.display(), "loading recipe");
    specs.push(ProjectSpec::load(&path)?);
  }

  Ok(specs)
}
