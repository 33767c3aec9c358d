//! Project registry.
//!
//! Holds every registered recipe, keyed by name. Registration is an explicit
//! call made at startup; the registry keeps registration order so the
//! resolver can break ties deterministically.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::recipe::{self, ProjectSpec, RecipeError};

#[derive(Debug, Error)]
pub enum RegistryError {
  #[error("project '{0}' is already registered")]
  DuplicateName(String),

  #[error("unknown project '{0}'")]
  UnknownProject(String),

  #[error(transparent)]
  Recipe(#[from] RecipeError),
}

/// All registered recipes.
#[derive(Debug, Default, Clone)]
pub struct Registry {
  specs: Vec<ProjectSpec>,
  index: HashMap<String, usize>,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a recipe. Fails if a recipe with the same name exists.
  pub fn register(&mut self, spec: ProjectSpec) -> Result<(), RegistryError> {
    if self.index.contains_key(&spec.name) {
      return Err(RegistryError::DuplicateName(spec.name));
    }

    debug!(project = %spec.name, version = %spec.version, "registered recipe");
    self.index.insert(spec.name.clone(), self.specs.len());
    self.specs.push(spec);
    Ok(())
  }

  /// Register every recipe file in a directory.
  ///
  /// Returns the number of recipes registered.
  pub fn load_dir(&mut self, dir: &Path) -> Result<usize, RegistryError> {
    let specs = recipe::load_dir(dir)?;
    let count = specs.len();
    for spec in specs {
      self.register(spec)?;
    }
    Ok(count)
  }

  /// Look up a recipe by name.
  pub fn lookup(&self, name: &str) -> Result<&ProjectSpec, RegistryError> {
    self
      .index
      .get(name)
      .map(|&i| &self.specs[i])
      .ok_or_else(|| RegistryError::UnknownProject(name.to_string()))
  }

  pub fn get(&self, name: &str) -> Option<&ProjectSpec> {
    self.index.get(name).map(|&i| &self.specs[i])
  }

  pub fn contains(&self, name: &str) -> bool {
    self.index.contains_key(name)
  }

  /// Position of a recipe in registration order.
  pub fn position(&self, name: &str) -> Option<usize> {
    self.index.get(name).copied()
  }

  /// Recipes in registration order.
  pub fn iter(&self) -> impl Iterator<Item = &ProjectSpec> {
    self.specs.iter()
  }

  /// Names in registration order.
  pub fn names(&self) -> Vec<&str> {
    self.specs.iter().map(|s| s.name.as_str()).collect()
  }

  pub fn len(&self) -> usize {
    self.specs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.specs.is_empty()
  }
}
