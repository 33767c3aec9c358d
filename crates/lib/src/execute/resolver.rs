//! Placeholder resolver for recipe steps.

use crate::env::{self, Env, ProjectVars};
use crate::placeholder::{PlaceholderError, Resolver};

/// Resolves placeholders in one project's steps.
///
/// This resolver knows about:
/// - the project variables (`name`, `version`, `prefix`, `build_dir`, ...)
/// - the project's computed build environment, for `$${env:NAME}`
/// - the current match of a `for_each` step, as `$${item}`
pub struct StepResolver<'a> {
  vars: &'a ProjectVars,
  env: &'a Env,
  item: Option<&'a str>,
}

impl<'a> StepResolver<'a> {
  pub fn new(vars: &'a ProjectVars, env: &'a Env) -> Self {
    Self { vars, env, item: None }
  }

  /// A resolver that additionally binds `$${item}`.
  pub fn with_item<'b>(&self, item: &'b str) -> StepResolver<'b>
  where
    'a: 'b,
  {
    StepResolver {
      vars: self.vars,
      env: self.env,
      item: Some(item),
    }
  }
}

impl Resolver for StepResolver<'_> {
  fn resolve_var(&self, name: &str) -> Result<&str, PlaceholderError> {
    if name == "item"
      && let Some(item) = self.item
    {
      return Ok(item);
    }
    self
      .vars
      .get(name)
      .ok_or_else(|| PlaceholderError::UnknownVar(name.to_string()))
  }

  fn resolve_env(&self, name: &str) -> Result<&str, PlaceholderError> {
    env::get_var(self.env, name).ok_or_else(|| PlaceholderError::UnsetEnv(name.to_string()))
  }
}
