//! Placeholder parsing and substitution for recipe steps.
//!
//! Recipe steps and environment overrides are written before the build
//! directory, install prefix or toolchain locations are known. Placeholders
//! mark those values and are substituted per project at execution time.
//!
//! # Placeholder Formats
//!
//! - `$${name}` - a project variable such as `prefix`, `build_dir`, `version`
//! - `$${env:NAME}` - a variable from the project's computed build environment
//!
//! # Shell Variables
//!
//! Single `$` characters pass through unchanged, so shell variables like
//! `$HOME` and `%PATH%` work naturally without any escaping.
//!
//! # Escaping
//!
//! Use `$$$` before `{` to produce a literal `$${` sequence.
//!
//! # Example
//!
//! ```
//! use forge_lib::placeholder::{parse, Segment, Placeholder};
//!
//! let segments = parse("$${prefix}/include:$HOME").unwrap();
//! assert_eq!(segments, vec![
//!     Segment::Placeholder(Placeholder::Var("prefix".to_string())),
//!     Segment::Literal("/include:$HOME".to_string()),
//! ]);
//! ```

use thiserror::Error;

/// A parsed placeholder reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
  /// `$${name}` - a project variable
  Var(String),

  /// `$${env:NAME}` - a variable of the computed build environment
  Env(String),
}

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Literal text (no placeholders)
  Literal(String),

  /// A placeholder to be resolved
  Placeholder(Placeholder),
}

/// Errors that can occur during placeholder parsing or resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
  #[error("unclosed placeholder at position {0}")]
  Unclosed(usize),

  #[error("unknown placeholder type: {0}")]
  UnknownType(String),

  #[error("malformed placeholder: {0}")]
  Malformed(String),

  #[error("unknown variable: {0}")]
  UnknownVar(String),

  #[error("environment variable not set in build environment: {0}")]
  UnsetEnv(String),
}

/// Resolves placeholder values during execution.
pub trait Resolver {
  /// Resolve a project variable by name.
  fn resolve_var(&self, name: &str) -> Result<&str, PlaceholderError>;

  /// Resolve a variable from the build environment.
  fn resolve_env(&self, name: &str) -> Result<&str, PlaceholderError>;
}

/// Parse a string containing placeholders into segments.
///
/// # Errors
///
/// Returns an error if a placeholder is malformed (unclosed, unknown type,
/// empty or invalid name).
pub fn parse(input: &str) -> Result<Vec<Segment>, PlaceholderError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut chars = input.char_indices().peekable();

  while let Some((pos, ch)) = chars.next() {
    if ch != '$' {
      literal.push(ch);
      continue;
    }

    match chars.peek() {
      Some((_, '$')) => {
        chars.next();

        match chars.peek() {
          Some((_, '$')) => {
            chars.next();

            match chars.peek() {
              Some((_, '{')) => {
                // $$${ -> literal $${
                literal.push_str("$${");
                chars.next();
              }
              _ => literal.push_str("$$$"),
            }
          }
          Some((_, '{')) => {
            chars.next();

            if !literal.is_empty() {
              segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }

            let mut content = String::new();
            let mut found_close = false;

            for (_, c) in chars.by_ref() {
              if c == '}' {
                found_close = true;
                break;
              }
              content.push(c);
            }

            if !found_close {
              return Err(PlaceholderError::Unclosed(pos));
            }

            segments.push(Segment::Placeholder(parse_placeholder_content(&content)?));
          }
          _ => literal.push_str("$$"),
        }
      }
      _ => literal.push('$'),
    }
  }

  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  Ok(segments)
}

/// Parse the content between `$${` and `}`.
fn parse_placeholder_content(content: &str) -> Result<Placeholder, PlaceholderError> {
  match content.split_once(':') {
    None => {
      validate_name(content)?;
      Ok(Placeholder::Var(content.to_string()))
    }
    Some(("env", name)) => {
      validate_name(name)?;
      Ok(Placeholder::Env(name.to_string()))
    }
    Some((kind, _)) => Err(PlaceholderError::UnknownType(kind.to_string())),
  }
}

fn validate_name(name: &str) -> Result<(), PlaceholderError> {
  let mut chars = name.chars();
  let valid_start = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
  if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
    return Err(PlaceholderError::Malformed(format!("invalid name '{name}'")));
  }
  Ok(())
}

/// Substitute all placeholders in a string using the provided resolver.
///
/// # Errors
///
/// Returns an error if parsing fails or if any placeholder cannot be resolved.
pub fn substitute(input: &str, resolver: &impl Resolver) -> Result<String, PlaceholderError> {
  let segments = parse(input)?;
  substitute_segments(&segments, resolver)
}

/// Substitute placeholders in pre-parsed segments.
pub fn substitute_segments(segments: &[Segment], resolver: &impl Resolver) -> Result<String, PlaceholderError> {
  let mut result = String::new();

  for segment in segments {
    match segment {
      Segment::Literal(s) => result.push_str(s),
      Segment::Placeholder(Placeholder::Var(name)) => result.push_str(resolver.resolve_var(name)?),
      Segment::Placeholder(Placeholder::Env(name)) => result.push_str(resolver.resolve_env(name)?),
    }
  }

  Ok(result)
}

/// Check that every placeholder in `input` parses, without resolving it.
pub fn validate(input: &str) -> Result<(), PlaceholderError> {
  parse(input).map(|_| ())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  struct TestResolver {
    vars: HashMap<String, String>,
    env: HashMap<String, String>,
  }

  impl TestResolver {
    fn new() -> Self {
      Self {
        vars: HashMap::new(),
        env: HashMap::new(),
      }
    }

    fn with_var(mut self, name: &str, value: &str) -> Self {
      self.vars.insert(name.to_string(), value.to_string());
      self
    }

    fn with_env(mut self, name: &str, value: &str) -> Self {
      self.env.insert(name.to_string(), value.to_string());
      self
    }
  }

  impl Resolver for TestResolver {
    fn resolve_var(&self, name: &str) -> Result<&str, PlaceholderError> {
      self
        .vars
        .get(name)
        .map(|s| s.as_str())
        .ok_or_else(|| PlaceholderError::UnknownVar(name.to_string()))
    }

    fn resolve_env(&self, name: &str) -> Result<&str, PlaceholderError> {
      self
        .env
        .get(name)
        .map(|s| s.as_str())
        .ok_or_else(|| PlaceholderError::UnsetEnv(name.to_string()))
    }
  }

  #[test]
  fn parse_plain_literal() {
    assert_eq!(
      parse("ninja -C _build").unwrap(),
      vec![Segment::Literal("ninja -C _build".to_string())]
    );
  }

  #[test]
  fn parse_var_and_env() {
    let segments = parse("$${python_dir}/python.exe $${env:INCLUDE}").unwrap();
    assert_eq!(
      segments,
      vec![
        Segment::Placeholder(Placeholder::Var("python_dir".to_string())),
        Segment::Literal("/python.exe ".to_string()),
        Segment::Placeholder(Placeholder::Env("INCLUDE".to_string())),
      ]
    );
  }

  #[test]
  fn meson_setup_command() {
    let resolver = TestResolver::new().with_var("prefix", "C:/gtk-build/gtk/x64/release");

    let result = substitute("meson setup _build --prefix $${prefix} --buildtype release", &resolver).unwrap();

    assert_eq!(
      result,
      "meson setup _build --prefix C:/gtk-build/gtk/x64/release --buildtype release"
    );
  }

  #[test]
  fn wheel_install_per_item() {
    let resolver = TestResolver::new()
      .with_var("python_dir", "C:/Python311")
      .with_var("item", "dist/pycairo-1.24.0-cp311-cp311-win_amd64.whl");

    let result = substitute("$${python_dir}/python.exe -m pip install $${item}", &resolver).unwrap();

    assert_eq!(
      result,
      "C:/Python311/python.exe -m pip install dist/pycairo-1.24.0-cp311-cp311-win_amd64.whl"
    );
  }

  #[test]
  fn env_placeholder_reads_build_environment() {
    let resolver = TestResolver::new().with_env("INCLUDE", "/prefix/include");
    assert_eq!(substitute("-I$${env:INCLUDE}", &resolver).unwrap(), "-I/prefix/include");
  }

  #[test]
  fn shell_variables_pass_through() {
    let resolver = TestResolver::new();
    let result = substitute("echo $HOME %PATH% $1 $?", &resolver).unwrap();
    assert_eq!(result, "echo $HOME %PATH% $1 $?");
  }

  #[test]
  fn double_dollar_without_brace_preserved() {
    let resolver = TestResolver::new();
    assert_eq!(substitute("echo $$pid", &resolver).unwrap(), "echo $$pid");
  }

  #[test]
  fn escape_placeholder_syntax() {
    let resolver = TestResolver::new();
    assert_eq!(substitute("echo $$${prefix}", &resolver).unwrap(), "echo $${prefix}");
  }

  #[test]
  fn adjacent_placeholders() {
    let resolver = TestResolver::new().with_var("name", "pycairo").with_var("version", "1.24.0");
    assert_eq!(substitute("$${name}-$${version}", &resolver).unwrap(), "pycairo-1.24.0");
  }

  #[test]
  fn empty_input() {
    assert!(parse("").unwrap().is_empty());
  }

  #[test]
  fn error_unclosed_placeholder() {
    assert!(matches!(parse("cd $${build_dir"), Err(PlaceholderError::Unclosed(3))));
  }

  #[test]
  fn error_unknown_placeholder_type() {
    assert!(matches!(parse("$${action:0}"), Err(PlaceholderError::UnknownType(ref s)) if s == "action"));
  }

  #[test]
  fn error_invalid_name() {
    assert!(matches!(parse("$${}"), Err(PlaceholderError::Malformed(_))));
    assert!(matches!(parse("$${1abc}"), Err(PlaceholderError::Malformed(_))));
    assert!(matches!(parse("$${env:}"), Err(PlaceholderError::Malformed(_))));
  }

  #[test]
  fn error_unknown_var() {
    let resolver = TestResolver::new();
    assert!(matches!(
      substitute("$${nope}", &resolver),
      Err(PlaceholderError::UnknownVar(ref s)) if s == "nope"
    ));
  }

  #[test]
  fn error_unset_env() {
    let resolver = TestResolver::new();
    assert!(matches!(
      substitute("$${env:LIB}", &resolver),
      Err(PlaceholderError::UnsetEnv(ref s)) if s == "LIB"
    ));
  }

  #[test]
  fn validate_accepts_well_formed_input() {
    assert!(validate("$${prefix}/share/doc/$${name}").is_ok());
    assert!(validate("$${prefix").is_err());
  }
}
