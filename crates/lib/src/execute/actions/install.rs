//! Install steps: copy build artifacts into the prefix.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::execute::types::ExecuteError;
use crate::util::fs::{copy_into, copy_tree};

/// Expand a pattern relative to `base`, returning sorted matches.
///
/// A pattern without glob metacharacters matches the single path it names
/// when that path exists.
pub fn glob_in(base: &Path, pattern: &str) -> Result<Vec<PathBuf>, ExecuteError> {
  let pattern_err = |message: String| ExecuteError::Pattern {
    pattern: pattern.to_string(),
    message,
  };

  let base_str = base
    .to_str()
    .ok_or_else(|| pattern_err(format!("build directory is not valid UTF-8: {}", base.display())))?;
  let full = format!("{}/{}", glob::Pattern::escape(base_str), pattern);

  let mut matches = Vec::new();
  for entry in glob::glob(&full).map_err(|e| pattern_err(e.to_string()))? {
    matches.push(entry.map_err(|e| pattern_err(e.to_string()))?);
  }
  matches.sort();
  Ok(matches)
}

/// Copy every file matching `src` (relative to `build_dir`) into `dest`.
///
/// Returns the number of files installed. Matching nothing is an error.
pub fn install_files(build_dir: &Path, src: &str, dest: &Path) -> Result<usize, ExecuteError> {
  let install_err = |reason: String| ExecuteError::Install {
    src: src.to_string(),
    dest: dest.to_path_buf(),
    reason,
  };

  let files: Vec<PathBuf> = glob_in(build_dir, src)?.into_iter().filter(|p| p.is_file()).collect();
  if files.is_empty() {
    return Err(install_err("no files match".to_string()));
  }

  for file in &files {
    copy_into(file, dest).map_err(|e| install_err(e.to_string()))?;
  }

  info!(src = %src, dest = %dest.display(), files = files.len(), "installed files");
  Ok(files.len())
}

/// Copy the contents of the directory `src` (relative to `build_dir`) into `dest`.
pub fn install_dir(build_dir: &Path, src: &str, dest: &Path) -> Result<usize, ExecuteError> {
  let install_err = |reason: String| ExecuteError::Install {
    src: src.to_string(),
    dest: dest.to_path_buf(),
    reason,
  };

  let dir = build_dir.join(src);
  if !dir.is_dir() {
    return Err(install_err("not a directory".to_string()));
  }

  let copied = copy_tree(&dir, dest).map_err(|e| install_err(e.to_string()))?;
  info!(src = %src, dest = %dest.display(), files = copied, "installed directory");
  Ok(copied)
}
