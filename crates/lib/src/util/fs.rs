//! Filesystem helpers shared by acquisition and installation.

use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Copy the contents of `src` into `dest`, creating directories as needed.
/// Existing files in `dest` are overwritten. Returns the number of files copied.
pub fn copy_tree(src: &Path, dest: &Path) -> io::Result<usize> {
  std::fs::create_dir_all(dest)?;
  let mut copied = 0;

  for entry in WalkDir::new(src).min_depth(1).follow_links(true) {
    let entry = entry?;
    let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
    let target = dest.join(relative);

    if entry.file_type().is_dir() {
      std::fs::create_dir_all(&target)?;
    } else {
      if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
      }
      std::fs::copy(entry.path(), &target)?;
      copied += 1;
    }
  }

  Ok(copied)
}

/// Copy one file into `dest_dir`, keeping its file name.
pub fn copy_into(file: &Path, dest_dir: &Path) -> io::Result<()> {
  let name = file
    .file_name()
    .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("no file name: {}", file.display())))?;
  std::fs::create_dir_all(dest_dir)?;
  std::fs::copy(file, dest_dir.join(name))?;
  Ok(())
}
