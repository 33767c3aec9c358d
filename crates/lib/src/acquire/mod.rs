//! Source acquisition.
//!
//! Puts a project's source tree into its build directory. The strategy comes
//! from the recipe's [`Source`]: tarballs go through the shared
//! [`DownloadCache`] and are extracted, git sources are shallow-cloned at a
//! tag, local sources are copied.
//!
//! A marker file records the identity of the acquired source. When it matches
//! the recipe, acquisition is a no-op, so re-running a plan does not extract
//! again.

pub mod extract;

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::cache::{DownloadCache, FetchError};
use crate::consts::SOURCE_MARKER;
use crate::recipe::{ProjectSpec, Source};
use crate::util::fs::copy_tree;

use extract::ArchiveKind;

#[derive(Debug, Error)]
pub enum AcquireError {
  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error("unsupported archive format: {0}")]
  UnsupportedArchive(PathBuf),

  #[error("failed to extract {archive}: {source}")]
  Extract {
    archive: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("git clone of {repo} at {tag} failed: {message}")]
  Git { repo: String, tag: String, message: String },

  #[error("local source {0} is not a directory")]
  MissingLocal(PathBuf),

  #[error("I/O error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Result of acquiring one project's source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquired {
  pub dir: PathBuf,
  /// The directory already held this exact source; nothing was done.
  pub reused: bool,
}

/// Acquires sources into build directories.
#[derive(Clone)]
pub struct Acquirer {
  cache: DownloadCache,
  clean: bool,
  network_timeout: Duration,
}

impl Acquirer {
  pub fn new(cache: DownloadCache, clean: bool, network_timeout: Duration) -> Self {
    Self {
      cache,
      clean,
      network_timeout,
    }
  }

  pub fn cache(&self) -> &DownloadCache {
    &self.cache
  }

  /// Make `build_dir` hold the source of `spec`.
  pub async fn acquire(&self, spec: &ProjectSpec, build_dir: &Path) -> Result<Acquired, AcquireError> {
    let source_id = spec.source_id();
    let marker = build_dir.join(SOURCE_MARKER);

    if self.clean {
      debug!(project = %spec.name, dir = %build_dir.display(), "cleaning build directory");
      remove_dir_if_exists(build_dir).await?;
    } else if read_marker(&marker).await.as_deref() == Some(source_id.as_str()) {
      debug!(project = %spec.name, "source already present");
      return Ok(Acquired {
        dir: build_dir.to_path_buf(),
        reused: true,
      });
    } else {
      // Whatever is there belongs to another source or an interrupted run.
      remove_dir_if_exists(build_dir).await?;
    }

    if let Some(parent) = build_dir.parent() {
      tokio::fs::create_dir_all(parent).await.map_err(|source| AcquireError::Io {
        path: parent.to_path_buf(),
        source,
      })?;
    }

    match &spec.source {
      Source::Tarball { sha256, strip_root, .. } => {
        let url = spec.archive_url().unwrap_or_default();
        let archive = self.cache.fetch(&url, sha256).await?;
        extract_archive(archive, build_dir.to_path_buf(), *strip_root).await?;
      }
      Source::Git { repo, tag } => {
        let tag = spec.expand_version(tag);
        self.clone_git(repo, &tag, build_dir).await?;
      }
      Source::Local { path } => {
        copy_local(path.clone(), build_dir.to_path_buf()).await?;
      }
    }

    tokio::fs::write(&marker, &source_id).await.map_err(|source| AcquireError::Io {
      path: marker.clone(),
      source,
    })?;

    info!(project = %spec.name, source = %source_id, dir = %build_dir.display(), "source acquired");
    Ok(Acquired {
      dir: build_dir.to_path_buf(),
      reused: false,
    })
  }

  async fn clone_git(&self, repo: &str, tag: &str, dest: &Path) -> Result<(), AcquireError> {
    info!(repo = %repo, tag = %tag, "cloning");
    let git_err = |message: String| AcquireError::Git {
      repo: repo.to_string(),
      tag: tag.to_string(),
      message,
    };

    let mut command = Command::new("git");
    command
      .args(["clone", "--depth", "1", "--branch", tag, repo])
      .arg(dest)
      .env("GIT_TERMINAL_PROMPT", "0")
      .kill_on_drop(true);

    let output = tokio::time::timeout(self.network_timeout, command.output())
      .await
      .map_err(|_| git_err(format!("timed out after {}s", self.network_timeout.as_secs())))?
      .map_err(|e| git_err(format!("failed to run git: {e}")))?;

    if !output.status.success() {
      return Err(git_err(String::from_utf8_lossy(&output.stderr).trim().to_string()));
    }
    Ok(())
  }
}

async fn read_marker(marker: &Path) -> Option<String> {
  tokio::fs::read_to_string(marker).await.ok().map(|s| s.trim().to_string())
}

async fn remove_dir_if_exists(dir: &Path) -> Result<(), AcquireError> {
  match tokio::fs::remove_dir_all(dir).await {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
    Err(source) => Err(AcquireError::Io {
      path: dir.to_path_buf(),
      source,
    }),
  }
}

async fn extract_archive(archive: PathBuf, dest: PathBuf, strip_root: bool) -> Result<(), AcquireError> {
  let kind = ArchiveKind::from_path(&archive).ok_or_else(|| AcquireError::UnsupportedArchive(archive.clone()))?;
  debug!(archive = %archive.display(), dest = %dest.display(), "extracting");

  let archive_path = archive.clone();
  tokio::task::spawn_blocking(move || extract::unpack(&archive_path, kind, &dest, strip_root))
    .await
    .map_err(|e| AcquireError::Extract {
      archive: archive.clone(),
      source: std::io::Error::other(e),
    })?
    .map_err(|source| AcquireError::Extract { archive, source })
}

async fn copy_local(src: PathBuf, dest: PathBuf) -> Result<(), AcquireError> {
  if !src.is_dir() {
    return Err(AcquireError::MissingLocal(src));
  }

  let io_err = |source: std::io::Error| AcquireError::Io {
    path: src.clone(),
    source,
  };
  let from = src.clone();
  let copied = tokio::task::spawn_blocking(move || copy_tree(&from, &dest))
    .await
    .map_err(|e| io_err(std::io::Error::other(e)))?
    .map_err(io_err)?;

  debug!(src = %src.display(), files = copied, "copied local source");
  Ok(())
}
