//! Shared download cache.
//!
//! Archives are stored at `<root>/<sha256>/<file name>` and keyed by URL plus
//! checksum. Concurrent requests for the same key coalesce onto one download:
//! each key owns a [`OnceCell`] and every waiter observes the same verified
//! file. A failed download leaves the cell empty, so the next waiter retries.
//!
//! Every download streams into its own uniquely named temp file beside the
//! destination, which is renamed into place only after the checksum matches.
//! A verified path never holds a truncated or corrupt archive, even when
//! several processes share one cache root.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use crate::consts::PARTIAL_SUFFIX;
use crate::util::hash::{ContentHash, hash_file};

#[derive(Debug, Error)]
pub enum FetchError {
  #[error("failed to create HTTP client: {0}")]
  Client(#[source] reqwest::Error),

  #[error("download of {url} failed: {source}")]
  Http {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("download of {url} failed: HTTP {status}")]
  Status { url: String, status: u16 },

  #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
  ChecksumMismatch { url: String, expected: String, actual: String },

  #[error("cache I/O error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

type CacheKey = (String, String);

/// Content-addressed archive cache. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct DownloadCache {
  inner: Arc<Inner>,
}

struct Inner {
  root: PathBuf,
  client: reqwest::Client,
  cells: Mutex<HashMap<CacheKey, Arc<OnceCell<PathBuf>>>>,
  network_fetches: AtomicUsize,
}

impl DownloadCache {
  /// Create a cache rooted at `root`. `timeout` bounds each network request.
  pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Result<Self, FetchError> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .user_agent(concat!("forge/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(FetchError::Client)?;

    Ok(Self {
      inner: Arc::new(Inner {
        root: root.into(),
        client,
        cells: Mutex::new(HashMap::new()),
        network_fetches: AtomicUsize::new(0),
      }),
    })
  }

  pub fn root(&self) -> &Path {
    &self.inner.root
  }

  /// Where the archive for `url` with checksum `sha256` is stored.
  pub fn path_for(&self, url: &str, sha256: &str) -> PathBuf {
    self.inner.root.join(sha256.to_ascii_lowercase()).join(url_to_filename(url))
  }

  /// Number of network downloads this cache has started.
  pub fn network_fetches(&self) -> usize {
    self.inner.network_fetches.load(Ordering::SeqCst)
  }

  /// Return a verified local copy of `url`, downloading it at most once.
  pub async fn fetch(&self, url: &str, sha256: &str) -> Result<PathBuf, FetchError> {
    let expected = sha256.to_ascii_lowercase();
    let cell = {
      let mut cells = self.inner.cells.lock().await;
      cells.entry((url.to_string(), expected.clone())).or_default().clone()
    };

    let path = cell.get_or_try_init(|| self.fetch_uncached(url, &expected)).await?;
    Ok(path.clone())
  }

  async fn fetch_uncached(&self, url: &str, expected: &str) -> Result<PathBuf, FetchError> {
    let dest = self.path_for(url, expected);

    if fs::try_exists(&dest).await.unwrap_or(false) {
      let actual = hash_blocking(&dest).await?;
      if actual.matches(expected) {
        debug!(path = %dest.display(), "using cached archive");
        return Ok(dest);
      }
      warn!(path = %dest.display(), expected, actual = %actual, "cached archive is corrupt, downloading again");
    }

    self.download(url, expected, &dest).await?;
    Ok(dest)
  }

  async fn download(&self, url: &str, expected: &str, dest: &Path) -> Result<(), FetchError> {
    info!(url = %url, "downloading");
    self.inner.network_fetches.fetch_add(1, Ordering::SeqCst);

    let dir = dest.parent().unwrap_or(&self.inner.root);
    fs::create_dir_all(dir).await.map_err(|source| FetchError::Io {
      path: dir.to_path_buf(),
      source,
    })?;

    let http_err = |source: reqwest::Error| FetchError::Http {
      url: url.to_string(),
      source,
    };

    let mut response = self.inner.client.get(url).send().await.map_err(http_err)?;
    if !response.status().is_success() {
      return Err(FetchError::Status {
        url: url.to_string(),
        status: response.status().as_u16(),
      });
    }

    // Each download gets its own temp file so concurrent processes sharing
    // the cache root never write into the same path.
    let file_name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    let temp = tempfile::Builder::new()
      .prefix(&file_name)
      .suffix(PARTIAL_SUFFIX)
      .tempfile_in(dir)
      .map_err(|source| FetchError::Io {
        path: dir.to_path_buf(),
        source,
      })?;
    let (file, temp_path) = temp.into_parts();
    let io_err = |source: std::io::Error| FetchError::Io {
      path: temp_path.to_path_buf(),
      source,
    };

    // Hash while writing so the archive is read only once.
    let mut file = fs::File::from_std(file);
    let mut hasher = Sha256::new();
    let mut size = 0usize;
    while let Some(chunk) = response.chunk().await.map_err(http_err)? {
      hasher.update(&chunk);
      size += chunk.len();
      file.write_all(&chunk).await.map_err(io_err)?;
    }
    file.flush().await.map_err(io_err)?;
    drop(file);

    // Dropping `temp_path` on any early return removes the temp file.
    let actual = ContentHash(hex::encode(hasher.finalize()));
    if !actual.matches(expected) {
      return Err(FetchError::ChecksumMismatch {
        url: url.to_string(),
        expected: expected.to_string(),
        actual: actual.0,
      });
    }

    if let Err(err) = temp_path.persist(dest) {
      // Another process may have put the same verified archive in place first.
      let verified = fs::try_exists(dest).await.unwrap_or(false) && hash_blocking(dest).await?.matches(expected);
      if !verified {
        return Err(FetchError::Io {
          path: dest.to_path_buf(),
          source: err.error,
        });
      }
      debug!(path = %dest.display(), "archive was placed by a concurrent download");
    }

    info!(path = %dest.display(), size, "download complete");
    Ok(())
  }
}

async fn hash_blocking(path: &Path) -> Result<ContentHash, FetchError> {
  let owned = path.to_path_buf();
  let io_err = |source: std::io::Error| FetchError::Io {
    path: path.to_path_buf(),
    source,
  };
  let hash = tokio::task::spawn_blocking(move || hash_file(&owned))
    .await
    .map_err(|e| io_err(std::io::Error::other(e)))?
    .map_err(io_err)?;
  Ok(hash)
}

/// Convert a URL to a safe filename.
///
/// Takes the last path component and sanitizes it. Falls back to a hash of the
/// URL if no suitable filename can be extracted.
fn url_to_filename(url: &str) -> String {
  if let Some(filename) = url.rsplit('/').next() {
    let filename = filename.split(['?', '#']).next().unwrap_or(filename);

    let sanitized: String = filename
      .chars()
      .map(|c| {
        if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
          c
        } else {
          '_'
        }
      })
      .collect();

    if !sanitized.is_empty() && sanitized != "." && sanitized != ".." {
      return sanitized;
    }
  }

  let digest = hex::encode(Sha256::digest(url.as_bytes()));
  format!("download_{}", &digest[..16])
}
