//! Archive extraction.
//!
//! Supports `.tar.gz`/`.tgz`, `.tar.zst`/`.tzst`, `.tar` and `.zip`. With
//! `strip_root` the first path component of every entry is dropped, which
//! turns the usual `pycairo-1.24.0/...` layout into the build directory root.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

/// Archive formats we know how to unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
  TarGz,
  TarZst,
  Tar,
  Zip,
}

impl ArchiveKind {
  /// Detect the format from the file name.
  pub fn from_path(path: &Path) -> Option<Self> {
    let name = path.file_name()?.to_str()?.to_ascii_lowercase();
    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
      Some(ArchiveKind::TarGz)
    } else if name.ends_with(".tar.zst") || name.ends_with(".tzst") {
      Some(ArchiveKind::TarZst)
    } else if name.ends_with(".tar") {
      Some(ArchiveKind::Tar)
    } else if name.ends_with(".zip") {
      Some(ArchiveKind::Zip)
    } else {
      None
    }
  }
}

/// Unpack `archive` into `dest`, creating it if needed.
pub fn unpack(archive: &Path, kind: ArchiveKind, dest: &Path, strip_root: bool) -> io::Result<()> {
  fs::create_dir_all(dest)?;
  let file = BufReader::new(File::open(archive)?);

  match kind {
    ArchiveKind::TarGz => unpack_tar(GzDecoder::new(file), dest, strip_root),
    ArchiveKind::TarZst => unpack_tar(zstd::stream::read::Decoder::new(file)?, dest, strip_root),
    ArchiveKind::Tar => unpack_tar(file, dest, strip_root),
    ArchiveKind::Zip => unpack_zip(file, dest, strip_root),
  }
}

fn unpack_tar<R: Read>(reader: R, dest: &Path, strip_root: bool) -> io::Result<()> {
  let mut archive = Archive::new(reader);

  for entry in archive.entries()? {
    let mut entry = entry?;
    let path = entry.path()?.into_owned();

    let Some(relative) = entry_target(&path, strip_root)? else {
      continue;
    };
    let dest_path = dest.join(relative);

    if let Some(parent) = dest_path.parent() {
      fs::create_dir_all(parent)?;
    }

    // Hard-link names are archive paths, so they get the same root stripping.
    if entry.header().entry_type() == tar::EntryType::Link {
      let Some(link_name) = entry.link_name()? else {
        continue;
      };
      let Some(target) = entry_target(&link_name, strip_root)? else {
        continue;
      };
      link_or_copy(&dest.join(target), &dest_path)?;
      continue;
    }

    entry.unpack(&dest_path)?;
  }

  Ok(())
}

fn link_or_copy(original: &Path, link: &Path) -> io::Result<()> {
  if link.exists() {
    fs::remove_file(link)?;
  }
  if fs::hard_link(original, link).is_err() {
    fs::copy(original, link)?;
  }
  Ok(())
}

fn unpack_zip<R: Read + io::Seek>(reader: R, dest: &Path, strip_root: bool) -> io::Result<()> {
  let mut archive = zip::ZipArchive::new(reader).map_err(io::Error::other)?;

  for i in 0..archive.len() {
    let mut file = archive.by_index(i).map_err(io::Error::other)?;

    let path = file
      .enclosed_name()
      .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, format!("invalid zip entry name: {}", file.name())))?;

    let Some(relative) = entry_target(&path, strip_root)? else {
      continue;
    };
    let dest_path = dest.join(relative);

    if file.is_dir() {
      fs::create_dir_all(&dest_path)?;
      continue;
    }

    if let Some(parent) = dest_path.parent() {
      fs::create_dir_all(parent)?;
    }

    let mut outfile = File::create(&dest_path)?;
    io::copy(&mut file, &mut outfile)?;

    #[cfg(unix)]
    {
      use std::os::unix::fs::PermissionsExt;
      if let Some(mode) = file.unix_mode() {
        fs::set_permissions(&dest_path, fs::Permissions::from_mode(mode))?;
      }
    }
  }

  Ok(())
}

/// Where an entry lands relative to the destination. `None` for the stripped
/// root itself. Entries escaping the destination are rejected.
fn entry_target(path: &Path, strip_root: bool) -> io::Result<Option<PathBuf>> {
  let mut out = PathBuf::new();
  for component in path.components() {
    match component {
      Component::Normal(part) => out.push(part),
      Component::CurDir => {}
      _ => {
        return Err(io::Error::new(
          io::ErrorKind::InvalidData,
          format!("archive entry escapes destination: {}", path.display()),
        ));
      }
    }
  }

  let relative: PathBuf = if strip_root {
    out.components().skip(1).collect()
  } else {
    out
  };

  if relative.as_os_str().is_empty() {
    Ok(None)
  } else {
    Ok(Some(relative))
  }
}
