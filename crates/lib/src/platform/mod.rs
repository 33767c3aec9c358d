//! Platform detection and well-known directories.

pub mod paths;

/// Returns a `<arch>-<os>` identifier for the running host (e.g. `x86_64-windows`).
pub fn host_triple() -> String {
  format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS)
}

/// Join PATH-like entries with the platform separator, skipping empty ones.
pub fn join_path_list<I, S>(entries: I) -> String
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  entries
    .into_iter()
    .filter(|e| !e.as_ref().is_empty())
    .map(|e| e.as_ref().to_string())
    .collect::<Vec<_>>()
    .join(crate::consts::PATH_LIST_SEPARATOR)
}
