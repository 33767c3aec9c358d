//! Crate-wide constants.

/// Application name used for config, data and cache directory names.
pub const APP_NAME: &str = "forge";

/// Config file name looked up inside the config directory.
pub const CONFIG_FILENAME: &str = "forge.toml";

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "FORGE_CONFIG";

/// Token substituted with the project version in URL templates and git tags.
pub const VERSION_TOKEN: &str = "{version}";

/// Marker written into an acquired source tree, holding the source identity.
pub const SOURCE_MARKER: &str = ".forge-source";

/// Suffix for in-progress downloads inside the cache.
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Directory, relative to the project build directory, used by generated build-system steps.
pub const BUILD_SUBDIR: &str = "_build";

/// Number of bytes of captured step output kept in error reports.
pub const CAPTURED_OUTPUT_LIMIT: usize = 4096;

/// Default network timeout for source downloads, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 300;

/// Separator for PATH-like environment variables on this platform.
#[cfg(windows)]
pub const PATH_LIST_SEPARATOR: &str = ";";

/// Separator for PATH-like environment variables on this platform.
#[cfg(not(windows))]
pub const PATH_LIST_SEPARATOR: &str = ":";
