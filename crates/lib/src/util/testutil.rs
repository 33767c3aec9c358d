//! Test helpers for forge-lib.
//!
//! Recipe `cmd` steps run through the platform shell; these return command
//! strings that behave the same on Unix (`/bin/sh`) and Windows (`cmd.exe`).

/// A command that creates an empty file in the current directory.
#[cfg(unix)]
pub fn touch(filename: &str) -> String {
  format!("touch {filename}")
}

#[cfg(windows)]
pub fn touch(filename: &str) -> String {
  format!("type nul > {filename}")
}

/// A command that writes the value of an environment variable to a file.
#[cfg(unix)]
pub fn write_env(var: &str, filename: &str) -> String {
  format!("printf '%s' \"${var}\" > {filename}")
}

#[cfg(windows)]
pub fn write_env(var: &str, filename: &str) -> String {
  format!("<nul set /p=%{var}%> {filename}")
}

/// A command that prints `msg` and exits with status 3.
#[cfg(unix)]
pub fn fail(msg: &str) -> String {
  format!("echo {msg}; exit 3")
}

#[cfg(windows)]
pub fn fail(msg: &str) -> String {
  format!("echo {msg}& exit /b 3")
}
