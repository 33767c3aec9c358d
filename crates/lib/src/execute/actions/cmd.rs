//! Shell command steps.
//!
//! Commands run through the platform shell with exactly the project's
//! computed environment: the process environment is cleared first, so a
//! step sees what the environment builder produced and nothing else.

use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};

use crate::consts::CAPTURED_OUTPUT_LIMIT;
use crate::env::Env;
use crate::execute::types::ExecuteError;

/// Run `cmd` in `cwd` with environment `env`.
///
/// # Returns
///
/// The trimmed stdout on success. On a non-zero exit the error carries the
/// tail of the combined stdout and stderr.
pub async fn execute_cmd(cmd: &str, env: &Env, cwd: &Path, shell: Option<&str>) -> Result<String, ExecuteError> {
  info!(cmd = %cmd, cwd = %cwd.display(), "executing command");

  let (shell_cmd, shell_args) = get_shell(shell);

  let mut command = Command::new(&shell_cmd);
  command
    .args(&shell_args)
    .arg(cmd)
    .current_dir(cwd)
    .env_clear()
    .envs(env)
    .kill_on_drop(true);

  debug!(shell = %shell_cmd, vars = env.len(), "spawning process");

  let output = command.output().await.map_err(|source| ExecuteError::Io {
    path: cwd.to_path_buf(),
    source,
  })?;

  let stdout = String::from_utf8_lossy(&output.stdout);
  let stderr = String::from_utf8_lossy(&output.stderr);

  if !output.status.success() {
    if !stderr.is_empty() {
      debug!(stderr = %stderr, "command stderr");
    }
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "command stdout");
    }

    let combined = match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
      (true, _) => stderr.trim().to_string(),
      (false, true) => stdout.trim().to_string(),
      (false, false) => format!("{}\n{}", stdout.trim(), stderr.trim()),
    };

    return Err(ExecuteError::StepFailed {
      command: cmd.to_string(),
      code: output.status.code(),
      output: tail(&combined, CAPTURED_OUTPUT_LIMIT),
    });
  }

  let stdout = stdout.trim().to_string();
  if !stdout.is_empty() {
    debug!(stdout = %stdout, "command output");
  }

  Ok(stdout)
}

/// The last `limit` bytes of `text`, cut at a character boundary.
fn tail(text: &str, limit: usize) -> String {
  if text.len() <= limit {
    return text.to_string();
  }
  let mut start = text.len() - limit;
  while !text.is_char_boundary(start) {
    start += 1;
  }
  format!("...{}", &text[start..])
}

/// Get the shell command and arguments for the current platform.
///
/// An explicit shell from the configuration picks its flag by name:
/// PowerShell gets `-Command`, `cmd` gets `/C`, anything else is treated as
/// a POSIX shell and gets `-c`.
fn get_shell(override_shell: Option<&str>) -> (String, Vec<String>) {
  if let Some(shell) = override_shell {
    let args = if shell.contains("powershell") || shell.contains("pwsh") {
      vec!["-NoProfile".to_string(), "-Command".to_string()]
    } else if shell.contains("cmd") {
      vec!["/C".to_string()]
    } else {
      vec!["-c".to_string()]
    };
    return (shell.to_string(), args);
  }

  // Don't use $SHELL: interactive shells may source profiles that change PATH.
  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    ("cmd.exe".to_string(), vec!["/C".to_string()])
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil;
  use tempfile::TempDir;

  fn env_with_path() -> Env {
    let mut env = Env::new();
    if let Ok(path) = std::env::var("PATH") {
      env.insert("PATH".to_string(), path);
    }
    env
  }

  #[tokio::test]
  async fn execute_simple_command() {
    let temp_dir = TempDir::new().unwrap();

    let result = execute_cmd("echo hello", &env_with_path(), temp_dir.path(), None)
      .await
      .unwrap();

    assert_eq!(result, "hello");
  }

  #[tokio::test]
  async fn environment_is_exactly_the_given_one() {
    let temp_dir = TempDir::new().unwrap();
    let mut env = env_with_path();
    env.insert("PKG_CONFIG_PATH".to_string(), "/opt/gtk/lib/pkgconfig".to_string());

    execute_cmd(
      &testutil::write_env("PKG_CONFIG_PATH", "out.txt"),
      &env,
      temp_dir.path(),
      None,
    )
    .await
    .unwrap();

    assert_eq!(
      std::fs::read_to_string(temp_dir.path().join("out.txt")).unwrap().trim(),
      "/opt/gtk/lib/pkgconfig"
    );
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn process_environment_is_not_inherited() {
    let temp_dir = TempDir::new().unwrap();

    let result = execute_cmd("echo \"[${HOME:-}]\"", &Env::new(), temp_dir.path(), None)
      .await
      .unwrap();

    assert_eq!(result, "[]");
  }

  #[tokio::test]
  async fn runs_in_given_directory() {
    let temp_dir = TempDir::new().unwrap();
    let sub_dir = temp_dir.path().join("_build");
    tokio::fs::create_dir(&sub_dir).await.unwrap();

    execute_cmd(&testutil::touch("cwd_marker"), &env_with_path(), &sub_dir, None)
      .await
      .unwrap();

    assert!(sub_dir.join("cwd_marker").exists());
  }

  #[tokio::test]
  async fn failure_captures_output() {
    let temp_dir = TempDir::new().unwrap();

    let result = execute_cmd(&testutil::fail("cairo.h not found"), &env_with_path(), temp_dir.path(), None).await;

    match result {
      Err(ExecuteError::StepFailed { code, output, .. }) => {
        assert_eq!(code, Some(3));
        assert!(output.contains("cairo.h not found"));
      }
      other => panic!("expected step failure, got {other:?}"),
    }
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn execute_multiline_command() {
    let temp_dir = TempDir::new().unwrap();

    let cmd = r#"
      x=1
      y=2
      echo $((x + y))
    "#;

    let result = execute_cmd(cmd, &Env::new(), temp_dir.path(), None).await.unwrap();

    assert_eq!(result, "3");
  }

  #[test]
  fn tail_keeps_the_end() {
    assert_eq!(tail("abc", 10), "abc");
    assert_eq!(tail("abcdef", 3), "...def");
    // Never splits a multi-byte character.
    assert_eq!(tail("aé", 1), "...");
  }

  #[test]
  fn get_shell_with_override() {
    let (shell, arg) = get_shell(Some("/usr/bin/bash"));
    assert_eq!(shell, "/usr/bin/bash");
    assert_eq!(arg, vec!["-c"]);
  }

  #[test]
  fn get_shell_with_powershell_override() {
    let (shell, args) = get_shell(Some("pwsh"));
    assert_eq!(shell, "pwsh");
    assert_eq!(args, vec!["-NoProfile", "-Command"]);
  }

  #[test]
  fn get_shell_with_cmd_override() {
    let (_, args) = get_shell(Some("cmd.exe"));
    assert_eq!(args, vec!["/C"]);
  }

  #[test]
  fn get_shell_default() {
    let (shell, args) = get_shell(None);
    #[cfg(unix)]
    {
      assert_eq!(shell, "/bin/sh");
      assert_eq!(args, vec!["-c"]);
    }
    #[cfg(windows)]
    {
      assert_eq!(shell, "cmd.exe");
      assert_eq!(args, vec!["/C"]);
    }
  }
}
