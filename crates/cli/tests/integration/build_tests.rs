//! Build command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn build_installs_dependency_first() {
  let env = TestEnv::new();

  env
    .build_cmd("recipes")
    .arg("libpng")
    .assert()
    .success()
    .stdout(predicate::str::contains("Building 2 project(s): zlib, libpng"))
    .stdout(predicate::str::contains("2 built, 0 failed, 0 skipped"));

  assert!(env.prefix().join("share/doc/zlib/LICENSE").is_file());
  assert!(env.prefix().join("share/doc/libpng/LICENSE").is_file());
  assert!(env.build_root().join("zlib-1.3.1").is_dir());
}

#[test]
fn build_json_summary() {
  let env = TestEnv::new();

  let output = env
    .build_cmd("recipes")
    .args(["--all", "--output", "json"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(summary["success"], true);
  assert_eq!(summary["built"], 2);
  assert_eq!(summary["projects"][0]["name"], "zlib");
  assert_eq!(summary["projects"][1]["status"], "built");
}

#[test]
fn skipped_project_is_excluded() {
  let env = TestEnv::new();

  env
    .build_cmd("recipes")
    .args(["libpng", "--skip", "zlib"])
    .assert()
    .success()
    .stdout(predicate::str::contains("zlib 1.3.1 excluded"));

  assert!(!env.prefix().join("share/doc/zlib").exists());
  assert!(env.prefix().join("share/doc/libpng/LICENSE").is_file());
}

#[test]
fn failed_dependency_skips_dependent_and_fails() {
  let env = TestEnv::new();

  env
    .build_cmd("failing")
    .arg("app")
    .assert()
    .code(1)
    .stdout(predicate::str::contains("dependency failed: base"))
    .stdout(predicate::str::contains("0 built, 1 failed, 1 skipped"))
    .stderr(predicate::str::contains("base failed"));

  assert!(!env.prefix().join("share/doc/app").exists());
}

#[test]
fn policy_flag_overrides_config_file() {
  let env = TestEnv::new();
  env.write_config("policy = \"halt\"\njobs = 1\n");

  let output = env
    .build_cmd("failing")
    .args(["--all", "--policy", "best-effort", "--output", "json"])
    .output()
    .unwrap();

  assert_eq!(output.status.code(), Some(1));
  let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(summary["failed"], 1);
  assert_eq!(summary["first_error"]["project"], "base");
}

#[test]
fn unknown_target_fails_without_building() {
  let env = TestEnv::new();

  env
    .build_cmd("recipes")
    .arg("gtk")
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown project 'gtk'"));

  assert!(!env.build_root().exists());
}

#[test]
fn cycle_is_reported() {
  let env = TestEnv::new();

  env
    .build_cmd("cycle")
    .arg("a")
    .assert()
    .failure()
    .stderr(predicate::str::contains("dependency cycle: a -> b -> a"));
}

#[test]
fn no_targets_is_an_error() {
  let env = TestEnv::new();

  env.build_cmd("recipes").assert().failure();
}
