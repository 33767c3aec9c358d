//! Plan, list and info command integration tests.

use predicates::prelude::*;

use super::common::{TestEnv, fixture_path};

#[test]
fn plan_prints_order_and_waves() {
  let env = TestEnv::new();

  env
    .forge_cmd()
    .arg("plan")
    .arg("libpng")
    .arg("--recipes")
    .arg(fixture_path("recipes"))
    .assert()
    .success()
    .stdout(predicate::str::contains("Plan: 2 project(s)"))
    .stdout(predicate::str::is_match(r"1\.\s+zlib 1\.3\.1").unwrap())
    .stdout(predicate::str::contains("*libpng"));
}

#[test]
fn plan_json() {
  let env = TestEnv::new();

  let output = env
    .forge_cmd()
    .args(["plan", "--all", "-o", "json", "--recipes"])
    .arg(fixture_path("recipes"))
    .output()
    .unwrap();

  assert!(output.status.success());
  let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(plan["order"], serde_json::json!(["zlib", "libpng"]));
  assert_eq!(plan["waves"], serde_json::json!([["zlib"], ["libpng"]]));
}

#[test]
fn list_shows_dependencies() {
  let env = TestEnv::new();

  env
    .forge_cmd()
    .arg("list")
    .arg("--recipes")
    .arg(fixture_path("recipes"))
    .assert()
    .success()
    .stdout(predicate::str::contains("libpng 1.6.43"))
    .stdout(predicate::str::contains("zlib"));
}

#[test]
fn list_missing_directory_fails() {
  let env = TestEnv::new();

  env
    .forge_cmd()
    .args(["list", "--recipes", "/nonexistent/recipes"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load recipes"));
}

#[test]
fn info_reads_config_file() {
  let env = TestEnv::new();
  env.write_config("policy = \"best-effort\"\njobs = 3\n");

  env
    .forge_cmd()
    .arg("info")
    .assert()
    .success()
    .stdout(predicate::str::contains("best-effort"))
    .stdout(predicate::str::contains("Jobs: 3"));
}

#[test]
fn info_rejects_invalid_config() {
  let env = TestEnv::new();
  env.write_config("jobs = 0\n");

  env.forge_cmd().arg("info").assert().failure();
}
