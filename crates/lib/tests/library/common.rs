use std::path::Path;

use forge_lib::config::ForgeConfig;
use forge_lib::recipe::{ProjectSpec, Source, Step};
use forge_lib::registry::Registry;

/// Configuration rooted entirely inside `dir`.
pub fn config_in(dir: &Path) -> ForgeConfig {
  ForgeConfig {
    prefix: dir.join("prefix"),
    build_root: dir.join("build"),
    cache_dir: dir.join("cache"),
    jobs: 2,
    ..ForgeConfig::default()
  }
}

/// A recipe with an empty local source directory and one shell step.
pub fn local_project(dir: &Path, name: &str, deps: &[&str], cmd: &str) -> ProjectSpec {
  let src = dir.join("src").join(name);
  std::fs::create_dir_all(&src).unwrap();
  ProjectSpec::new(name, "1.0", Source::Local { path: src })
    .with_dependencies(deps.iter().copied())
    .with_step(Step::cmd(cmd))
}

pub fn registry(specs: impl IntoIterator<Item = ProjectSpec>) -> Registry {
  let mut registry = Registry::new();
  for spec in specs {
    registry.register(spec).unwrap();
  }
  registry
}
