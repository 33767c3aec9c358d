//! Per-project placeholder variables.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::ForgeConfig;
use crate::platform::host_triple;
use crate::recipe::ProjectSpec;

/// Values available to `$${name}` placeholders while building one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectVars {
  vars: BTreeMap<String, String>,
  build_dir: PathBuf,
}

impl ProjectVars {
  pub fn new(config: &ForgeConfig, spec: &ProjectSpec) -> Self {
    let build_dir = config.build_root.join(spec.dir_name());

    let mut vars = BTreeMap::new();
    vars.insert("name".to_string(), spec.name.clone());
    vars.insert("version".to_string(), spec.version.clone());
    vars.insert("prefix".to_string(), display(&config.prefix));
    vars.insert("build_root".to_string(), display(&config.build_root));
    vars.insert("build_dir".to_string(), display(&build_dir));
    vars.insert("host".to_string(), host_triple());
    if let Some(python_dir) = &config.python_dir {
      vars.insert("python_dir".to_string(), display(python_dir));
    }
    if let Some(root) = &config.toolchain_root {
      vars.insert("toolchain_root".to_string(), display(root));
    }

    Self { vars, build_dir }
  }

  /// The project's build directory, `build_root/<name>-<version>`.
  pub fn build_dir(&self) -> &Path {
    &self.build_dir
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.vars.get(name).map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }
}

fn display(path: &Path) -> String {
  path.display().to_string()
}
