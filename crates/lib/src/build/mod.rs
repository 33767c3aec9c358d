//! Build strategies.
//!
//! A recipe's [`BuildSystem`] expands into ordinary [`Step`]s that run before
//! the recipe's own steps. Generated commands build out of tree in
//! [`BUILD_SUBDIR`] and install into `$${prefix}`.

use crate::consts::BUILD_SUBDIR;
use crate::recipe::{BuildSystem, ProjectSpec, Step};

/// Steps generated by a build system, in execution order.
pub fn system_steps(build: &BuildSystem) -> Vec<Step> {
  match build {
    BuildSystem::Meson { options, build_type } => vec![
      Step::cmd(with_args(
        format!("meson setup {BUILD_SUBDIR} --prefix \"$${{prefix}}\" --buildtype {build_type}"),
        options,
      )),
      Step::cmd(format!("ninja -C {BUILD_SUBDIR}")),
      Step::cmd(format!("ninja -C {BUILD_SUBDIR} install")),
    ],
    BuildSystem::Cmake { options, build_type } => vec![
      Step::cmd(with_args(
        format!(
          "cmake -S . -B {BUILD_SUBDIR} -G Ninja -DCMAKE_INSTALL_PREFIX=\"$${{prefix}}\" -DCMAKE_BUILD_TYPE={}",
          cmake_build_type(build_type)
        ),
        options,
      )),
      Step::cmd(format!("cmake --build {BUILD_SUBDIR}")),
      Step::cmd(format!("cmake --install {BUILD_SUBDIR}")),
    ],
    BuildSystem::Autotools { configure_args } => vec![
      Step::cmd(with_args("./configure --prefix=\"$${prefix}\"".to_string(), configure_args)),
      Step::cmd("make"),
      Step::cmd("make install"),
    ],
    BuildSystem::None => Vec::new(),
  }
}

/// Every step of a project: build-system steps, then the recipe's own.
pub fn project_steps(spec: &ProjectSpec) -> Vec<Step> {
  let mut steps = system_steps(&spec.build);
  steps.extend(spec.steps.iter().cloned());
  steps
}

fn with_args(mut cmd: String, args: &[String]) -> String {
  for arg in args {
    cmd.push(' ');
    cmd.push_str(arg);
  }
  cmd
}

fn cmake_build_type(build_type: &str) -> String {
  match build_type.to_ascii_lowercase().as_str() {
    "release" => "Release".to_string(),
    "debug" => "Debug".to_string(),
    "relwithdebinfo" => "RelWithDebInfo".to_string(),
    "minsizerel" => "MinSizeRel".to_string(),
    _ => build_type.to_string(),
  }
}
