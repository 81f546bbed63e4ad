use crate::PhaseKind;
use std::path::PathBuf;

/// The package repository under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tap {
  pub name: String,
  pub path: PathBuf,
}

impl Tap {
  pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
    Tap {
      name: name.into(),
      path: path.into(),
    }
  }
}

/// Run configuration, threaded through the orchestrator, phases and steps.
///
/// The ambient environment is read exactly once, here. Nothing else in the
/// engine consults environment variables mid-run.
#[derive(Debug, Clone)]
pub struct Config {
  pub tap: Tap,
  /// Package manager executable driving most steps.
  pub package_manager: String,
  /// Branch the cleanup phases reset the repository to.
  pub branch: String,
  pub dry_run: bool,
  pub fail_fast: bool,
  pub verbose: bool,
  /// Allow the cleanup phases to reset repository state. Destructive.
  pub cleanup: bool,
  pub skip_setup: bool,
  pub test_default_formula: bool,
  pub junit: bool,
  /// Restrict the run to a single phase.
  pub only: Option<PhaseKind>,
  pub github_actions: bool,
}

impl Config {
  pub fn new(tap: Tap) -> Self {
    Config {
      tap,
      package_manager: "brew".to_string(),
      branch: "main".to_string(),
      dry_run: false,
      fail_fast: false,
      verbose: false,
      cleanup: false,
      skip_setup: false,
      test_default_formula: false,
      junit: false,
      only: None,
      github_actions: std::env::var("GITHUB_ACTIONS").is_ok_and(|value| !value.is_empty()),
    }
  }
}

/// Identifier for the execution environment, used to name report suites.
pub fn host_tag() -> String {
  format!("{}_{}", std::env::consts::ARCH, std::env::consts::OS)
}

/// Human-readable host description for annotation titles.
pub fn host_os_string() -> String {
  match std::env::consts::OS {
    "linux" => "Linux".to_string(),
    "macos" => {
      if cfg!(target_arch = "aarch64") {
        "macOS on Apple Silicon".to_string()
      } else {
        "macOS".to_string()
      }
    }
    os => os.to_string(),
  }
}
