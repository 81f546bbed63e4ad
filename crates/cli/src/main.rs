use clap::{Parser, ValueEnum};
use log::Level;
use std::path::PathBuf;
use tapbot::{Config, PhaseKind, Tap, TestRunner};

/// Test the full lifecycle of a change to a package repository.
#[derive(Parser)]
#[command(name = "tapbot", version)]
#[command(about = "Runs the step-by-step CI lifecycle for a package repository (tap)")]
struct Cli {
  /// Print what would be done rather than doing it.
  #[arg(long)]
  dry_run: bool,

  /// Clean all state from the repository before and after testing. Use with
  /// care!
  #[arg(long)]
  cleanup: bool,

  /// Don't check if the local system is set up correctly.
  #[arg(long)]
  skip_setup: bool,

  /// Immediately exit on a failing step.
  #[arg(long)]
  fail_fast: bool,

  /// Print test step output in real time.
  #[arg(short, long)]
  verbose: bool,

  /// Generate a JUnit XML test results file.
  #[arg(long)]
  junit: bool,

  /// Use a default testing formula when no other formulae are specified.
  #[arg(long)]
  test_default_formula: bool,

  /// Name of the tap under test, like `user/repo`.
  #[arg(long)]
  tap: Option<String>,

  /// Path to the tap repository checkout. Defaults to the current directory.
  #[arg(long)]
  tap_path: Option<PathBuf>,

  /// Package manager executable driving the steps.
  #[arg(long, default_value = "brew")]
  package_manager: String,

  /// Branch the cleanup phases reset the repository to.
  #[arg(long, default_value = "main")]
  branch: String,

  /// Only run a single phase of the lifecycle.
  #[arg(long, value_enum)]
  only: Option<OnlyPhase>,

  /// Formulae or commits to test.
  targets: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OnlyPhase {
  CleanupBefore,
  Setup,
  TapSyntax,
  Formulae,
  CleanupAfter,
}

impl From<OnlyPhase> for PhaseKind {
  fn from(phase: OnlyPhase) -> Self {
    match phase {
      OnlyPhase::CleanupBefore => PhaseKind::CleanupBefore,
      OnlyPhase::Setup => PhaseKind::Setup,
      OnlyPhase::TapSyntax => PhaseKind::StaticChecks,
      OnlyPhase::Formulae => PhaseKind::FunctionalTests,
      OnlyPhase::CleanupAfter => PhaseKind::CleanupAfter,
    }
  }
}

impl Cli {
  fn into_config(self) -> (Config, Vec<String>) {
    let name = self
      .tap
      .or_else(|| std::env::var("GITHUB_REPOSITORY").ok())
      .unwrap_or_else(|| "local/tap".to_string());
    let path = self
      .tap_path
      .or_else(|| std::env::current_dir().ok())
      .unwrap_or_else(|| PathBuf::from("."));

    let mut config = Config::new(Tap::new(name, path));
    config.package_manager = self.package_manager;
    config.branch = self.branch;
    config.dry_run = self.dry_run;
    config.fail_fast = self.fail_fast;
    config.verbose = self.verbose;
    config.cleanup = self.cleanup;
    config.skip_setup = self.skip_setup;
    config.test_default_formula = self.test_default_formula;
    config.junit = self.junit;
    config.only = self.only.map(PhaseKind::from);

    (config, self.targets)
  }
}

#[tokio::main]
async fn main() {
  let cli = Cli::parse();

  let max_level = if cli.verbose { Level::Debug } else { Level::Info };
  tapbot_logger::init_logger_with_max_level(max_level);

  let (config, targets) = cli.into_config();
  let runner = TestRunner::new(config);

  match runner.run(&targets).await {
    Ok(result) if result.passed => {}
    Ok(_) => std::process::exit(1),
    Err(err) => {
      log::error!("{}", err);
      std::process::exit(1);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::CommandFactory;

  #[test]
  fn test_cli_definition() {
    Cli::command().debug_assert();
  }

  #[test]
  fn test_only_phase_mapping() {
    assert_eq!(PhaseKind::from(OnlyPhase::TapSyntax), PhaseKind::StaticChecks);
    assert_eq!(
      PhaseKind::from(OnlyPhase::CleanupAfter),
      PhaseKind::CleanupAfter
    );
  }

  #[test]
  fn test_flags_map_into_config() {
    let cli = Cli::parse_from([
      "tapbot",
      "--dry-run",
      "--fail-fast",
      "--junit",
      "--tap",
      "user/repo",
      "--only",
      "setup",
      "wget",
    ]);

    let (config, targets) = cli.into_config();
    assert!(config.dry_run);
    assert!(config.fail_fast);
    assert!(config.junit);
    assert_eq!(config.tap.name, "user/repo");
    assert_eq!(config.only, Some(PhaseKind::Setup));
    assert_eq!(targets, ["wget"]);
  }
}
