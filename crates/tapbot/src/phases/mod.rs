mod cleanup;
mod functional;
mod setup;
mod static_checks;

pub use functional::DEFAULT_TEST_FORMULA;

use crate::{Config, Result, Step, StepStatus, Target};
use colored::Colorize;
use serde::{Deserialize, Serialize};

/// The closed set of phases a target runs through, in this order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
  CleanupBefore,
  Setup,
  StaticChecks,
  FunctionalTests,
  CleanupAfter,
}

impl PhaseKind {
  pub fn all() -> [PhaseKind; 5] {
    [
      PhaseKind::CleanupBefore,
      PhaseKind::Setup,
      PhaseKind::StaticChecks,
      PhaseKind::FunctionalTests,
      PhaseKind::CleanupAfter,
    ]
  }
}

impl ToString for PhaseKind {
  fn to_string(&self) -> String {
    match self {
      PhaseKind::CleanupBefore => "cleanup_before".to_string(),
      PhaseKind::Setup => "setup".to_string(),
      PhaseKind::StaticChecks => "static_checks".to_string(),
      PhaseKind::FunctionalTests => "functional_tests".to_string(),
      PhaseKind::CleanupAfter => "cleanup_after".to_string(),
    }
  }
}

/// Everything that happens for one target: the phases run in a fixed order
/// and append the steps they produce here.
pub struct TargetRun {
  pub target: Target,
  pub skip_setup: bool,
  pub skip_cleanup_before: bool,
  pub skip_cleanup_after: bool,
  pub steps: Vec<Step>,
  pub error: Option<String>,
  pub(crate) config: Config,
}

impl TargetRun {
  pub fn new(target: Target, config: Config) -> Self {
    TargetRun {
      target,
      config,
      skip_setup: false,
      skip_cleanup_before: false,
      skip_cleanup_after: false,
      steps: Vec::new(),
      error: None,
    }
  }

  pub fn skip_setup(mut self, skip: bool) -> Self {
    self.skip_setup = skip;
    self
  }

  pub fn skip_cleanup_before(mut self, skip: bool) -> Self {
    self.skip_cleanup_before = skip;
    self
  }

  pub fn skip_cleanup_after(mut self, skip: bool) -> Self {
    self.skip_cleanup_after = skip;
    self
  }

  /// A target passed when every step passed or was ignored and no phase
  /// errored outside a step.
  pub fn passed(&self) -> bool {
    self.error.is_none() && self.steps.iter().all(|step| step.passed() || step.ignored())
  }

  /// Build a step preconfigured for this run.
  pub fn step<I, S>(&self, command: I) -> Step
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Step::new(command)
      .verbose(self.config.verbose)
      .github_actions(self.config.github_actions)
      .repository(self.config.tap.path.clone())
      .package_manager(self.config.package_manager.clone())
  }

  /// Run a step and record it, whatever its outcome. Only fail-fast escapes.
  pub async fn run_step(&mut self, step: Step) -> Result<StepStatus> {
    let mut step = step;
    let result = step.run(self.config.dry_run, self.config.fail_fast).await;
    self.steps.push(step);

    result
  }

  /// Shorthand for running a default-configured step.
  pub async fn test<I, S>(&mut self, command: I) -> Result<StepStatus>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let step = self.step(command);
    self.run_step(step).await
  }

  /// Run all enabled phases. Cleanup-after is attempted on every exit path
  /// except fail-fast unwinding, which terminates the whole run.
  pub async fn run(&mut self) -> Result<bool> {
    let result = self.run_phases().await;

    match result {
      Err(err) if err.is_fail_fast() => return Err(err),
      Err(err) => {
        log::error!("Testing {} failed: {}", self.target.name(), err);
        self.error = Some(err.to_string());
      }
      Ok(()) => {}
    }

    if self.phase_enabled(PhaseKind::CleanupAfter) && !self.skip_cleanup_after {
      if let Err(err) = self.cleanup_after().await {
        if err.is_fail_fast() {
          return Err(err);
        }

        log::error!("Cleanup after {} failed: {}", self.target.name(), err);
        self.error.get_or_insert(err.to_string());
      }
    }

    Ok(self.passed())
  }

  async fn run_phases(&mut self) -> Result<()> {
    if self.phase_enabled(PhaseKind::CleanupBefore) && !self.skip_cleanup_before {
      self.cleanup_before().await?;
    }

    if self.phase_enabled(PhaseKind::Setup) && !self.skip_setup {
      self.setup().await?;
    }

    if self.phase_enabled(PhaseKind::StaticChecks) {
      self.static_checks().await?;
    }

    if self.phase_enabled(PhaseKind::FunctionalTests) {
      self.functional_tests().await?;
    }

    Ok(())
  }

  fn phase_enabled(&self, phase: PhaseKind) -> bool {
    self.config.only.map_or(true, |only| only == phase)
  }

  pub(crate) fn test_header(&self, phase: PhaseKind) {
    println!();
    println!(
      "{}",
      format!("{} ({})", phase.to_string(), self.target.name())
        .cyan()
        .bold()
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{Error, Tap};

  fn test_config(dir: &std::path::Path) -> Config {
    Config {
      tap: Tap::new("local/test", dir),
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
      github_actions: false,
    }
  }

  #[tokio::test]
  async fn test_verdict_requires_all_steps_to_pass() {
    let dir = tempfile::tempdir().unwrap();
    let mut run = TargetRun::new(Target::try_from("demo").unwrap(), test_config(dir.path()));

    run.test(["echo", "ok"]).await.unwrap();
    assert!(run.passed());

    run.test(["false"]).await.unwrap();
    assert!(!run.passed());
  }

  #[tokio::test]
  async fn test_ignored_steps_do_not_fail_the_verdict() {
    let dir = tempfile::tempdir().unwrap();
    let mut run = TargetRun::new(Target::try_from("demo").unwrap(), test_config(dir.path()));

    run.test(["echo", "ok"]).await.unwrap();
    let step = run.step(["false"]).ignore_failures(true);
    run.run_step(step).await.unwrap();

    assert!(run.passed());
  }

  #[tokio::test]
  async fn test_fail_fast_stops_the_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.fail_fast = true;

    let mut run = TargetRun::new(Target::try_from("demo").unwrap(), config);

    let commands = [
      vec!["echo", "1"],
      vec!["false"],
      vec!["echo", "3"],
      vec!["echo", "4"],
      vec!["echo", "5"],
    ];

    let mut error = None;
    for command in commands {
      if let Err(err) = run.test(command).await {
        error = Some(err);
        break;
      }
    }

    assert!(matches!(error, Some(Error::FailFast(_))));
    // steps three through five never ran
    assert_eq!(run.steps.len(), 2);
    assert!(run.steps[0].passed());
    assert!(run.steps[1].failed());
  }

  #[tokio::test]
  async fn test_dry_run_setup_phase() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.dry_run = true;
    config.only = Some(PhaseKind::Setup);

    let mut run = TargetRun::new(Target::try_from("demo").unwrap(), config);
    let passed = run.run().await.unwrap();

    assert!(passed);
    assert_eq!(run.steps.len(), 2);
    assert!(run.steps.iter().all(|step| step.passed()));
    assert_eq!(run.steps[0].command()[1], "config");
    assert_eq!(run.steps[1].command()[1], "doctor");
  }

  #[tokio::test]
  async fn test_only_override_disables_other_phases() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.dry_run = true;
    config.only = Some(PhaseKind::StaticChecks);

    let mut run = TargetRun::new(Target::try_from("demo").unwrap(), config);
    run.run().await.unwrap();

    assert!(run
      .steps
      .iter()
      .all(|step| ["style", "readall", "audit"].contains(&step.command()[1].as_str())));
  }

  #[test]
  fn test_phase_order() {
    assert_eq!(
      PhaseKind::all()
        .iter()
        .map(|phase| phase.to_string())
        .collect::<Vec<_>>(),
      [
        "cleanup_before",
        "setup",
        "static_checks",
        "functional_tests",
        "cleanup_after"
      ]
    );
  }
}
