use super::{PhaseKind, TargetRun};
use crate::{EnvironmentVariable, Result, Target};

/// Formula exercised for ref targets when nothing else is specified.
pub const DEFAULT_TEST_FORMULA: &str = "testbottest";

impl TargetRun {
  /// The full fetch, install, test, uninstall lifecycle for each formula
  /// this target covers.
  pub(crate) async fn functional_tests(&mut self) -> Result<()> {
    self.test_header(PhaseKind::FunctionalTests);

    let formulae = match &self.target {
      Target::Formula(name) => vec![name.clone()],
      Target::Ref(_) => {
        if self.config.test_default_formula {
          vec![DEFAULT_TEST_FORMULA.to_string()]
        } else {
          log::info!("No formulae to test for {}", self.target.name());
          Vec::new()
        }
      }
    };

    for formula in formulae {
      self.test_formula(&formula).await?;
    }

    Ok(())
  }

  async fn test_formula(&mut self, formula: &str) -> Result<()> {
    let pm = self.config.package_manager.clone();

    let fetch = self
      .step([pm.as_str(), "fetch", "--retry"])
      .named_args([formula]);
    self.run_step(fetch).await?;

    // installs must not see developer mode
    let install = self
      .step([pm.as_str(), "install", "--verbose"])
      .named_args([formula])
      .env("HOMEBREW_DEVELOPER", EnvironmentVariable::None);
    self.run_step(install).await?;

    let installed = self.steps.last().map_or(false, |step| step.passed());
    if installed {
      let test = self
        .step([pm.as_str(), "test", "--retry", "--verbose"])
        .named_args([formula]);
      self.run_step(test).await?;
    }

    let uninstall = self
      .step([pm.as_str(), "uninstall", "--force"])
      .named_args([formula])
      .ignore_failures(true);
    self.run_step(uninstall).await?;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{Config, PhaseKind, Tap};

  fn dry_config(dir: &std::path::Path) -> Config {
    let mut config = Config::new(Tap::new("local/test", dir));
    config.dry_run = true;
    config.github_actions = false;
    config.only = Some(PhaseKind::FunctionalTests);
    config
  }

  #[tokio::test]
  async fn test_formula_target_produces_lifecycle_steps() {
    let dir = tempfile::tempdir().unwrap();
    let mut run = TargetRun::new(Target::try_from("wget").unwrap(), dry_config(dir.path()));

    let passed = run.run().await.unwrap();
    assert!(passed);

    let subcommands: Vec<&str> = run
      .steps
      .iter()
      .map(|step| step.command()[1].as_str())
      .collect();
    assert_eq!(subcommands, ["fetch", "install", "test", "uninstall"]);
    assert!(run.steps.iter().all(|step| step.command().contains(&"wget".to_string())));
  }

  #[tokio::test]
  async fn test_ref_target_without_default_formula_has_no_steps() {
    let dir = tempfile::tempdir().unwrap();
    let mut run = TargetRun::new(Target::try_from("HEAD").unwrap(), dry_config(dir.path()));

    let passed = run.run().await.unwrap();
    assert!(passed);
    assert!(run.steps.is_empty());
  }

  #[tokio::test]
  async fn test_ref_target_with_default_formula() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = dry_config(dir.path());
    config.test_default_formula = true;

    let mut run = TargetRun::new(Target::try_from("HEAD").unwrap(), config);
    run.run().await.unwrap();

    assert!(run
      .steps
      .iter()
      .all(|step| step.command().contains(&DEFAULT_TEST_FORMULA.to_string())));
    assert!(!run.steps.is_empty());
  }
}
