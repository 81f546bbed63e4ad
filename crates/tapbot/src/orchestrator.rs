use crate::{report, Config, Result, Target, TargetRun};
use std::path::Path;

/// Outcome of a whole invocation: the per-target runs plus the aggregate
/// verdict.
pub struct TestRunResult {
  pub passed: bool,
  pub runs: Vec<TargetRun>,
}

/// Drives every target through the phase runner, chains the skip flags
/// between them and renders the reports at the end.
pub struct TestRunner {
  config: Config,
}

impl TestRunner {
  pub fn new(config: Config) -> Self {
    TestRunner { config }
  }

  pub async fn run(&self, arguments: &[String]) -> Result<TestRunResult> {
    let mut arguments = arguments.to_vec();
    if arguments.is_empty() {
      // with no arguments just test the most recent commit
      arguments.push("HEAD".to_string());
    }

    let mut runs: Vec<TargetRun> = Vec::new();
    let mut any_errors = false;
    let mut skip_setup = self.config.skip_setup;
    let mut skip_cleanup_before = false;

    let last = arguments.len() - 1;
    for (index, argument) in arguments.iter().enumerate() {
      let skip_cleanup_after = index != last;

      let target = match self.build_target(argument).await {
        Ok(target) => target,
        Err(err) => {
          // a target that cannot even be constructed fails the run but not
          // the batch
          log::error!("{}", err);
          any_errors = true;
          continue;
        }
      };

      let mut run = TargetRun::new(target, self.config.clone())
        .skip_setup(skip_setup)
        .skip_cleanup_before(skip_cleanup_before)
        .skip_cleanup_after(skip_cleanup_after);
      skip_setup = true;
      skip_cleanup_before = true;

      let passed = run.run().await?;
      any_errors |= !passed;
      runs.push(run);
    }

    let summary = report::steps_summary(&runs);
    println!("{}", summary);
    report::write_summary(&summary, Path::new(report::SUMMARY_FILE))?;

    if self.config.junit {
      report::write_junit_report(&runs, Path::new(report::JUNIT_REPORT_FILE))?;
    }

    Ok(TestRunResult {
      passed: !any_errors,
      runs,
    })
  }

  async fn build_target(&self, argument: &str) -> Result<Target> {
    let target = Target::try_from(argument)?;

    if target.is_ref() && !self.config.dry_run {
      target.resolve(&self.config.tap.path).await?;
    }

    Ok(target)
  }
}
