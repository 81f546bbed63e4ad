use crate::{config::host_tag, sanitize::sanitize_output_for_xml, Error, Result, Step, TargetRun};
use quick_junit::{NonSuccessKind, Report, TestCase, TestCaseStatus, TestSuite};
use std::path::Path;
use std::time::Duration;

pub const JUNIT_REPORT_FILE: &str = "tapbot.xml";
pub const SUMMARY_FILE: &str = "steps_output.txt";

/// Plain-text run summary: either the all-clear line or the failure count
/// followed by one trimmed command per failed step.
pub fn steps_summary(runs: &[TargetRun]) -> String {
  let failed_steps: Vec<&Step> = runs
    .iter()
    .flat_map(|run| run.steps.iter())
    .filter(|step| step.failed())
    .collect();

  if failed_steps.is_empty() {
    return "All steps passed!".to_string();
  }

  let mut lines = vec![format!("Error: {} failed steps!", failed_steps.len())];
  lines.extend(failed_steps.iter().map(|step| step.command_trimmed()));
  lines.join("\n")
}

/// Persist the summary, unconditionally replacing any previous file.
pub fn write_summary(summary: &str, path: &Path) -> Result<()> {
  std::fs::write(path, summary).map_err(Error::report_error)?;

  Ok(())
}

/// Assemble the JUnit document: one suite per target, one case per step.
pub fn junit_report(runs: &[TargetRun]) -> Report {
  let mut report = Report::new("tapbot");
  let suite_name = format!("tapbot.{}", host_tag());

  for run in runs {
    // a run that produced no steps has nothing to report on
    let Some(first_step) = run.steps.first() else {
      continue;
    };

    let mut suite = TestSuite::new(suite_name.clone());
    if let Some(start_time) = first_step.start_time() {
      suite.set_timestamp(start_time);
    }

    for step in &run.steps {
      let status = if step.passed() {
        TestCaseStatus::success()
      } else {
        let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
        status.set_message(format!(
          "{}: {}",
          step.status().to_string(),
          step.command().join(" ")
        ));
        if let Some(output) = step.output() {
          status.set_description(sanitize_output_for_xml(output));
        }
        status
      };

      let mut case = TestCase::new(step.command_short(), status);
      case.set_time(Duration::from_secs_f64(step.time()));
      if let Some(start_time) = step.start_time() {
        case.set_timestamp(start_time);
      }
      case
        .extra
        .insert("status".into(), step.status().to_string().into());

      if step.passed() {
        if let Some(output) = step.output() {
          case.set_system_out(sanitize_output_for_xml(output));
        }
      }

      suite.add_test_case(case);
    }

    suite.tests = run.steps.iter().filter(|step| step.passed()).count();
    suite.failures = run.steps.iter().filter(|step| step.failed()).count();

    report.add_test_suite(suite);
  }

  report
}

/// Render and write the JUnit report, replacing any previous file. Report
/// I/O failures are fatal: CI consumers depend on this file existing.
pub fn write_junit_report(runs: &[TargetRun], path: &Path) -> Result<()> {
  let report = junit_report(runs);
  let xml = report.to_string().map_err(Error::report_error)?;
  std::fs::write(path, xml).map_err(Error::report_error)?;

  Ok(())
}
