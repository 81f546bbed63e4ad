use crate::{
  annotation::{group_end, group_start, Annotation, AnnotationKind},
  config::host_os_string,
  sanitize::floor_char_boundary,
  Command, CommandOutput, EnvironmentVariable, EnvironmentVariables, Error, Result, StepStatus,
};
use chrono::{DateTime, Utc};
use colored::Colorize;
use std::path::{Path, PathBuf};

// GitHub Actions caps annotations at 64KB. That is a bit too long, so go for
// a maximum of 24KB or 256 lines.
const MAX_ANNOTATION_BYTES: usize = 24 * 1024;
const MAX_ANNOTATION_LINES: usize = 256;

/// One external command invocation: owns execution, timing, status
/// classification and output capture. Created immediately before it is run
/// and never reused for a second command.
#[derive(Debug)]
pub struct Step {
  command: Vec<String>,
  named_args: Vec<String>,
  env: EnvironmentVariables,
  ignore_failures: bool,
  verbose: bool,
  github_actions: bool,
  repository: Option<PathBuf>,
  package_manager: Option<String>,
  status: StepStatus,
  output: Option<String>,
  start_time: Option<DateTime<Utc>>,
  end_time: Option<DateTime<Utc>>,
}

impl Step {
  pub fn new<I, S>(command: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let command: Vec<String> = command.into_iter().map(Into::into).collect();
    assert!(!command.is_empty(), "step command must not be empty");

    Step {
      command,
      named_args: Vec::new(),
      env: EnvironmentVariables::new(),
      ignore_failures: false,
      verbose: false,
      github_actions: false,
      repository: None,
      package_manager: None,
      status: StepStatus::Running,
      output: None,
      start_time: None,
      end_time: None,
    }
  }

  /// Package or formula names this step operates on. They are appended to
  /// the command line and drive annotation source lookup.
  pub fn named_args<I, S>(mut self, named_args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.named_args = named_args.into_iter().map(Into::into).collect();
    self.command.extend(self.named_args.iter().cloned());
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<EnvironmentVariable>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }

  pub fn envs(mut self, envs: EnvironmentVariables) -> Self {
    self.env.extend(envs);
    self
  }

  pub fn ignore_failures(mut self, ignore_failures: bool) -> Self {
    self.ignore_failures = ignore_failures;
    self
  }

  pub fn verbose(mut self, verbose: bool) -> Self {
    self.verbose = verbose;
    self
  }

  pub fn github_actions(mut self, github_actions: bool) -> Self {
    self.github_actions = github_actions;
    self
  }

  pub fn repository(mut self, repository: impl Into<PathBuf>) -> Self {
    self.repository = Some(repository.into());
    self
  }

  pub fn package_manager(mut self, package_manager: impl Into<String>) -> Self {
    self.package_manager = Some(package_manager.into());
    self
  }

  pub fn command(&self) -> &[String] {
    &self.command
  }

  pub fn status(&self) -> StepStatus {
    self.status
  }

  pub fn output(&self) -> Option<&str> {
    self.output.as_deref()
  }

  pub fn start_time(&self) -> Option<DateTime<Utc>> {
    self.start_time
  }

  pub fn end_time(&self) -> Option<DateTime<Utc>> {
    self.end_time
  }

  /// Execution time in seconds. Zero until the step has run.
  pub fn time(&self) -> f64 {
    match (self.start_time, self.end_time) {
      (Some(start), Some(end)) => (end - start).to_std().map(|d| d.as_secs_f64()).unwrap_or_default(),
      _ => 0.0,
    }
  }

  pub fn passed(&self) -> bool {
    self.status.passed()
  }

  pub fn failed(&self) -> bool {
    self.status.failed()
  }

  pub fn ignored(&self) -> bool {
    self.status.ignored()
  }

  /// Command line for headlines and summaries: `--exclude` arguments and
  /// well-known path prefixes stripped.
  pub fn command_trimmed(&self) -> String {
    let mut prefixes = Vec::new();
    if let Some(repository) = &self.repository {
      prefixes.push(format!("{}/", repository.display()));
    }
    prefixes.push("/usr/bin/".to_string());

    trim_command(&self.command, &prefixes)
  }

  /// Short command form used as the report case name: the package manager
  /// executable, constant flags and repository paths removed.
  pub fn command_short(&self) -> String {
    let repository = self.repository.as_ref().map(|r| r.display().to_string());
    let constant_args = ["-C", "--force", "--retry", "--verbose", "--json"];

    let mut short = self
      .command
      .iter()
      .filter(|arg| self.package_manager.as_deref() != Some(arg.as_str()))
      .filter(|arg| !constant_args.contains(&arg.as_str()))
      .filter(|arg| repository.as_deref() != Some(arg.as_str()))
      .cloned()
      .collect::<Vec<_>>()
      .join(" ");

    if let Some(repository) = &repository {
      short = short.replace(repository.as_str(), "");
    }

    short
  }

  /// Run the command and classify the outcome. The status transitions
  /// exactly once, to `Passed`, `Failed` or `Ignored`.
  ///
  /// Returns `Error::FailFast` when `fail_fast` is set and the step failed;
  /// every other outcome is absorbed into the status.
  pub async fn run(&mut self, dry_run: bool, fail_fast: bool) -> Result<StepStatus> {
    assert_eq!(self.status, StepStatus::Running, "step has already been run");

    self.start_time = Some(Utc::now());
    self.puts_command();

    if dry_run {
      self.status = StepStatus::Passed;
      self.end_time = Some(Utc::now());
      self.puts_result();
      return Ok(self.status);
    }

    if self.command[0] == "git" {
      let subcommand = self.command.get(1).map(String::as_str);
      if subcommand != Some("-C") && subcommand != Some("clone") {
        panic!("git should always be called with -C!");
      }
    }

    let mut command = Command::new(self.command.clone());
    command.envs(&self.env);

    let result = command.run(self.verbose).await;
    self.end_time = Some(Utc::now());

    let output = match result {
      Ok(output) => output,
      Err(err) => {
        log::error!("Failed to run `{}`: {}", self.command.join(" "), err);
        CommandOutput {
          exit_code: Some(1),
          output: err.to_string().into_bytes(),
        }
      }
    };

    self.status = if output.success() {
      StepStatus::Passed
    } else if self.ignore_failures {
      StepStatus::Ignored
    } else {
      StepStatus::Failed
    };

    self.puts_result();

    let merged = output.output_string();
    if !merged.is_empty() {
      self.output = Some(merged);

      if self.verbose {
        // output already went to the console line by line
        println!();
      } else if !self.passed() {
        self.puts_full_output();
        self.puts_annotations();
        println!();
      }
    }

    if fail_fast && self.failed() {
      return Err(Error::fail_fast(self.command_trimmed()));
    }

    Ok(self.status)
  }

  fn puts_command(&self) {
    println!("{}", format!("==> {}", self.command_trimmed()).blue().bold());
  }

  fn puts_result(&self) {
    if !self.passed() {
      println!("{}", "FAILED".red().bold());
    }
  }

  fn puts_full_output(&self) {
    let Some(output) = &self.output else {
      return;
    };

    if self.github_actions {
      group_start(&format!("Full {} output", self.command_short()));
      println!("{}", output);
      group_end();
    } else {
      println!("{}", output);
    }
  }

  fn puts_annotations(&self) {
    if !self.github_actions {
      return;
    }

    // Annotations have been flaky on Linux runners, skip them there.
    if cfg!(target_os = "linux") {
      return;
    }

    let Some(repository) = &self.repository else {
      return;
    };
    let Some(output) = &self.output else {
      return;
    };

    let kind = if self.failed() {
      AnnotationKind::Error
    } else {
      AnnotationKind::Warning
    };
    let message = output_tail(output, MAX_ANNOTATION_BYTES, MAX_ANNOTATION_LINES);
    let title = format!("`{}` failed on {}!", self.command_trimmed(), host_os_string());

    for name in &self.named_args {
      if name.is_empty() {
        continue;
      }

      let Some(path) = locate_source_file(repository, name) else {
        continue;
      };
      let file = path
        .strip_prefix(repository)
        .unwrap_or(&path)
        .display()
        .to_string();

      group_start(&format!("Truncated {} output", self.command_short()));
      println!(
        "{}",
        Annotation::new(kind, message.clone(), title.clone(), file, None)
      );
      group_end();
    }
  }
}

/// Join a command for display, dropping `--exclude` arguments and stripping
/// each of `prefixes` from the front of the result.
pub fn trim_command(command: &[String], prefixes: &[String]) -> String {
  let mut trimmed = command
    .iter()
    .filter(|arg| !arg.starts_with("--exclude"))
    .cloned()
    .collect::<Vec<_>>()
    .join(" ");

  for prefix in prefixes {
    if let Some(rest) = trimmed.strip_prefix(prefix.as_str()) {
      trimmed = rest.to_string();
    }
  }

  trimmed
}

fn output_tail(output: &str, max_bytes: usize, max_lines: usize) -> String {
  let start = floor_char_boundary(output, output.len().saturating_sub(max_bytes));
  let lines: Vec<&str> = output[start..].lines().collect();
  let skip = lines.len().saturating_sub(max_lines);

  lines[skip..].join("\n")
}

/// Best-effort lookup of the source file defining `name` inside the
/// repository under test.
fn locate_source_file(repository: &Path, name: &str) -> Option<PathBuf> {
  let pattern = format!("{}/**/{}*", repository.display(), name);

  glob::glob(&pattern).ok()?.flatten().next()
}
