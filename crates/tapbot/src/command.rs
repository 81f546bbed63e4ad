use crate::{EnvironmentVariable, EnvironmentVariables, Error, Result};
use std::{path::PathBuf, process::Stdio};
use tokio::{
  io::{AsyncBufReadExt, BufReader},
  process::Command as Cmd,
};

/// The exit status and merged output of a finished subprocess.
///
/// Output is kept as raw bytes: steps may spew binary data, and the report
/// layer decides how to re-encode it.
#[derive(Debug, Clone)]
pub struct CommandOutput {
  pub exit_code: Option<i32>,
  pub output: Vec<u8>,
}

impl CommandOutput {
  pub fn success(&self) -> bool {
    self.exit_code == Some(0)
  }

  /// Merged output as UTF-8, with invalid sequences replaced by U+FFFD.
  pub fn output_string(&self) -> String {
    String::from_utf8_lossy(&self.output).to_string()
  }
}

/// Argv-style subprocess invocation. Arguments are always passed as discrete
/// elements, never through a shell.
pub struct Command {
  program: String,
  args: Vec<String>,
  envs: EnvironmentVariables,
  current_dir: Option<PathBuf>,
}

impl Command {
  pub fn new<I, S>(command: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut command = command.into_iter().map(Into::into);
    let program = command.next().expect("command must not be empty");

    Command {
      program,
      args: command.collect(),
      envs: EnvironmentVariables::new(),
      current_dir: None,
    }
  }

  pub fn env(&mut self, key: impl Into<String>, value: impl Into<EnvironmentVariable>) -> &mut Self {
    self.envs.insert(key.into(), value.into());

    self
  }

  pub fn envs(&mut self, envs: &EnvironmentVariables) -> &mut Self {
    for (key, value) in envs {
      self.envs.insert(key.clone(), value.clone());
    }

    self
  }

  pub fn dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
    self.current_dir = Some(dir.into());

    self
  }

  fn build(&self) -> Cmd {
    let mut cmd = Cmd::new(&self.program);
    cmd.args(&self.args);

    for (key, value) in &self.envs {
      match value {
        EnvironmentVariable::None => {
          cmd.env_remove(key);
        }
        value => {
          cmd.env(key, value.to_string());
        }
      }
    }

    if let Some(dir) = &self.current_dir {
      cmd.current_dir(dir);
    }

    cmd
  }

  /// Run quietly and return the trimmed merged output on success.
  pub async fn exec(&mut self) -> Result<String> {
    let output = self.run(false).await?;

    if output.success() {
      Ok(output.output_string().trim().to_string())
    } else {
      Err(Error::internal_runtime_error(output.output_string()))
    }
  }

  /// Run quietly and only report whether the command exited zero.
  pub async fn succeeds(&mut self) -> bool {
    match self.run(false).await {
      Ok(output) => output.success(),
      Err(_) => false,
    }
  }

  /// Spawn the command and collect stdout and stderr, interleaved in arrival
  /// order. When `stream_output` is set, lines are also printed as they come
  /// in.
  pub async fn run(&mut self, stream_output: bool) -> Result<CommandOutput> {
    let mut child = self
      .build()
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .spawn()
      .map_err(|err| {
        Error::internal_runtime_error(format!("Failed to spawn child process: {}", err))
      })?;

    let out = child.stdout.take().ok_or(Error::internal_runtime_error(
      "Failed to get stdout from child process",
    ))?;
    let err = child.stderr.take().ok_or(Error::internal_runtime_error(
      "Failed to get stderr from child process",
    ))?;

    let mut out = BufReader::new(out);
    let mut err = BufReader::new(err);

    let mut merged: Vec<u8> = Vec::new();
    let mut out_buf: Vec<u8> = Vec::new();
    let mut err_buf: Vec<u8> = Vec::new();
    let mut out_done = false;
    let mut err_done = false;

    // read_until leaves partially read bytes in the buffer when the other
    // branch wins the select, so no output is lost across iterations.
    while !out_done || !err_done {
      tokio::select! {
        read = out.read_until(b'\n', &mut out_buf), if !out_done => {
          match read {
            Ok(0) => {
              out_done = true;
              take_line(&mut merged, &mut out_buf, stream_output);
            }
            Ok(_) => take_line(&mut merged, &mut out_buf, stream_output),
            Err(error) => {
              log::error!("Failed to read stdout from child process: {}", error);
              out_done = true;
            }
          }
        }
        read = err.read_until(b'\n', &mut err_buf), if !err_done => {
          match read {
            Ok(0) => {
              err_done = true;
              take_line(&mut merged, &mut err_buf, stream_output);
            }
            Ok(_) => take_line(&mut merged, &mut err_buf, stream_output),
            Err(error) => {
              log::error!("Failed to read stderr from child process: {}", error);
              err_done = true;
            }
          }
        }
      }
    }

    let status = child.wait().await.map_err(|err| {
      Error::internal_runtime_error(format!("Failed to wait for child process: {}", err))
    })?;

    Ok(CommandOutput {
      exit_code: status.code(),
      output: merged,
    })
  }
}

fn take_line(merged: &mut Vec<u8>, line: &mut Vec<u8>, stream_output: bool) {
  if line.is_empty() {
    return;
  }

  if stream_output {
    print!("{}", String::from_utf8_lossy(line));
  }

  merged.append(line);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_run_captures_merged_output() {
    let output = Command::new(["sh", "-c", "echo out; echo err 1>&2"])
      .run(false)
      .await
      .unwrap();

    assert!(output.success());

    let text = output.output_string();
    assert!(text.contains("out"));
    assert!(text.contains("err"));
  }

  #[tokio::test]
  async fn test_run_reports_exit_code() {
    let output = Command::new(["sh", "-c", "exit 3"]).run(false).await.unwrap();

    assert_eq!(output.exit_code, Some(3));
    assert!(!output.success());
  }

  #[tokio::test]
  async fn test_run_normalizes_invalid_utf8() {
    let output = Command::new(["sh", "-c", r"printf 'a\377b\n'"])
      .run(false)
      .await
      .unwrap();

    let text = output.output_string();
    assert!(text.starts_with('a'));
    assert!(text.contains('\u{FFFD}'));
  }

  #[tokio::test]
  async fn test_run_fails_on_missing_program() {
    let result = Command::new(["tapbot-no-such-program"]).run(false).await;

    assert!(result.is_err());
  }

  #[tokio::test]
  async fn test_exec_returns_trimmed_output() {
    let output = Command::new(["echo", "hello"]).exec().await.unwrap();

    assert_eq!(output, "hello");
  }

  #[tokio::test]
  async fn test_exec_fails_on_non_zero_exit() {
    assert!(Command::new(["false"]).exec().await.is_err());
  }

  #[tokio::test]
  async fn test_succeeds() {
    assert!(Command::new(["true"]).succeeds().await);
    assert!(!Command::new(["false"]).succeeds().await);
    assert!(!Command::new(["tapbot-no-such-program"]).succeeds().await);
  }

  #[tokio::test]
  async fn test_env_overrides() {
    let mut command = Command::new(["sh", "-c", "echo $TAPBOT_TEST_ENV"]);
    command.env("TAPBOT_TEST_ENV", "42");

    assert_eq!(command.exec().await.unwrap(), "42");
  }

  #[tokio::test]
  async fn test_env_unset_removes_variable() {
    std::env::set_var("TAPBOT_TEST_UNSET", "present");

    let mut command = Command::new(["sh", "-c", "echo ${TAPBOT_TEST_UNSET:-gone}"]);
    command.env("TAPBOT_TEST_UNSET", EnvironmentVariable::None);

    assert_eq!(command.exec().await.unwrap(), "gone");
  }

  #[tokio::test]
  async fn test_dir() {
    let dir = tempfile::tempdir().unwrap();
    let expected = dir.path().canonicalize().unwrap();

    let mut command = Command::new(["pwd"]);
    command.dir(dir.path());

    assert_eq!(command.exec().await.unwrap(), expected.display().to_string());
  }
}
