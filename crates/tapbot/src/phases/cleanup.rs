use super::{PhaseKind, TargetRun};
use crate::{Command, Result};
use std::path::Path;
use std::time::Duration;

const CLEAN_ARGS: [&str; 2] = ["-dx", "--exclude=*.bottle*.tar.gz"];

impl TargetRun {
  /// Put the repository into a known-good state before testing starts.
  pub(crate) async fn cleanup_before(&mut self) -> Result<()> {
    self.test_header(PhaseKind::CleanupBefore);

    if !self.config.cleanup {
      return Ok(());
    }

    // stale bottles from a previous run would shadow freshly built ones
    if let Ok(bottles) = glob::glob("*.bottle*.tar.gz") {
      for bottle in bottles.flatten() {
        let _ = std::fs::remove_file(bottle);
      }
    }

    let repository = self.config.tap.path.clone();
    self.cleanup_shared(&repository).await
  }

  /// Final teardown. Runs even when earlier phases failed.
  pub(crate) async fn cleanup_after(&mut self) -> Result<()> {
    self.test_header(PhaseKind::CleanupAfter);

    if !self.config.cleanup {
      return Ok(());
    }

    let repository = self.config.tap.path.clone();
    self.pkill_if_needed(&repository).await?;
    self.cleanup_shared(&repository).await
  }

  async fn cleanup_shared(&mut self, repository: &Path) -> Result<()> {
    self.clear_stash_if_needed(repository).await?;
    self.checkout_branch_if_needed(repository).await?;
    self.reset_if_needed(repository).await?;
    self.clean_if_needed(repository).await?;
    self.prune_if_needed(repository).await?;

    Ok(())
  }

  async fn clear_stash_if_needed(&mut self, repository: &Path) -> Result<()> {
    let stash = Command::new(git_command(repository, &["stash", "list"]))
      .exec()
      .await?;
    if stash.is_empty() {
      return Ok(());
    }

    self.test(git_command(repository, &["stash", "clear"])).await?;

    Ok(())
  }

  async fn checkout_branch_if_needed(&mut self, repository: &Path) -> Result<()> {
    let branch = self.config.branch.clone();
    let head = Command::new(git_command(repository, &["symbolic-ref", "HEAD"]))
      .exec()
      .await?;
    if head == format!("refs/heads/{}", branch) {
      return Ok(());
    }

    self
      .test(git_command(repository, &["checkout", "-f", branch.as_str()]))
      .await?;

    Ok(())
  }

  async fn reset_if_needed(&mut self, repository: &Path) -> Result<()> {
    let upstream = format!("origin/{}", self.config.branch);
    if Command::new(git_command(repository, &["diff", "--quiet", upstream.as_str()]))
      .succeeds()
      .await
    {
      return Ok(());
    }

    self
      .test(git_command(repository, &["reset", "--hard", upstream.as_str()]))
      .await?;

    Ok(())
  }

  async fn clean_if_needed(&mut self, repository: &Path) -> Result<()> {
    let mut probe = vec!["clean", "--dry-run"];
    probe.extend(CLEAN_ARGS);

    let pending = Command::new(git_command(repository, &probe)).exec().await?;
    if pending.is_empty() {
      return Ok(());
    }

    let mut clean = vec!["clean", "-ff"];
    clean.extend(CLEAN_ARGS);
    self.test(git_command(repository, &clean)).await?;

    Ok(())
  }

  async fn prune_if_needed(&mut self, repository: &Path) -> Result<()> {
    let gc = Command::new(git_command(
      repository,
      &["-c", "gc.autoDetach=false", "gc", "--auto"],
    ))
    .run(false)
    .await?;
    if !gc.output_string().contains("git prune") {
      return Ok(());
    }

    self.test(git_command(repository, &["prune"])).await?;

    Ok(())
  }

  /// Anything still holding files under the repository would make the reset
  /// flaky, so it gets one polite kill and one forceful one.
  async fn pkill_if_needed(&mut self, repository: &Path) -> Result<()> {
    let pattern = repository.display().to_string();

    let mut pgrep = Command::new(["pgrep", "-f", pattern.as_str()]);
    if !pgrep.succeeds().await {
      return Ok(());
    }

    self.test(["pkill", "-f", pattern.as_str()]).await?;

    if pgrep.succeeds().await {
      tokio::time::sleep(Duration::from_secs(1)).await;

      if pgrep.succeeds().await {
        self.test(["pkill", "-9", "-f", pattern.as_str()]).await?;
      }
    }

    Ok(())
  }
}

fn git_command(repository: &Path, args: &[&str]) -> Vec<String> {
  let mut command = vec![
    "git".to_string(),
    "-C".to_string(),
    repository.display().to_string(),
  ];
  command.extend(args.iter().map(|arg| arg.to_string()));

  command
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_git_command_is_repository_scoped() {
    let command = git_command(Path::new("/tap"), &["stash", "clear"]);

    assert_eq!(command, ["git", "-C", "/tap", "stash", "clear"]);
  }
}
