use crate::{Command, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single unit under test: either a formula by name, or a commit-ish
/// reference whose changes are being exercised.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Target {
  Formula(String),
  Ref(String),
}

impl Target {
  pub fn name(&self) -> &str {
    match self {
      Target::Formula(name) | Target::Ref(name) => name,
    }
  }

  pub fn is_ref(&self) -> bool {
    matches!(self, Target::Ref(_))
  }

  /// Resolve a ref target to a commit hash. On the first failure, one
  /// corrective fetch runs and the lookup is retried exactly once before
  /// surfacing a terminal target error.
  pub async fn resolve(&self, repository: &Path) -> Result<String> {
    match self {
      Target::Formula(name) => Ok(name.clone()),
      Target::Ref(reference) => {
        if let Ok(commit) = rev_parse(repository, reference).await {
          return Ok(commit);
        }

        let repository_path = repository.display().to_string();
        let _ = Command::new(["git", "-C", repository_path.as_str(), "fetch", "origin"])
          .run(false)
          .await;

        rev_parse(repository, reference).await.map_err(|_| {
          Error::target_error(format!(
            "cannot resolve `{}` in {}",
            reference,
            repository.display()
          ))
        })
      }
    }
  }
}

impl TryFrom<&str> for Target {
  type Error = Error;

  fn try_from(value: &str) -> Result<Self> {
    if value.is_empty() {
      return Err(Error::target_error("target cannot be empty"));
    }

    if value.contains(char::is_whitespace) || value.contains("://") {
      return Err(Error::target_error(format!(
        "`{}` is not a formula name or commit",
        value
      )));
    }

    let looks_like_commit =
      value.len() >= 7 && value.chars().all(|c| c.is_ascii_hexdigit());
    if value == "HEAD" || value.contains("..") || looks_like_commit {
      return Ok(Target::Ref(value.to_string()));
    }

    let valid_name = value
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@' | '+' | '/'));
    if valid_name {
      return Ok(Target::Formula(value.to_string()));
    }

    Err(Error::target_error(format!(
      "`{}` is not a formula name or commit",
      value
    )))
  }
}

async fn rev_parse(repository: &Path, reference: &str) -> Result<String> {
  let repository_path = repository.display().to_string();

  Command::new([
    "git",
    "-C",
    repository_path.as_str(),
    "rev-parse",
    "--verify",
    reference,
  ])
  .exec()
  .await
}
