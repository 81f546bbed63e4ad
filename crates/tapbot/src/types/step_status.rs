use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
  Running,
  Passed,
  Failed,
  Ignored,
}

impl StepStatus {
  pub fn is_terminal(&self) -> bool {
    matches!(
      self,
      StepStatus::Passed | StepStatus::Failed | StepStatus::Ignored
    )
  }

  pub fn passed(&self) -> bool {
    matches!(self, StepStatus::Passed)
  }

  pub fn failed(&self) -> bool {
    matches!(self, StepStatus::Failed)
  }

  pub fn ignored(&self) -> bool {
    matches!(self, StepStatus::Ignored)
  }
}

impl ToString for StepStatus {
  fn to_string(&self) -> String {
    match self {
      StepStatus::Running => "running".to_string(),
      StepStatus::Passed => "passed".to_string(),
      StepStatus::Failed => "failed".to_string(),
      StepStatus::Ignored => "ignored".to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_is_terminal() {
    assert!(!StepStatus::Running.is_terminal());
    assert!(StepStatus::Passed.is_terminal());
    assert!(StepStatus::Failed.is_terminal());
    assert!(StepStatus::Ignored.is_terminal());
  }

  #[test]
  fn test_predicates_are_mutually_exclusive() {
    for status in [
      StepStatus::Running,
      StepStatus::Passed,
      StepStatus::Failed,
      StepStatus::Ignored,
    ] {
      let set = [status.passed(), status.failed(), status.ignored()];
      let count = set.iter().filter(|s| **s).count();

      if status.is_terminal() {
        assert_eq!(count, 1);
      } else {
        assert_eq!(count, 0);
      }
    }
  }

  #[test]
  fn test_to_string() {
    assert_eq!(StepStatus::Running.to_string(), "running");
    assert_eq!(StepStatus::Passed.to_string(), "passed");
    assert_eq!(StepStatus::Failed.to_string(), "failed");
    assert_eq!(StepStatus::Ignored.to_string(), "ignored");
  }
}
