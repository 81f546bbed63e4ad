#[derive(thiserror::Error, Debug)]
pub enum Error {
  #[error("Invalid test target: {0}")]
  Target(String),

  #[error("Error while running step: {0}")]
  InternalRuntimeError(String),

  #[error("Fail-fast: `{0}` failed")]
  FailFast(String),

  #[error("Failed to write report: {0}")]
  Report(String),

  #[error("IO error: {0}")]
  IOError(#[from] std::io::Error),
}

impl Error {
  pub fn target_error<T: ToString>(message: T) -> Self {
    Self::Target(message.to_string())
  }

  pub fn internal_runtime_error<T: ToString>(message: T) -> Self {
    Self::InternalRuntimeError(message.to_string())
  }

  pub fn fail_fast<T: ToString>(command: T) -> Self {
    Self::FailFast(command.to_string())
  }

  pub fn report_error<T: ToString>(message: T) -> Self {
    Self::Report(message.to_string())
  }

  pub fn io_error(source: std::io::Error) -> Self {
    Self::IOError(source)
  }

  pub fn is_fail_fast(&self) -> bool {
    matches!(self, Self::FailFast(_))
  }
}

// implement Eq and PartialEq for Error so that we can compare errors in tests
impl PartialEq for Error {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Self::Target(a), Self::Target(b)) => a == b,
      (Self::InternalRuntimeError(a), Self::InternalRuntimeError(b)) => a == b,
      (Self::FailFast(a), Self::FailFast(b)) => a == b,
      (Self::Report(a), Self::Report(b)) => a == b,
      (Self::IOError(a), Self::IOError(b)) => a.kind() == b.kind(),
      _ => false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_eq() {
    assert_eq!(Error::target_error("hello"), Error::target_error("hello"));
    assert_eq!(
      Error::internal_runtime_error("hello"),
      Error::internal_runtime_error("hello")
    );
    assert_eq!(Error::fail_fast("brew doctor"), Error::fail_fast("brew doctor"));
    assert_eq!(Error::report_error("hello"), Error::report_error("hello"));
    assert_eq!(
      Error::io_error(std::io::Error::new(std::io::ErrorKind::Other, "hello")),
      Error::io_error(std::io::Error::new(std::io::ErrorKind::Other, "hello"))
    );
  }

  #[test]
  fn test_ne() {
    assert_ne!(Error::target_error("hello"), Error::target_error("world"));
    assert_ne!(Error::fail_fast("hello"), Error::target_error("hello"));
    assert_ne!(
      Error::io_error(std::io::Error::new(std::io::ErrorKind::Other, "hello")),
      Error::io_error(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "world"
      ))
    );
  }

  #[test]
  fn test_is_fail_fast() {
    assert!(Error::fail_fast("brew doctor").is_fail_fast());
    assert!(!Error::target_error("hello").is_fail_fast());
  }
}
