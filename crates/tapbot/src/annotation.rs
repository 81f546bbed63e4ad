use std::fmt;

/// GitHub Actions annotation severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
  Error,
  Warning,
}

impl AnnotationKind {
  fn as_str(&self) -> &'static str {
    match self {
      AnnotationKind::Error => "error",
      AnnotationKind::Warning => "warning",
    }
  }
}

/// An inline annotation surfaced by GitHub Actions, attributed to a source
/// file in the repository under test.
#[derive(Debug, Clone)]
pub struct Annotation {
  kind: AnnotationKind,
  message: String,
  title: String,
  file: String,
  line: Option<u32>,
}

impl Annotation {
  pub fn new(
    kind: AnnotationKind,
    message: impl Into<String>,
    title: impl Into<String>,
    file: impl Into<String>,
    line: Option<u32>,
  ) -> Self {
    Annotation {
      kind,
      message: message.into(),
      title: title.into(),
      file: file.into(),
      line,
    }
  }
}

impl fmt::Display for Annotation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "::{} file={}", self.kind.as_str(), escape_property(&self.file))?;

    if let Some(line) = self.line {
      write!(f, ",line={}", line)?;
    }

    write!(
      f,
      ",title={}::{}",
      escape_property(&self.title),
      escape_data(&self.message)
    )
  }
}

/// Open a foldable output group in the GitHub Actions log.
pub fn group_start(title: &str) {
  println!("::group::{}", title);
}

pub fn group_end() {
  println!("::endgroup::");
}

fn escape_data(value: &str) -> String {
  value
    .replace('%', "%25")
    .replace('\r', "%0D")
    .replace('\n', "%0A")
}

fn escape_property(value: &str) -> String {
  value
    .replace('%', "%25")
    .replace('\r', "%0D")
    .replace('\n', "%0A")
    .replace(':', "%3A")
    .replace(',', "%2C")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_annotation() {
    let annotation = Annotation::new(
      AnnotationKind::Error,
      "it broke",
      "`brew install wget` failed on Linux!",
      "Formula/wget.rb",
      Some(3),
    );

    assert_eq!(
      annotation.to_string(),
      "::error file=Formula/wget.rb,line=3,title=`brew install wget` failed on Linux!::it broke"
    );
  }

  #[test]
  fn test_warning_annotation_without_line() {
    let annotation = Annotation::new(
      AnnotationKind::Warning,
      "careful",
      "title",
      "Formula/wget.rb",
      None,
    );

    assert_eq!(
      annotation.to_string(),
      "::warning file=Formula/wget.rb,title=title::careful"
    );
  }

  #[test]
  fn test_message_escaping() {
    let annotation = Annotation::new(AnnotationKind::Error, "a\nb%c\rd", "t", "f", None);

    assert_eq!(annotation.to_string(), "::error file=f,title=t::a%0Ab%25c%0Dd");
  }

  #[test]
  fn test_property_escaping() {
    let annotation = Annotation::new(AnnotationKind::Error, "m", "a:b,c", "f,g", None);

    assert_eq!(
      annotation.to_string(),
      "::error file=f%2Cg,title=a%3Ab%2Cc::m"
    );
  }
}
