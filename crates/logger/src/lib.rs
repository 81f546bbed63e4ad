use colored::Colorize;
use log::Level;
use std::sync::OnceLock;

pub struct Logger {
  max_level: Level,
}

impl log::Log for Logger {
  fn enabled(&self, metadata: &log::Metadata) -> bool {
    metadata.level() <= self.max_level
  }

  fn log(&self, record: &log::Record) {
    if !self.enabled(record.metadata()) {
      return;
    }

    let time = chrono::Local::now()
      .format("%Y-%m-%d %H:%M:%S")
      .to_string()
      .magenta();

    let level = match record.level() {
      Level::Error => "ERROR".red(),
      Level::Warn => "WARN".yellow(),
      Level::Info => "INFO".green(),
      Level::Debug => "DEBUG".green(),
      Level::Trace => "TRACE".green(),
    };

    // source locations only matter when debugging the harness itself
    let prefix = if self.max_level >= Level::Debug {
      match (record.file(), record.line()) {
        (Some(file), Some(line)) => format!("{}:{} ", file, line).cyan(),
        _ => String::new().normal(),
      }
    } else {
      String::new().normal()
    };

    println!("{}{} {} {}", prefix, time, level, record.args());
  }

  fn flush(&self) {}
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

pub fn init_logger() {
  init_logger_with_max_level(Level::Info);
}

pub fn init_logger_with_max_level(max_level: Level) {
  let logger = LOGGER.get_or_init(|| Logger { max_level });

  if log::set_logger(logger).is_ok() {
    log::set_max_level(logger.max_level.to_level_filter());
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_init_is_idempotent() {
    init_logger();
    init_logger_with_max_level(Level::Debug);

    log::info!("logger installed");
  }
}
