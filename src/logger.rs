use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
  Info,
  Warn,
  Error,
}

impl Level {
  fn as_str(self) -> &'static str {
    match self {
      Level::Info => "INFO",
      Level::Warn => "WARN",
      Level::Error => "ERROR",
    }
  }
}

/// Line logger: `[ts] LEVEL: message` to stderr and, when configured, appended to a file.
pub struct Logger {
  file: Option<Mutex<std::fs::File>>,
  echo: bool,
}

impl Logger {
  pub fn new(path: Option<&Path>) -> anyhow::Result<Self> {
    let file = match path {
      Some(path) => Some(Mutex::new(
        OpenOptions::new().create(true).append(true).open(path)?,
      )),
      None => None,
    };
    Ok(Self { file, echo: true })
  }

  /// No output at all; for tests.
  pub fn silent() -> Self {
    Self {
      file: None,
      echo: false,
    }
  }

  pub fn log(&self, level: Level, message: &str) {
    let line = format_line(level, message);
    if self.echo {
      eprint!("{line}");
    }
    if let Some(file) = &self.file {
      if let Ok(mut file) = file.lock() {
        let _ = file.write_all(line.as_bytes());
      }
    }
  }

  pub fn info(&self, message: &str) {
    self.log(Level::Info, message);
  }

  pub fn warn(&self, message: &str) {
    self.log(Level::Warn, message);
  }

  pub fn error(&self, message: &str) {
    self.log(Level::Error, message);
  }
}

fn format_line(level: Level, message: &str) -> String {
  let ts = Utc::now().to_rfc3339();
  format!("[{ts}] {}: {message}\n", level.as_str())
}
