// src/diagnostics/mod.rs
//
// Append-only text log of per-file outcomes. Failure lines always quote the
// offending path so `problems::problem_files` can recover it later.

use anyhow::{Context, Result};
use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::PathBuf,
    sync::Mutex,
};
use tracing::{error, info, warn};

pub mod problems;

pub use problems::{problem_files, ProblemFile};

/// Receiver for free-text diagnostic lines.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, line: &str);
}

/// Emit `line` as a warning and persist it.
pub fn warn_line(sink: &dyn DiagnosticSink, line: String) {
    warn!("{}", line);
    sink.record(&line);
}

/// Emit `line` at info level and persist it.
pub fn info_line(sink: &dyn DiagnosticSink, line: String) {
    info!("{}", line);
    sink.record(&line);
}

/// Diagnostics written to a log file, one line per call.
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    /// Start a fresh log at `path`, discarding any previous run.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file =
            File::create(&path).with_context(|| format!("creating log file {:?}", &path))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Keep appending to an existing log.
    pub fn append(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening log file {:?}", &path))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }
}

impl DiagnosticSink for FileSink {
    fn record(&self, line: &str) {
        let mut file = match self.file.lock() {
            Ok(f) => f,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(file, "{}", line) {
            error!(path = %self.path.display(), "failed to write log line: {}", e);
        }
    }
}

/// In-memory sink; handy for tests and one-off inspection.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(l) => l.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn text(&self) -> String {
        self.lines().join("\n")
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, line: &str) {
        let mut lines = match self.lines.lock() {
            Ok(l) => l,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.push(line.to_string());
    }
}
