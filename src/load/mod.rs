// src/load/mod.rs
use crate::diagnostics::{info_line, warn_line, DiagnosticSink};
use crate::process::RawTable;
use anyhow::{anyhow, Result};
use std::{
    any::Any,
    panic::{catch_unwind, AssertUnwindSafe},
    path::Path,
};
use tracing::instrument;

pub mod convert;
pub mod engines;

pub use convert::{LegacyConverter, OfficeConverter};
pub use engines::{SheetEngine, XlsEngine, XlsxEngine};

static XLSX: XlsxEngine = XlsxEngine;
static XLS: XlsEngine = XlsEngine;

/// Workbook family, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Modern,
    Legacy,
    Unknown,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("xlsx") | Some("xlsm") => FileKind::Modern,
            Some("xls") => FileKind::Legacy,
            _ => FileKind::Unknown,
        }
    }

    /// Engines to try, in order.
    pub fn engines(self) -> Vec<&'static dyn SheetEngine> {
        match self {
            FileKind::Modern => vec![&XLSX as &dyn SheetEngine],
            FileKind::Legacy => vec![&XLS as &dyn SheetEngine],
            FileKind::Unknown => vec![&XLSX as &dyn SheetEngine, &XLS],
        }
    }
}

/// Reads a workbook with whichever engine works, converting legacy files as
/// a last resort. Never fails: an unreadable file yields an empty table.
pub struct Loader<'a> {
    sink: &'a dyn DiagnosticSink,
    converter: Option<&'a dyn LegacyConverter>,
}

impl<'a> Loader<'a> {
    pub fn new(sink: &'a dyn DiagnosticSink) -> Self {
        Self {
            sink,
            converter: None,
        }
    }

    pub fn with_converter(mut self, converter: &'a dyn LegacyConverter) -> Self {
        self.converter = Some(converter);
        self
    }

    #[instrument(level = "info", skip(self), fields(path = %path.display()))]
    pub fn load(&self, path: &Path) -> RawTable {
        let kind = FileKind::from_path(path);
        for engine in kind.engines() {
            if let Some(raw) = self.attempt(engine, path) {
                return raw;
            }
        }

        if kind == FileKind::Legacy {
            if let Some(converter) = self.converter {
                match converter.convert(path) {
                    Ok(converted) => {
                        info_line(
                            self.sink,
                            format!(
                                "converted \"{}\" to \"{}\"",
                                path.display(),
                                converted.display()
                            ),
                        );
                        if let Some(raw) = self.attempt(&XLSX, &converted) {
                            return raw;
                        }
                    }
                    Err(e) => warn_line(
                        self.sink,
                        format!("conversion failed for \"{}\": {:#}", path.display(), e),
                    ),
                }
            }
        }

        warn_line(
            self.sink,
            format!("could not read file \"{}\"", path.display()),
        );
        RawTable::default()
    }

    fn attempt(&self, engine: &dyn SheetEngine, path: &Path) -> Option<RawTable> {
        match read_guarded(engine, path) {
            Ok(raw) => {
                info_line(
                    self.sink,
                    format!(
                        "engine {} read \"{}\": {} rows",
                        engine.name(),
                        path.display(),
                        raw.len()
                    ),
                );
                Some(raw)
            }
            Err(e) => {
                warn_line(
                    self.sink,
                    format!(
                        "engine {} could not read \"{}\": {:#}",
                        engine.name(),
                        path.display(),
                        e
                    ),
                );
                None
            }
        }
    }
}

/// Run an engine, turning a panic inside the decoder into an ordinary error.
fn read_guarded(engine: &dyn SheetEngine, path: &Path) -> Result<RawTable> {
    catch_unwind(AssertUnwindSafe(|| engine.read(path)))
        .unwrap_or_else(|payload| Err(anyhow!("engine panicked: {}", panic_message(&*payload))))
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
