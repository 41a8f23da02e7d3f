use anyhow::{bail, Context, Result};
use std::{
    path::{Path, PathBuf},
    process::Command,
};
use tracing::{debug, instrument};

/// Produces a modern-format copy of a legacy workbook.
pub trait LegacyConverter: Send + Sync {
    /// Convert `path` and return the location of the new `.xlsx` file.
    fn convert(&self, path: &Path) -> Result<PathBuf>;
}

/// Headless office-suite conversion, e.g.
/// `soffice --headless --convert-to xlsx --outdir <dir> <file>`.
/// The result lands next to the source as `<stem>.xlsx`.
pub struct OfficeConverter {
    program: String,
}

impl OfficeConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl LegacyConverter for OfficeConverter {
    #[instrument(level = "debug", skip(self), fields(path = %path.display()))]
    fn convert(&self, path: &Path) -> Result<PathBuf> {
        let out_dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let output = Command::new(&self.program)
            .args(["--headless", "--convert-to", "xlsx", "--outdir"])
            .arg(out_dir)
            .arg(path)
            .output()
            .with_context(|| format!("launching {}", self.program))?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        debug!(stdout = %String::from_utf8_lossy(&output.stdout).trim(), "converter finished");

        let converted = path.with_extension("xlsx");
        if !converted.is_file() {
            bail!("{} produced no file at {}", self.program, converted.display());
        }
        Ok(converted)
    }
}
