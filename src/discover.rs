// src/discover.rs
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A spreadsheet to process and the company it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    /// Name of the file's immediate parent directory.
    pub company: String,
}

impl Candidate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let company = company_of(&path);
        Self { path, company }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

pub fn company_of(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Walk `base` and collect every file whose extension (case-insensitive) is
/// in `extensions`, in a stable name-sorted order.
pub fn discover(base: &Path, extensions: &[String]) -> Result<Vec<Candidate>> {
    if !base.is_dir() {
        bail!("`{}` does not exist or is not a directory", base.display());
    }
    let extensions: Vec<String> = extensions
        .iter()
        .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
        .collect();

    let mut out = Vec::new();
    for entry in WalkDir::new(base).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("cannot read directory entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.contains(&e.to_ascii_lowercase()))
            .unwrap_or(false);
        if matches {
            out.push(Candidate::new(entry.path()));
        }
    }
    debug!(count = out.len(), base = %base.display(), "discovered spreadsheets");
    Ok(out)
}
