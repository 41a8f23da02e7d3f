use once_cell::sync::Lazy;
use regex::Regex;
use std::{collections::HashSet, path::Path};

/// Phrases that mark a line as a read failure.
const FAILURE_PHRASES: &[&str] = &["error while reading", "could not read"];

static QUOTED_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)""#).unwrap());

/// A file that failed somewhere in the pipeline, with its company folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemFile {
    pub company: String,
    pub path: String,
}

/// Scan diagnostics `log_text` for failure lines and return each offending
/// path once, in the order first seen.
pub fn problem_files(log_text: &str) -> Vec<ProblemFile> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for line in log_text.lines() {
        if !FAILURE_PHRASES.iter().any(|p| line.contains(p)) {
            continue;
        }
        let Some(caps) = QUOTED_PATH.captures(line) else {
            continue;
        };
        let path = caps[1].trim().to_string();
        if !seen.insert(path.clone()) {
            continue;
        }
        let company = Path::new(&path)
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        out.push(ProblemFile { company, path });
    }
    out
}
