use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Run configuration. Every field has a default, so a YAML file only needs
/// the keys it wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root scanned for spreadsheets; each file's parent directory names its company.
    pub base_dir: PathBuf,
    /// Append-only diagnostics log, truncated at the start of a scan.
    pub log_file: PathBuf,
    /// How many leading rows the header search looks at.
    pub sample_rows: usize,
    /// Largest number of filled cells a continuation fragment may have.
    pub max_fragment_cells: usize,
    pub header_keywords: Vec<String>,
    pub decorative_markers: Vec<String>,
    pub date_keyword: String,
    /// Column-name fragments that identify the person-name column.
    pub name_keywords: Vec<String>,
    pub extensions: Vec<String>,
    /// Files whose lowercase name contains one of these are left out of the batch.
    pub skip_name_markers: Vec<String>,
    pub converter: ConverterConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub enabled: bool,
    /// Office binary used for headless `.xls` → `.xlsx` conversion.
    pub program: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "soffice".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            log_file: PathBuf::from("log.txt"),
            sample_rows: 20,
            max_fragment_cells: 2,
            header_keywords: words(&[
                "фио", "сотруд", "долж", "подраздел", "остат", "дата", "работ", "совмест",
            ]),
            decorative_markers: words(&["итого", "руковод", "отдел", "список"]),
            date_keyword: "дата".to_string(),
            name_keywords: words(&["фио", "сотруд"]),
            extensions: words(&["xlsx", "xls", "xlsm"]),
            skip_name_markers: words(&["6.1"]),
            converter: ConverterConfig::default(),
        }
    }
}

impl Config {
    /// Read `path` as YAML, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let cfg = match path {
            Some(p) => {
                let text =
                    fs::read_to_string(p).with_context(|| format!("reading config {:?}", p))?;
                Self::from_yaml(&text).with_context(|| format!("parsing config {:?}", p))?
            }
            None => Self::default(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rows == 0 {
            bail!("sample_rows must be at least 1");
        }
        if self.header_keywords.iter().all(|k| k.trim().is_empty()) {
            bail!("header_keywords must contain at least one keyword");
        }
        if self.extensions.is_empty() {
            bail!("extensions must list at least one file extension");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_yaml_keeps_defaults() -> Result<()> {
        let cfg = Config::from_yaml("base_dir: /data/excel\nsample_rows: 30\nconverter:\n  enabled: false\n")?;
        assert_eq!(cfg.base_dir, PathBuf::from("/data/excel"));
        assert_eq!(cfg.sample_rows, 30);
        assert!(!cfg.converter.enabled);
        assert_eq!(cfg.converter.program, "soffice");
        assert_eq!(cfg.header_keywords, Config::default().header_keywords);
        Ok(())
    }

    #[test]
    fn load_from_file_validates() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "sample_rows: 0")?;
        assert!(Config::load(Some(tmp.path())).is_err());
        Ok(())
    }

    #[test]
    fn defaults_are_valid() -> Result<()> {
        Config::load(None)?;
        Ok(())
    }

    #[test]
    fn empty_keywords_rejected() {
        let cfg = Config {
            header_keywords: vec![" ".into()],
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }
}
