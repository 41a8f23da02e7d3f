// src/pipeline.rs
use crate::config::Config;
use crate::diagnostics::{info_line, warn_line, DiagnosticSink};
use crate::load::{panic_message, LegacyConverter, Loader};
use crate::process::{
    continuation::reconcile_table, locate_header, normalize::normalize,
    typing::coerce_date_columns, HeaderSearch, Table,
};
use anyhow::Result;
use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    path::Path,
};
use tracing::{debug, info, instrument};

/// Why a file contributed no records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No engine (and no conversion) could read the workbook.
    Unreadable,
    /// No header keyword anywhere in the sampled rows.
    NotATable,
    /// Every row was filtered out.
    NoRows,
    /// Something broke mid-pipeline; the message is already logged.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Parsed(Table),
    Skipped(SkipReason),
}

impl Extraction {
    pub fn into_table(self) -> Table {
        match self {
            Extraction::Parsed(t) => t,
            Extraction::Skipped(_) => Table::default(),
        }
    }
}

/// Per-file extraction: load → locate header → normalize → merge
/// continuations → type dates.
pub struct Extractor<'a> {
    config: &'a Config,
    sink: &'a dyn DiagnosticSink,
    converter: Option<&'a dyn LegacyConverter>,
}

impl<'a> Extractor<'a> {
    pub fn new(config: &'a Config, sink: &'a dyn DiagnosticSink) -> Self {
        Self {
            config,
            sink,
            converter: None,
        }
    }

    pub fn with_converter(mut self, converter: &'a dyn LegacyConverter) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    pub fn sink(&self) -> &dyn DiagnosticSink {
        self.sink
    }

    /// The normalized table for `path`, or an empty table if the file was
    /// skipped for any reason.
    pub fn extract(&self, path: &Path) -> Table {
        self.try_extract(path).into_table()
    }

    /// Like [`Extractor::extract`] but keeps the reason a file was skipped.
    /// Errors and panics are logged and turned into `SkipReason::Failed`.
    #[instrument(level = "info", skip(self), fields(path = %path.display()))]
    pub fn try_extract(&self, path: &Path) -> Extraction {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.run(path)))
            .unwrap_or_else(|payload| Err(anyhow::anyhow!("panic: {}", panic_message(&*payload))));
        match outcome {
            Ok(extraction) => extraction,
            Err(e) => {
                let msg = format!("{:#}", e);
                warn_line(
                    self.sink,
                    format!("error while reading \"{}\": {}", path.display(), msg),
                );
                Extraction::Skipped(SkipReason::Failed(msg))
            }
        }
    }

    fn run(&self, path: &Path) -> Result<Extraction> {
        let cfg = self.config;
        let mut loader = Loader::new(self.sink);
        if let Some(converter) = self.converter {
            loader = loader.with_converter(converter);
        }

        let raw = loader.load(path);
        if raw.is_empty() {
            return Ok(Extraction::Skipped(SkipReason::Unreadable));
        }

        let header = match locate_header(&raw, &cfg.header_keywords, cfg.sample_rows) {
            HeaderSearch::NotATable => {
                info!("no header keywords in the first {} rows; not a data table", cfg.sample_rows);
                return Ok(Extraction::Skipped(SkipReason::NotATable));
            }
            found => found.index(),
        };
        debug!(?header, "header located");

        let table = normalize(raw, header, &cfg.decorative_markers)?;
        let mut table = reconcile_table(table, cfg.max_fragment_cells);
        coerce_date_columns(&mut table, &cfg.date_keyword);

        if table.is_empty() {
            info!("no data rows left after filtering");
            return Ok(Extraction::Skipped(SkipReason::NoRows));
        }
        info_line(
            self.sink,
            format!("parsed \"{}\": {} records", path.display(), table.len()),
        );
        Ok(Extraction::Parsed(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use crate::fixtures::write_xlsx;
    use std::fs;
    use tempfile::tempdir;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,rosterscan=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    #[test]
    fn header_on_fourth_row_yields_three_records() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let path = dir.path().join("roster.xlsx");
        write_xlsx(
            &path,
            &[(
                "Лист1",
                &[
                    &["ООО Ромашка"],
                    &["Остатки отпусков"],
                    &[],
                    &["ФИО", "Должность", "Дата"],
                    &["Иванов И.И.", "Инженер", "15.01.2024"],
                    &["Петров П.П.", "Техник", "—"],
                    &["Сидоров С.С.", "Мастер", "2023-03-01"],
                ],
            )],
        )?;

        let cfg = Config::default();
        let sink = MemorySink::new();
        let table = Extractor::new(&cfg, &sink).extract(&path);

        assert_eq!(table.columns, vec!["ФИО", "Должность", "Дата"]);
        assert_eq!(table.len(), 3);
        assert!(table.rows.iter().all(|r| r[0] != "ФИО"));
        assert_eq!(table.get(0, "Дата"), Some("2024-01-15"));
        assert_eq!(table.get(1, "Дата"), Some(""));
        assert_eq!(table.get(2, "Дата"), Some("2023-03-01"));
        assert!(sink.text().contains("records"));
        Ok(())
    }

    #[test]
    fn wrapped_rows_merge_and_totals_vanish() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let path = dir.path().join("roster.xlsx");
        write_xlsx(
            &path,
            &[(
                "Лист1",
                &[
                    &["ФИО", "Должность", "Остаток"],
                    &["Иванов И.И.", "Ведущий инженер", "14"],
                    &["", "по охране труда"],
                    &["Петров П.П.", "Техник", "3"],
                    &["Итого", "", "17"],
                ],
            )],
        )?;

        let cfg = Config::default();
        let sink = MemorySink::new();
        let table = Extractor::new(&cfg, &sink).extract(&path);

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get(0, "Должность"),
            Some("Ведущий инженер по охране труда")
        );
        assert!(table.rows.iter().all(|r| !r[0].contains("Итого")));
        Ok(())
    }

    #[test]
    fn file_without_keywords_is_skipped_not_failed() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("prices.xlsx");
        write_xlsx(&path, &[("Лист1", &[&["Товар", "Цена"], &["Стол", "100"]])])?;

        let cfg = Config::default();
        let sink = MemorySink::new();
        let outcome = Extractor::new(&cfg, &sink).try_extract(&path);

        assert_eq!(outcome, Extraction::Skipped(SkipReason::NotATable));
        assert!(!sink.text().contains("error while reading"));
        Ok(())
    }

    #[test]
    fn unreadable_file_is_skipped() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.xlsx");
        fs::write(&path, b"nope")?;

        let cfg = Config::default();
        let sink = MemorySink::new();
        let extractor = Extractor::new(&cfg, &sink);
        assert_eq!(
            extractor.try_extract(&path),
            Extraction::Skipped(SkipReason::Unreadable)
        );
        assert!(extractor.extract(&path).is_empty());
        Ok(())
    }

    #[test]
    fn only_decorative_rows_means_no_rows() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("title.xlsx");
        write_xlsx(
            &path,
            &[("Лист1", &[&["ФИО", "Должность"], &["Итого", "0"]])],
        )?;

        let cfg = Config::default();
        let sink = MemorySink::new();
        assert_eq!(
            Extractor::new(&cfg, &sink).try_extract(&path),
            Extraction::Skipped(SkipReason::NoRows)
        );
        Ok(())
    }

    #[test]
    fn non_breaking_space_in_date_blanks_only_that_cell() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("roster.xlsx");
        write_xlsx(
            &path,
            &[(
                "Лист1",
                &[
                    &["ФИО", "Дата"],
                    &["Иванов", "15.01.2024"],
                    &["Петров", "01.02.2020\u{a0}(приказ)"],
                    &["Сидоров", "03.04.2021\u{a0}09:00"],
                ],
            )],
        )?;

        let cfg = Config::default();
        let sink = MemorySink::new();
        let table = match Extractor::new(&cfg, &sink).try_extract(&path) {
            Extraction::Parsed(t) => t,
            other => panic!("expected a parsed table, got {:?}", other),
        };
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0, "Дата"), Some("2024-01-15"));
        assert_eq!(table.get(1, "Дата"), Some(""));
        assert_eq!(table.get(2, "Дата"), Some("2021-04-03"));
        assert!(!sink.text().contains("error while reading"));
        Ok(())
    }

    #[test]
    fn unassigned_header_keeps_every_row_under_letters() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("scattered.xlsx");
        write_xlsx(
            &path,
            &[("Лист1", &[&["Иванов", "Дата"], &["ФИО", "Петров"]])],
        )?;

        let cfg = Config {
            header_keywords: vec!["дата фио".to_string()],
            ..Config::default()
        };
        let sink = MemorySink::new();
        let table = Extractor::new(&cfg, &sink).extract(&path);

        assert_eq!(table.columns, vec!["A", "B"]);
        assert_eq!(
            table.rows,
            vec![
                vec!["Иванов".to_string(), "Дата".to_string()],
                vec!["ФИО".to_string(), "Петров".to_string()],
            ]
        );
        Ok(())
    }

    #[test]
    fn missing_file_never_panics() {
        let cfg = Config::default();
        let sink = MemorySink::new();
        let table = Extractor::new(&cfg, &sink).extract(Path::new("/nonexistent/roster.xlsx"));
        assert!(table.is_empty());
        assert!(sink.text().contains("could not read file"));
    }
}
