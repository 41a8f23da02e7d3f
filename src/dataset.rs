// src/dataset.rs
use crate::diagnostics::info_line;
use crate::discover::Candidate;
use crate::pipeline::{Extraction, Extractor};
use crate::process::utils::lowercase_all;
use crate::process::Table;
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::info;

pub const COMPANY_COLUMN: &str = "Компания";
pub const FILE_COLUMN: &str = "Файл";
pub const NAME_COLUMN: &str = "ФИО";

/// One row of the combined dataset: the source record plus where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetRecord {
    pub company: String,
    pub file: String,
    pub fio: String,
    pub fields: Vec<(String, String)>,
}

impl DatasetRecord {
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            COMPANY_COLUMN => Some(&self.company),
            FILE_COLUMN => Some(&self.file),
            NAME_COLUMN => Some(&self.fio),
            _ => self
                .fields
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
        }
    }
}

/// Counts reported at the end of a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Files that produced at least one record.
    pub parsed: usize,
    /// Files that were unreadable, irrelevant or empty after filtering.
    pub skipped: usize,
    /// Files left out by name before processing.
    pub excluded: usize,
    /// Every candidate considered.
    pub total: usize,
}

/// Append-only concatenation of every parsed table.
#[derive(Debug, Default, Clone)]
pub struct Dataset {
    records: Vec<DatasetRecord>,
    columns: Vec<String>,
}

/// Column holding person names: the first whose lowercase name contains one
/// of `name_keywords`, else the first column.
pub fn name_column(table: &Table, name_keywords: &[String]) -> Option<usize> {
    let keywords = lowercase_all(name_keywords);
    table
        .columns
        .iter()
        .position(|c| {
            let c = c.to_lowercase();
            keywords.iter().any(|k| !k.is_empty() && c.contains(k.as_str()))
        })
        .or_else(|| (!table.columns.is_empty()).then_some(0))
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `table`'s records in, tagging each with its company, file and name.
    pub fn push(&mut self, candidate: &Candidate, table: Table, name_keywords: &[String]) {
        let fio_idx = name_column(&table, name_keywords);
        let file = candidate.path.display().to_string();
        let Table { columns, rows } = table;

        for name in &columns {
            if !self.columns.contains(name) {
                self.columns.push(name.clone());
            }
        }
        for row in rows {
            let fio = fio_idx
                .and_then(|i| row.get(i))
                .map(|v| v.trim().to_string())
                .unwrap_or_default();
            self.records.push(DatasetRecord {
                company: candidate.company.clone(),
                file: file.clone(),
                fio,
                fields: columns.iter().cloned().zip(row).collect(),
            });
        }
    }

    pub fn records(&self) -> &[DatasetRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Union of source columns in first-seen order, then the three
    /// provenance columns.
    pub fn columns(&self) -> Vec<String> {
        let mut cols = self.columns.clone();
        for extra in [COMPANY_COLUMN, FILE_COLUMN, NAME_COLUMN] {
            if !cols.iter().any(|c| c == extra) {
                cols.push(extra.to_string());
            }
        }
        cols
    }

    /// Companies with the files that contributed records, both sorted.
    pub fn companies(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for r in &self.records {
            let files = map.entry(r.company.clone()).or_default();
            if !files.contains(&r.file) {
                files.push(r.file.clone());
            }
        }
        for files in map.values_mut() {
            files.sort();
        }
        map
    }

    /// Records whose name contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<&DatasetRecord> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.records
            .iter()
            .filter(|r| r.fio.to_lowercase().contains(&query))
            .collect()
    }
}

/// Run every candidate through `extractor` and fold the results, in
/// candidate order, into one dataset.
///
/// With `jobs > 1` files are extracted on a rayon pool of that size; the
/// fold itself stays on the calling thread, so the result is identical.
pub fn collect(
    extractor: &Extractor<'_>,
    candidates: &[Candidate],
    jobs: usize,
) -> Result<(Dataset, BatchSummary)> {
    let start = Instant::now();
    let cfg = extractor.config();
    let skip_markers = lowercase_all(&cfg.skip_name_markers);

    let mut excluded = 0;
    let mut work: Vec<&Candidate> = Vec::with_capacity(candidates.len());
    for c in candidates {
        let name = c.file_name().to_lowercase();
        if skip_markers.iter().any(|m| !m.is_empty() && name.contains(m.as_str())) {
            info_line(
                extractor.sink(),
                format!("skipped by name \"{}\"", c.path.display()),
            );
            excluded += 1;
        } else {
            work.push(c);
        }
    }

    let outcomes: Vec<Extraction> = if jobs > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("building extraction thread pool")?;
        pool.install(|| {
            work.par_iter()
                .map(|c| extractor.try_extract(&c.path))
                .collect()
        })
    } else {
        work.iter().map(|c| extractor.try_extract(&c.path)).collect()
    };

    let mut dataset = Dataset::new();
    let mut summary = BatchSummary {
        excluded,
        total: candidates.len(),
        ..BatchSummary::default()
    };
    for (candidate, outcome) in work.into_iter().zip(outcomes) {
        match outcome {
            Extraction::Parsed(table) => {
                dataset.push(candidate, table, &cfg.name_keywords);
                summary.parsed += 1;
            }
            Extraction::Skipped(_) => summary.skipped += 1,
        }
    }

    info!(
        parsed = summary.parsed,
        skipped = summary.skipped,
        excluded = summary.excluded,
        total = summary.total,
        records = dataset.len(),
        elapsed = ?start.elapsed(),
        "batch complete"
    );
    Ok((dataset, summary))
}
