use crate::process::raw_table::RawTable;
use crate::process::utils::{contains_any, lowercase_all};
use tracing::trace;

/// Outcome of scanning the top of a sheet for the row that names its columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderSearch {
    /// Zero-based row holding the column names.
    Found(usize),
    /// Keywords occur in the sample but no single row qualified; keep every row.
    Unassigned,
    /// No keyword anywhere in the sample.
    NotATable,
}

impl HeaderSearch {
    pub fn index(self) -> Option<usize> {
        match self {
            HeaderSearch::Found(i) => Some(i),
            _ => None,
        }
    }
}

/// Find the header row among the first `sample_rows` rows of `raw`.
///
/// A row qualifies when the lowercase, space-joined text of its non-empty
/// cells contains any of `keywords`. The lowest qualifying index wins.
pub fn locate_header(raw: &RawTable, keywords: &[String], sample_rows: usize) -> HeaderSearch {
    let keywords = lowercase_all(keywords);
    let sample = &raw.rows[..raw.rows.len().min(sample_rows)];

    for (i, row) in sample.iter().enumerate() {
        let row_text = row
            .iter()
            .flatten()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ");
        if contains_any(&row_text, &keywords) {
            trace!(row = i, text = %row_text, "header row matched");
            return HeaderSearch::Found(i);
        }
    }

    let block = sample
        .iter()
        .flat_map(|row| row.iter().map(|c| c.as_deref().unwrap_or("").to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ");
    if contains_any(&block, &keywords) {
        HeaderSearch::Unassigned
    } else {
        HeaderSearch::NotATable
    }
}
