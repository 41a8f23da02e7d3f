use crate::process::raw_table::RawTable;
use crate::process::table::Table;
use crate::process::utils::{clean_cell, column_letter, contains_any, lowercase_all};
use anyhow::{bail, Result};
use std::collections::HashSet;
use tracing::debug;

/// Turn a raw grid into a schema-consistent table.
///
/// With `header = Some(i)` row `i` names the columns and every row up to and
/// including it is dropped; without one, columns are named by sheet letter.
/// Duplicate column names keep their first occurrence, blank rows and columns
/// go, and so does any row with a cell containing one of `decorative_markers`.
pub fn normalize(
    raw: RawTable,
    header: Option<usize>,
    decorative_markers: &[String],
) -> Result<Table> {
    let width = raw.width();
    let mut grid: Vec<Vec<String>> = raw
        .rows
        .into_iter()
        .map(|row| {
            let mut cells: Vec<String> = row.iter().map(|c| clean_cell(c.as_deref())).collect();
            cells.resize(width, String::new());
            cells
        })
        .collect();

    let columns = match header {
        Some(i) if i < grid.len() => {
            let names = grid[i].clone();
            grid.drain(..=i);
            names
        }
        Some(i) => bail!("header row {} is past the end of a {}-row sheet", i, grid.len()),
        None => (0..width).map(column_letter).collect(),
    };
    let mut table = Table::new(columns, grid);

    // first occurrence of each name wins
    let mut seen = HashSet::new();
    let unique: Vec<bool> = table.columns.iter().map(|c| seen.insert(c.clone())).collect();
    table.retain_columns(&unique);

    table.rows.retain(|row| row.iter().any(|c| !c.is_empty()));

    let markers = lowercase_all(decorative_markers);
    let before = table.rows.len();
    table.rows.retain(|row| {
        !row
            .iter()
            .any(|cell| contains_any(&cell.to_lowercase(), &markers))
    });
    debug!(dropped = before - table.rows.len(), "decorative rows removed");

    let populated: Vec<bool> = (0..table.columns.len())
        .map(|i| table.rows.iter().any(|row| !row[i].is_empty()))
        .collect();
    table.retain_columns(&populated);

    Ok(table)
}
