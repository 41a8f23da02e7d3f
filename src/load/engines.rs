use crate::process::RawTable;
use anyhow::{anyhow, bail, Result};
use calamine::{open_workbook, Data, Range, Reader, Xls, Xlsx};
use std::{fmt::Display, fs::File, io::BufReader, path::Path};
use tracing::debug;

/// A decoding backend able to turn a workbook file into a [`RawTable`].
pub trait SheetEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Read every sheet, in order, as text. An unreadable file, a workbook
    /// without sheets and a workbook without rows are all errors.
    fn read(&self, path: &Path) -> Result<RawTable>;
}

/// Office Open XML workbooks (`.xlsx`, `.xlsm`).
pub struct XlsxEngine;

/// Legacy BIFF workbooks (`.xls`).
pub struct XlsEngine;

impl SheetEngine for XlsxEngine {
    fn name(&self) -> &'static str {
        "xlsx"
    }

    fn read(&self, path: &Path) -> Result<RawTable> {
        read_workbook::<Xlsx<BufReader<File>>>(path)
    }
}

impl SheetEngine for XlsEngine {
    fn name(&self) -> &'static str {
        "xls"
    }

    fn read(&self, path: &Path) -> Result<RawTable> {
        read_workbook::<Xls<BufReader<File>>>(path)
    }
}

fn read_workbook<R>(path: &Path) -> Result<RawTable>
where
    R: Reader<BufReader<File>>,
    R::Error: Display,
{
    let mut workbook: R = open_workbook(path).map_err(|e| anyhow!("{}", e))?;
    let sheets = workbook.sheet_names();
    if sheets.is_empty() {
        bail!("empty workbook (no sheets)");
    }

    let mut raw = RawTable::default();
    for name in &sheets {
        let range = workbook
            .worksheet_range(name)
            .map_err(|e| anyhow!("sheet {:?}: {}", name, e))?;
        let sheet = range_to_raw(&range);
        debug!(sheet = %name, rows = sheet.len(), "sheet read");
        raw.append(sheet);
    }
    if raw.is_empty() {
        bail!("workbook has no rows in {} sheet(s)", sheets.len());
    }
    Ok(raw)
}

/// Copy a sheet's used range, padding on the left so cell positions line up
/// with sheet columns.
pub(crate) fn range_to_raw(range: &Range<Data>) -> RawTable {
    let col_offset = range.start().map(|(_, c)| c as usize).unwrap_or(0);
    let rows = range
        .rows()
        .map(|row| {
            let mut cells: Vec<Option<String>> = vec![None; col_offset];
            cells.extend(row.iter().map(cell_text));
            cells
        })
        .collect();
    RawTable::new(rows)
}

/// Render one cell as text without any type inference downstream.
pub(crate) fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(format_float(*f)),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => Some(match dt.as_datetime() {
            Some(naive) => naive.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => format_float(dt.as_f64()),
        }),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}
